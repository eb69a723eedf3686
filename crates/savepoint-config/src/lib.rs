// crates/savepoint-config/src/lib.rs
// ============================================================================
// Module: Savepoint Config
// Description: Configuration loading and validation for Savepoint.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: savepoint-core, savepoint-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. Missing or invalid configuration fails closed: a session is never
//! started against guessed persistence settings.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Configuration types and loading.
pub mod config;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use config::AutosaveConfig;
pub use config::CatalogConfig;
pub use config::ConfigError;
pub use config::SavepointConfig;
