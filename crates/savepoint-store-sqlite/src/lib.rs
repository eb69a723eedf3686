// crates/savepoint-store-sqlite/src/lib.rs
// ============================================================================
// Module: Savepoint SQLite Store
// Description: Durable metadata catalog backed by SQLite.
// Purpose: Persist save state and cheat records transactionally.
// Dependencies: savepoint-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This crate implements the [`savepoint_core::SaveStateCatalog`] seam on
//! top of `SQLite` with WAL journaling. Every catalog operation runs inside
//! one transaction; retention pruning for autosaves happens in the same
//! transaction as the lookup that selects its victims.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// `SQLite` catalog implementation.
pub mod store;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use store::SqliteCatalog;
pub use store::SqliteCatalogConfig;
pub use store::SqliteCatalogError;
pub use store::SqliteJournalMode;
pub use store::SqliteSyncMode;
