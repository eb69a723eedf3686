// crates/savepoint-session/src/lib.rs
// ============================================================================
// Module: Savepoint Session
// Description: Session coordination for save states, cheats, and autosaves.
// Purpose: Compose the catalog, artifact store, and core bridge per session.
// Dependencies: savepoint-core, log, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate ties one play session together: the [`SessionCoordinator`]
//! sequences blob and record lifetimes, the [`SessionHandle`] runs mutating
//! operations on a worker thread, the [`AutosaveDriver`] fires periodic
//! policy-checked saves, the [`FaultGuard`] arms a panic-time emergency
//! save, and the [`LegacyMigrator`] folds old slot-file layouts into the
//! catalog before the session starts saving.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Periodic autosave timer driver.
pub mod autosave;
/// Session coordinator.
pub mod coordinator;
/// Error taxonomy for session operations.
pub mod errors;
/// Panic-hook emergency save guard.
pub mod guard;
/// Worker thread and completion channels.
pub mod handle;
/// Legacy slot-file migration.
pub mod migrate;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use autosave::AutosaveDriver;
pub use coordinator::SessionCoordinator;
pub use coordinator::SessionDeps;
pub use coordinator::VersionPolicy;
pub use errors::CheatError;
pub use errors::SaveStateError;
pub use guard::FaultGuard;
pub use handle::Completion;
pub use handle::CompletionError;
pub use handle::SessionHandle;
pub use migrate::LegacyMigrator;
pub use migrate::MigrationFailure;
pub use migrate::MigrationReport;
