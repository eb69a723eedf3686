// crates/savepoint-session/src/errors.rs
// ============================================================================
// Module: Session Error Taxonomy
// Description: Typed errors for save state and cheat operations.
// Purpose: Give callers stable, programmatically matchable failure variants.
// Dependencies: savepoint-core, thiserror
// ============================================================================

//! ## Overview
//! Every coordinator operation returns one of these typed errors; nothing is
//! thrown past the coordinator. `MetadataDelete` and `VersionMismatch` mark
//! the non-fatal paths: retention-prune failures are logged and the save
//! that triggered them still succeeds, and a version mismatch is a warning
//! the caller can acknowledge before loading.

// ============================================================================
// SECTION: Imports
// ============================================================================

use savepoint_core::interfaces::ArtifactError;
use savepoint_core::interfaces::CoreError;
use thiserror::Error;

// ============================================================================
// SECTION: Save State Errors
// ============================================================================

/// Errors surfaced by save state operations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SaveStateError {
    /// The running core declared no save state support at session start.
    #[error("core does not support save states")]
    UnsupportedByCore,
    /// The core failed to serialize its state.
    #[error("core save failed: {0}")]
    CoreSave(String),
    /// The core failed to restore from a blob.
    #[error("core load failed: {0}")]
    CoreLoad(String),
    /// Blob or screenshot file handling failed.
    #[error("artifact failure: {0}")]
    Artifact(String),
    /// A catalog write failed.
    #[error("metadata write failed: {0}")]
    MetadataWrite(String),
    /// A catalog delete failed. Non-fatal when raised by retention pruning.
    #[error("metadata delete failed: {0}")]
    MetadataDelete(String),
    /// No registered core matches the requested identifier.
    #[error("no core found for {0}")]
    NoCoreFound(String),
    /// No save state record matches the requested identifier.
    #[error("save state not found: {0}")]
    NotFound(String),
    /// The record was created with a different core version than is running.
    #[error("save state created with core version {created_with}, running {running}")]
    VersionMismatch {
        /// Core project version recorded at save time.
        created_with: String,
        /// Core project version currently running.
        running: String,
    },
    /// Another save is already in flight for this session.
    #[error("a save is already in progress")]
    SaveInProgress,
}

impl From<ArtifactError> for SaveStateError {
    fn from(error: ArtifactError) -> Self {
        Self::Artifact(error.to_string())
    }
}

impl From<CoreError> for SaveStateError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Save(message) => Self::CoreSave(message),
            CoreError::Load(message) => Self::CoreLoad(message),
            CoreError::Cheat(message) => Self::CoreSave(message),
        }
    }
}

// ============================================================================
// SECTION: Cheat Errors
// ============================================================================

/// Errors surfaced by cheat operations.
///
/// # Invariants
/// - A cheat is persisted only after the core accepts it; `Rejected` and
///   `Core` therefore guarantee no catalog write happened.
#[derive(Debug, Error)]
pub enum CheatError {
    /// The running core declared no cheat support at session start.
    #[error("core does not support cheats")]
    UnsupportedByCore,
    /// The core rejected the cheat code without erroring.
    #[error("core rejected cheat code: {0}")]
    Rejected(String),
    /// The core failed outright while applying the cheat.
    #[error("core cheat failure: {0}")]
    Core(String),
    /// A catalog write failed after the core accepted the cheat.
    #[error("cheat metadata write failed: {0}")]
    MetadataWrite(String),
    /// No registered core matches the requested identifier.
    #[error("no core found for {0}")]
    NoCoreFound(String),
}
