// crates/savepoint-core/src/interfaces/mod.rs
// ============================================================================
// Module: Savepoint Interfaces
// Description: Trait seams for the emulation core, registries, catalog, and
//              artifact store.
// Purpose: Define the contract surfaces the session coordinator composes.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how Savepoint integrates with its collaborators without
//! embedding backend-specific details. The emulation core is an opaque
//! serialization boundary reached through [`CoreBridge`]; capability support
//! is declared once via [`CoreCapabilities`] at session start rather than
//! probed per call. Registries are read-only. The catalog and artifact store
//! split record lifetime from blob-file lifetime: records are catalog-owned,
//! files are store-owned, and the coordinator sequences the two.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::CheatId;
use crate::core::CheatRecord;
use crate::core::CoreDescriptor;
use crate::core::CoreId;
use crate::core::Game;
use crate::core::GameId;
use crate::core::SaveStateId;
use crate::core::SaveStateRecord;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Core Bridge
// ============================================================================

/// Capability descriptor declared by an emulation core at registration time.
///
/// # Invariants
/// - Checked once at session start; a capability absent here never becomes
///   available mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoreCapabilities {
    /// Core can serialize and restore execution state.
    pub save_states: bool,
    /// Core accepts cheat codes.
    pub cheats: bool,
}

/// Errors surfaced by the emulation core across the persistence boundary.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Core failed to serialize state to the requested path.
    #[error("core save failed: {0}")]
    Save(String),
    /// Core failed to restore state from the requested path.
    #[error("core load failed: {0}")]
    Load(String),
    /// Core failed while applying a cheat.
    #[error("core cheat failure: {0}")]
    Cheat(String),
}

/// Narrow interface to one running emulation core instance.
///
/// Implementations may fail any call; a core whose [`CoreCapabilities`]
/// report `save_states: false` is never asked to save or load.
pub trait CoreBridge: Send + Sync {
    /// Returns the capability descriptor declared at registration.
    fn capabilities(&self) -> CoreCapabilities;

    /// Returns the live core's project version string.
    fn project_version(&self) -> &str;

    /// Serializes current execution state into the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Save`] when the core cannot produce the blob.
    fn save_state_to_file(&self, path: &Path) -> Result<(), CoreError>;

    /// Restores execution state from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Load`] when the blob cannot be applied.
    fn load_state_from_file(&self, path: &Path) -> Result<(), CoreError>;

    /// Applies or clears a cheat. Returns `false` when the core rejects the
    /// code without erroring.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cheat`] when the core fails outright.
    fn set_cheat(&self, code: &str, kind: &str, enabled: bool) -> Result<bool, CoreError>;
}

// ============================================================================
// SECTION: Registries
// ============================================================================

/// Read-only access to game records owned by the library.
pub trait GameRegistry: Send + Sync {
    /// Resolves a game snapshot by identifier.
    fn game(&self, id: &GameId) -> Option<Game>;
}

/// Read-only access to core records owned by the core registry.
pub trait CoreRegistry: Send + Sync {
    /// Resolves a core descriptor by identifier.
    fn core(&self, id: &CoreId) -> Option<CoreDescriptor>;
}

/// Access to the live rendering surface for screenshot capture.
///
/// # Invariants
/// - `capture_frame` runs on the rendering context and completes before any
///   asynchronous save body starts.
pub trait FrameSource: Send + Sync {
    /// Captures the current frame as encoded image bytes, if available.
    fn capture_frame(&self) -> Option<Vec<u8>>;
}

// ============================================================================
// SECTION: Metadata Catalog
// ============================================================================

/// Metadata catalog errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Delete` failures from retention pruning are non-fatal to the save that
///   triggered them; callers log and continue.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// A transactional write failed.
    #[error("catalog write failed: {0}")]
    Write(String),
    /// A transactional delete failed.
    #[error("catalog delete failed: {0}")]
    Delete(String),
    /// Record not found for the given identifier.
    #[error("catalog record not found: {0}")]
    NotFound(String),
    /// Stored data failed an integrity check.
    #[error("catalog corruption: {0}")]
    Corrupt(String),
    /// Invalid data or arguments.
    #[error("catalog invalid data: {0}")]
    Invalid(String),
}

/// Transactional store for save state and cheat records.
///
/// # Invariants
/// - Each method executes inside one transaction boundary.
/// - `list_save_states` orders by `created_at` descending, identifier
///   descending as tiebreaker.
/// - Deleting methods return the removed records so the caller can delete
///   blob files afterwards (record first, file second).
pub trait SaveStateCatalog: Send + Sync {
    /// Inserts a new save state record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Write`] on transactional failure or duplicate id.
    fn insert_save_state(&self, record: &SaveStateRecord) -> Result<(), CatalogError>;

    /// Resolves a save state record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the lookup itself fails.
    fn save_state(&self, id: &SaveStateId) -> Result<Option<SaveStateRecord>, CatalogError>;

    /// Stamps `last_opened` on an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the record does not exist.
    fn update_last_opened(&self, id: &SaveStateId, at: Timestamp) -> Result<(), CatalogError>;

    /// Deletes a record, returning it when it existed.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Delete`] on transactional failure.
    fn delete_save_state(&self, id: &SaveStateId) -> Result<Option<SaveStateRecord>, CatalogError>;

    /// Lists all save states for a game, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the query fails.
    fn list_save_states(&self, game: &GameId) -> Result<Vec<SaveStateRecord>, CatalogError>;

    /// Removes autosave records beyond `keep`, oldest first, inside one
    /// transaction. Returns the removed records.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Delete`] on transactional failure.
    fn prune_autosaves(
        &self,
        game: &GameId,
        keep: usize,
    ) -> Result<Vec<SaveStateRecord>, CatalogError>;

    /// Inserts or updates a cheat keyed by `(game_id, code)`, returning the
    /// stable cheat identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Write`] on transactional failure.
    fn upsert_cheat(&self, record: &CheatRecord) -> Result<CheatId, CatalogError>;

    /// Lists all cheats recorded for a game.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the query fails.
    fn list_cheats(&self, game: &GameId) -> Result<Vec<CheatRecord>, CatalogError>;
}

// ============================================================================
// SECTION: Artifact Store
// ============================================================================

/// Artifact store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    /// A blob or image write failed.
    #[error("artifact write failed: {0}")]
    Write(String),
    /// Underlying filesystem failure outside the write path.
    #[error("artifact io failure: {0}")]
    Io(String),
    /// A generated key or supplied path was rejected.
    #[error("artifact invalid key: {0}")]
    InvalidKey(String),
}

/// A staged blob destination: the core writes into `temp_path`; commit
/// renames it to `final_path` atomically.
///
/// # Invariants
/// - `final_path` never names a partially written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSlot {
    /// Temporary path handed to the opaque writer.
    pub temp_path: PathBuf,
    /// Destination path after a successful commit.
    pub final_path: PathBuf,
}

impl BlobSlot {
    /// Returns the identifier derived from the final file stem.
    #[must_use]
    pub fn save_state_id(&self) -> SaveStateId {
        let stem = self
            .final_path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
        SaveStateId::new(stem)
    }
}

/// Durable file layout for state blobs and screenshot images.
///
/// # Invariants
/// - Parent directories are created on demand.
/// - Writes go to a temporary path and are renamed into place; a crash
///   mid-write never leaves a final-named partial file.
pub trait ArtifactStore: Send + Sync {
    /// Writes screenshot bytes for a game, returning the final path.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Write`] with the underlying cause.
    fn write_image(&self, game: &GameId, bytes: &[u8]) -> Result<PathBuf, ArtifactError>;

    /// Allocates a uniquely keyed blob slot for a game.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when the directory cannot be prepared.
    fn stage_blob(&self, game: &GameId) -> Result<BlobSlot, ArtifactError>;

    /// Atomically promotes a staged blob to its final path.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Write`] when the rename fails.
    fn commit_blob(&self, slot: &BlobSlot) -> Result<PathBuf, ArtifactError>;

    /// Discards a staged blob that will not be committed.
    fn abort_blob(&self, slot: &BlobSlot);

    /// Deletes an artifact file. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] for failures other than absence.
    fn delete(&self, path: &Path) -> Result<(), ArtifactError>;
}
