// crates/savepoint-core/src/core/records.rs
// ============================================================================
// Module: Savepoint Records
// Description: Game, core, save state, and cheat record types.
// Purpose: Canonical data model shared by the catalog, the artifact store,
//          and the session coordinator.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Games and cores are read-only snapshots owned by external registries.
//! Save state and cheat records are owned by the metadata catalog; the
//! coordinator never holds them across asynchronous boundaries and
//! re-resolves by identifier before each mutation.
//!
//! Blob ordering invariant: a [`SaveStateRecord`] is inserted only after its
//! blob file exists, and is deleted before its blob file is removed. The
//! failure-safe direction is an orphaned blob, never a dangling record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CheatId;
use crate::core::identifiers::CoreId;
use crate::core::identifiers::GameId;
use crate::core::identifiers::SaveStateId;
use crate::core::identifiers::SystemId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Registry Snapshots
// ============================================================================

/// Read-only game snapshot provided by the game registry.
///
/// # Invariants
/// - Immutable for the lifetime of a session; Savepoint never creates or
///   destroys games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Stable content-hash identifier.
    pub id: GameId,
    /// Display title.
    pub title: String,
    /// Owning system identifier.
    pub system: SystemId,
    /// When the game was last launched, if ever.
    pub last_played_at: Option<Timestamp>,
}

/// Read-only core snapshot provided by the core registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreDescriptor {
    /// Core identifier.
    pub id: CoreId,
    /// Core project version, stamped onto every record it produces.
    pub project_version: String,
}

// ============================================================================
// SECTION: Save State Records
// ============================================================================

/// Durable metadata for one captured save state.
///
/// # Invariants
/// - `blob_path` exists on disk whenever the record exists in the catalog.
/// - Only `last_opened` is mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveStateRecord {
    /// Unique identifier.
    pub id: SaveStateId,
    /// Owning game.
    pub game_id: GameId,
    /// Core that produced the blob, resolved at write time.
    pub core_id: CoreId,
    /// Path to the opaque binary state blob.
    pub blob_path: PathBuf,
    /// Optional path to the screenshot sidecar.
    pub image_path: Option<PathBuf>,
    /// Whether policy (rather than the user) created this state.
    pub is_autosave: bool,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last time this state was loaded, if ever.
    pub last_opened: Option<Timestamp>,
    /// `project_version` of the core at creation time.
    pub created_with_core_version: String,
}

// ============================================================================
// SECTION: Cheat Records
// ============================================================================

/// Durable metadata for one applied cheat code.
///
/// # Invariants
/// - `code` is normalized (see [`crate::core::cheats::normalize_cheat_code`]).
/// - Unique per `(game_id, code)`; re-applying toggles `enabled` in place.
/// - Never auto-pruned; cheats are user-owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatRecord {
    /// Unique identifier.
    pub id: CheatId,
    /// Owning game.
    pub game_id: GameId,
    /// Core the cheat was applied against.
    pub core_id: CoreId,
    /// Normalized cheat code.
    pub code: String,
    /// Core-defined cheat-format tag.
    pub kind: String,
    /// Whether the cheat is currently active.
    pub enabled: bool,
    /// Optional state blob some cores snapshot alongside a cheat.
    pub state_path: Option<PathBuf>,
}
