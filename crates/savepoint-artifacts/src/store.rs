// crates/savepoint-artifacts/src/store.rs
// ============================================================================
// Module: Savepoint Filesystem Artifact Store
// Description: Per-game blob/screenshot layout with atomic promotion.
// Purpose: Guarantee that no final-named artifact is ever partially written.
// Dependencies: savepoint-core, log
// ============================================================================

//! ## Overview
//! Artifacts live in one directory per game, keyed by the game's content
//! hash: `{root}/{hash}/{hash}.{millis}[.{seq}].{svs|jpg}`. Keys combine the
//! hash with a millisecond timestamp; a collision counter is appended when
//! two keys are allocated inside the same millisecond, so rapid repeated
//! saves never overwrite each other.
//!
//! Every write lands on a temporary path first and is renamed into place.
//! The opaque core writer gets the same guarantee through the
//! stage/commit/abort protocol: the core serializes into the slot's temp
//! path and only a successful commit makes the blob visible under its final
//! name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use savepoint_core::GameId;
use savepoint_core::Timestamp;
use savepoint_core::interfaces::ArtifactError;
use savepoint_core::interfaces::ArtifactStore;
use savepoint_core::interfaces::BlobSlot;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File extension for opaque state blobs.
pub const BLOB_EXTENSION: &str = "svs";
/// File extension for screenshot sidecars.
pub const IMAGE_EXTENSION: &str = "jpg";
/// Prefix marking in-flight temporary files.
const TEMP_PREFIX: &str = ".tmp.";
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Key Allocation
// ============================================================================

/// Allocates collision-free artifact keys within one store instance.
///
/// # Invariants
/// - Two allocations in the same millisecond differ in their sequence
///   suffix; allocations in later milliseconds reset the sequence.
#[derive(Debug, Default)]
struct KeyAllocator {
    /// Last observed `(millis, sequence)` pair.
    last: Mutex<(i64, u32)>,
}

impl KeyAllocator {
    /// Returns the filename stem for the next artifact of `game` at `now`.
    fn next_stem(&self, game: &GameId, now: Timestamp) -> Result<String, ArtifactError> {
        let millis = now.as_unix_millis();
        let mut guard = self
            .last
            .lock()
            .map_err(|_| ArtifactError::InvalidKey("key allocator mutex poisoned".to_string()))?;
        let (last_millis, last_seq) = *guard;
        let seq = if millis <= last_millis { last_seq.saturating_add(1) } else { 0 };
        let effective_millis = millis.max(last_millis);
        *guard = (effective_millis, seq);
        drop(guard);
        if seq == 0 {
            Ok(format!("{}.{effective_millis}", game.as_str()))
        } else {
            Ok(format!("{}.{effective_millis}.{seq}", game.as_str()))
        }
    }
}

// ============================================================================
// SECTION: Filesystem Store
// ============================================================================

/// Filesystem-backed artifact store rooted at a save-states directory.
#[derive(Debug)]
pub struct FsArtifactStore {
    /// Root directory containing one subdirectory per game.
    root: PathBuf,
    /// Collision-free key allocator.
    keys: KeyAllocator,
}

impl FsArtifactStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            keys: KeyAllocator::default(),
        }
    }

    /// Returns the directory holding all artifacts for `game`.
    #[must_use]
    pub fn game_dir(&self, game: &GameId) -> PathBuf {
        self.root.join(game.as_str())
    }

    /// Validates a game hash for use as a directory name.
    fn validate_game_key(game: &GameId) -> Result<(), ArtifactError> {
        let key = game.as_str();
        if key.is_empty() || key.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ArtifactError::InvalidKey("game key length out of range".to_string()));
        }
        if key.contains(['/', '\\', '.']) {
            return Err(ArtifactError::InvalidKey(format!(
                "game key contains path characters: {key}"
            )));
        }
        Ok(())
    }

    /// Creates the game directory and returns final + temp paths for a new
    /// artifact with the given extension.
    fn allocate(
        &self,
        game: &GameId,
        extension: &str,
    ) -> Result<(PathBuf, PathBuf), ArtifactError> {
        Self::validate_game_key(game)?;
        let dir = self.game_dir(game);
        fs::create_dir_all(&dir).map_err(|err| ArtifactError::Io(err.to_string()))?;
        let stem = self.keys.next_stem(game, Timestamp::now())?;
        let file_name = format!("{stem}.{extension}");
        let final_path = dir.join(&file_name);
        let temp_path = dir.join(format!("{TEMP_PREFIX}{file_name}"));
        Ok((final_path, temp_path))
    }

    /// Removes files in the game directory that are not in `referenced`.
    ///
    /// Orphans are the failure-safe residue of interrupted deletes and
    /// compensated inserts; this sweep collects them. Must not run while a
    /// save is in flight for the same game, or it would collect the staged
    /// temp file.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] when the directory cannot be read.
    pub fn sweep_orphans(
        &self,
        game: &GameId,
        referenced: &[PathBuf],
    ) -> Result<Vec<PathBuf>, ArtifactError> {
        Self::validate_game_key(game)?;
        let dir = self.game_dir(game);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ArtifactError::Io(err.to_string())),
        };
        let mut swept = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| ArtifactError::Io(err.to_string()))?;
            let path = entry.path();
            if !path.is_file() || referenced.contains(&path) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => swept.push(path),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    log::warn!("orphan sweep failed for {}: {err}", path.display());
                }
            }
        }
        Ok(swept)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write_image(&self, game: &GameId, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        let (final_path, temp_path) = self.allocate(game, IMAGE_EXTENSION)?;
        fs::write(&temp_path, bytes).map_err(|err| ArtifactError::Write(err.to_string()))?;
        if let Err(err) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(ArtifactError::Write(err.to_string()));
        }
        Ok(final_path)
    }

    fn stage_blob(&self, game: &GameId) -> Result<BlobSlot, ArtifactError> {
        let (final_path, temp_path) = self.allocate(game, BLOB_EXTENSION)?;
        Ok(BlobSlot {
            temp_path,
            final_path,
        })
    }

    fn commit_blob(&self, slot: &BlobSlot) -> Result<PathBuf, ArtifactError> {
        if !slot.temp_path.is_file() {
            return Err(ArtifactError::Write(format!(
                "staged blob missing: {}",
                slot.temp_path.display()
            )));
        }
        fs::rename(&slot.temp_path, &slot.final_path)
            .map_err(|err| ArtifactError::Write(err.to_string()))?;
        Ok(slot.final_path.clone())
    }

    fn abort_blob(&self, slot: &BlobSlot) {
        if let Err(err) = fs::remove_file(&slot.temp_path)
            && err.kind() != io::ErrorKind::NotFound
        {
            log::warn!("failed to discard staged blob {}: {err}", slot.temp_path.display());
        }
    }

    fn delete(&self, path: &Path) -> Result<(), ArtifactError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ArtifactError::Io(err.to_string())),
        }
    }
}
