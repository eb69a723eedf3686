// crates/savepoint-session/src/migrate.rs
// ============================================================================
// Module: Legacy Migrator
// Description: One-shot migration of slot-file save layouts into the catalog.
// Purpose: Move legacy blobs into the artifact layout and record them.
// Dependencies: savepoint-core, log, serde, serde_json
// ============================================================================

//! ## Overview
//! The legacy layout kept one auto slot (`{hash}.svs`), up to five numbered
//! manual slots (`{hash}.{n}.svs`), and a `{hash}.info.json` sidecar naming
//! the core that produced them. Migration moves each blob (rename, never
//! copy) into the artifact layout and inserts a catalog record; a slot
//! whose insert fails is moved back so a later run can retry it. The
//! sidecar is deleted last, and only when every present slot migrated, so
//! the run is idempotent: a second pass finds nothing to do.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use savepoint_core::CoreId;
use savepoint_core::GameId;
use savepoint_core::SaveStateRecord;
use savepoint_core::Timestamp;
use savepoint_core::interfaces::ArtifactStore;
use savepoint_core::interfaces::CoreRegistry;
use savepoint_core::interfaces::SaveStateCatalog;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of numbered manual slots in the legacy layout.
const LEGACY_MANUAL_SLOTS: u32 = 5;

// ============================================================================
// SECTION: Report
// ============================================================================

/// One slot that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    /// Legacy filename of the failed slot.
    pub slot: String,
    /// Human-readable failure cause.
    pub reason: String,
}

/// Outcome of one migration pass over a game's legacy directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Slots moved into the catalog.
    pub migrated: usize,
    /// Slot positions with no file present.
    pub skipped: usize,
    /// Slots that failed and were left in place.
    pub failures: Vec<MigrationFailure>,
}

impl MigrationReport {
    /// Returns true when nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sidecar metadata naming the core that produced the legacy slots.
#[derive(Debug, Deserialize)]
struct LegacySidecar {
    /// Identifier of the producing core.
    core_id: String,
    /// Core project version at save time, when recorded.
    #[serde(default)]
    core_version: Option<String>,
}

// ============================================================================
// SECTION: Migrator
// ============================================================================

/// Moves legacy slot files into the artifact layout and catalog.
pub struct LegacyMigrator {
    /// Metadata catalog receiving the migrated records.
    catalog: Arc<dyn SaveStateCatalog>,
    /// Artifact layout receiving the moved blobs.
    artifacts: Arc<dyn ArtifactStore>,
    /// Registry resolving the sidecar's core identifier.
    cores: Arc<dyn CoreRegistry>,
}

impl LegacyMigrator {
    /// Creates a migrator over the given stores.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn SaveStateCatalog>,
        artifacts: Arc<dyn ArtifactStore>,
        cores: Arc<dyn CoreRegistry>,
    ) -> Self {
        Self {
            catalog,
            artifacts,
            cores,
        }
    }

    /// Migrates one game's legacy directory. Runs before the autosave
    /// driver arms; per-slot failures are isolated and reported.
    #[must_use]
    pub fn migrate_game(&self, legacy_dir: &Path, game: &GameId) -> MigrationReport {
        let mut report = MigrationReport::default();
        let hash = game.as_str();
        let sidecar_path = legacy_dir.join(format!("{hash}.info.json"));

        let mut slots: Vec<(PathBuf, String, bool)> = Vec::new();
        let auto_name = format!("{hash}.svs");
        slots.push((legacy_dir.join(&auto_name), auto_name, true));
        for n in 0 .. LEGACY_MANUAL_SLOTS {
            let name = format!("{hash}.{n}.svs");
            slots.push((legacy_dir.join(&name), name, false));
        }

        let present: Vec<&(PathBuf, String, bool)> =
            slots.iter().filter(|(path, _, _)| path.is_file()).collect();
        report.skipped = slots.len() - present.len();
        if present.is_empty() {
            // Nothing left to migrate; a stale sidecar alone is removed.
            if sidecar_path.is_file()
                && let Err(err) = fs::remove_file(&sidecar_path)
            {
                log::warn!("failed to remove legacy sidecar {}: {err}", sidecar_path.display());
            }
            return report;
        }

        let sidecar = match read_sidecar(&sidecar_path) {
            Ok(sidecar) => sidecar,
            Err(reason) => {
                for (_, name, _) in &present {
                    report.failures.push(MigrationFailure {
                        slot: name.clone(),
                        reason: reason.clone(),
                    });
                }
                return report;
            }
        };
        let core_id = CoreId::new(sidecar.core_id.as_str());
        let Some(descriptor) = self.cores.core(&core_id) else {
            for (_, name, _) in &present {
                report.failures.push(MigrationFailure {
                    slot: name.clone(),
                    reason: format!("no core found for {core_id}"),
                });
            }
            return report;
        };
        let core_version =
            sidecar.core_version.clone().unwrap_or_else(|| descriptor.project_version.clone());

        for (path, name, is_auto) in present {
            match self.migrate_slot(path, game, &core_id, &core_version, *is_auto) {
                Ok(()) => report.migrated += 1,
                Err(reason) => {
                    log::warn!("legacy slot {name} not migrated: {reason}");
                    report.failures.push(MigrationFailure {
                        slot: name.clone(),
                        reason,
                    });
                }
            }
        }

        // Sidecar goes last; a retry still needs it when any slot remains.
        if report.is_clean()
            && sidecar_path.is_file()
            && let Err(err) = fs::remove_file(&sidecar_path)
        {
            log::warn!("failed to remove legacy sidecar {}: {err}", sidecar_path.display());
        }
        report
    }

    /// Moves one slot file into the artifact layout and records it.
    fn migrate_slot(
        &self,
        legacy_path: &Path,
        game: &GameId,
        core_id: &CoreId,
        core_version: &str,
        is_auto: bool,
    ) -> Result<(), String> {
        let created_at = file_timestamp(legacy_path);
        let slot = self.artifacts.stage_blob(game).map_err(|err| err.to_string())?;
        fs::rename(legacy_path, &slot.temp_path)
            .map_err(|err| format!("move into staging failed: {err}"))?;
        let blob_path = match self.artifacts.commit_blob(&slot) {
            Ok(path) => path,
            Err(err) => {
                restore_legacy(&slot.temp_path, legacy_path);
                return Err(err.to_string());
            }
        };
        let record = SaveStateRecord {
            id: slot.save_state_id(),
            game_id: game.clone(),
            core_id: core_id.clone(),
            blob_path: blob_path.clone(),
            image_path: None,
            is_autosave: is_auto,
            created_at,
            last_opened: None,
            created_with_core_version: core_version.to_string(),
        };
        if let Err(err) = self.catalog.insert_save_state(&record) {
            restore_legacy(&blob_path, legacy_path);
            return Err(format!("catalog insert failed: {err}"));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads and parses the legacy sidecar.
fn read_sidecar(path: &Path) -> Result<LegacySidecar, String> {
    let bytes =
        fs::read(path).map_err(|err| format!("sidecar {} unreadable: {err}", path.display()))?;
    serde_json::from_slice(&bytes).map_err(|err| format!("sidecar parse failed: {err}"))
}

/// Moves a blob back to its legacy path after a failed migration step.
fn restore_legacy(from: &Path, legacy_path: &Path) {
    if let Err(err) = fs::rename(from, legacy_path) {
        log::warn!(
            "failed to restore legacy slot {} from {}: {err}",
            legacy_path.display(),
            from.display()
        );
    }
}

/// Uses the slot file's modified time as the record timestamp.
fn file_timestamp(path: &Path) -> Timestamp {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .and_then(|elapsed| i64::try_from(elapsed.as_millis()).ok())
        .map_or_else(Timestamp::now, Timestamp::from_unix_millis)
}
