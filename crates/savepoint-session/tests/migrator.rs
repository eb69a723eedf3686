// crates/savepoint-session/tests/migrator.rs
// ============================================================================
// Module: Legacy Migration Tests
// Description: Slot-file migration, idempotence, and failure isolation.
// Purpose: Validate that legacy layouts fold into the catalog exactly once.
// ============================================================================

//! Integration tests for [`savepoint_session::LegacyMigrator`].

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use savepoint_artifacts::FsArtifactStore;
use savepoint_core::CoreDescriptor;
use savepoint_core::CoreId;
use savepoint_core::GameId;
use savepoint_core::InMemoryCatalog;
use savepoint_core::SaveStateCatalog;
use savepoint_session::LegacyMigrator;

use common::CORE_ID;
use common::GAME_HASH;
use common::OneCore;

/// Everything a migration run needs, rooted in one temp directory.
struct Rig {
    migrator: LegacyMigrator,
    catalog: Arc<InMemoryCatalog>,
    game_id: GameId,
    legacy_dir: std::path::PathBuf,
    artifact_root: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn rig() -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let legacy_dir = dir.path().join("legacy");
    let artifact_root = dir.path().join("artifacts");
    fs::create_dir_all(&legacy_dir).unwrap();
    let catalog = Arc::new(InMemoryCatalog::new());
    let artifacts = Arc::new(FsArtifactStore::new(&artifact_root));
    let cores = Arc::new(OneCore(CoreDescriptor {
        id: CoreId::new(CORE_ID),
        project_version: "1.0".to_string(),
    }));
    Rig {
        migrator: LegacyMigrator::new(Arc::clone(&catalog) as Arc<dyn SaveStateCatalog>, artifacts, cores),
        catalog,
        game_id: GameId::new(GAME_HASH),
        legacy_dir,
        artifact_root,
        _dir: dir,
    }
}

fn write_slot(dir: &Path, name: &str) {
    fs::write(dir.join(name), format!("legacy-bytes-{name}")).unwrap();
}

fn write_sidecar(dir: &Path, json: &str) {
    fs::write(dir.join(format!("{GAME_HASH}.info.json")), json).unwrap();
}

#[test]
fn present_slots_move_into_the_catalog() {
    let rig = rig();
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.svs"));
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.0.svs"));
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.3.svs"));
    write_sidecar(&rig.legacy_dir, r#"{"core_id":"core.mock","core_version":"0.9"}"#);

    let report = rig.migrator.migrate_game(&rig.legacy_dir, &rig.game_id);
    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(report.migrated, 3);
    assert_eq!(report.skipped, 3);

    let records = rig.catalog.list_save_states(&rig.game_id).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records.iter().filter(|record| record.is_autosave).count(), 1);
    for record in &records {
        assert!(record.blob_path.is_file());
        assert!(record.blob_path.starts_with(rig.artifact_root.join(GAME_HASH)));
        assert!(record.image_path.is_none());
        assert_eq!(record.created_with_core_version, "0.9");
    }

    // The legacy directory holds nothing but its now-empty shell.
    let leftover: Vec<_> = fs::read_dir(&rig.legacy_dir).unwrap().collect();
    assert!(leftover.is_empty(), "legacy files left behind: {leftover:?}");
}

#[test]
fn a_second_run_finds_nothing_to_do() {
    let rig = rig();
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.svs"));
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.1.svs"));
    write_sidecar(&rig.legacy_dir, r#"{"core_id":"core.mock"}"#);

    let first = rig.migrator.migrate_game(&rig.legacy_dir, &rig.game_id);
    assert_eq!(first.migrated, 2);

    let second = rig.migrator.migrate_game(&rig.legacy_dir, &rig.game_id);
    assert!(second.is_clean());
    assert_eq!(second.migrated, 0);
    assert_eq!(second.skipped, 6);
    assert_eq!(rig.catalog.list_save_states(&rig.game_id).unwrap().len(), 2);
}

#[test]
fn sidecar_version_falls_back_to_the_registry() {
    let rig = rig();
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.svs"));
    write_sidecar(&rig.legacy_dir, r#"{"core_id":"core.mock"}"#);

    let report = rig.migrator.migrate_game(&rig.legacy_dir, &rig.game_id);
    assert!(report.is_clean());
    let records = rig.catalog.list_save_states(&rig.game_id).unwrap();
    assert_eq!(records[0].created_with_core_version, "1.0");
}

#[test]
fn unknown_core_leaves_every_file_in_place() {
    let rig = rig();
    let auto_name = format!("{GAME_HASH}.svs");
    write_slot(&rig.legacy_dir, &auto_name);
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.2.svs"));
    write_sidecar(&rig.legacy_dir, r#"{"core_id":"core.ghost"}"#);

    let report = rig.migrator.migrate_game(&rig.legacy_dir, &rig.game_id);
    assert_eq!(report.migrated, 0);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().any(|failure| failure.slot == auto_name));

    assert!(rig.legacy_dir.join(&auto_name).is_file());
    assert!(rig.legacy_dir.join(format!("{GAME_HASH}.2.svs")).is_file());
    assert!(rig.legacy_dir.join(format!("{GAME_HASH}.info.json")).is_file());
    assert!(rig.catalog.list_save_states(&rig.game_id).unwrap().is_empty());
}

#[test]
fn missing_sidecar_fails_the_present_slots() {
    let rig = rig();
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.4.svs"));

    let report = rig.migrator.migrate_game(&rig.legacy_dir, &rig.game_id);
    assert_eq!(report.migrated, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(rig.legacy_dir.join(format!("{GAME_HASH}.4.svs")).is_file());
}

#[test]
fn malformed_sidecar_fails_the_present_slots() {
    let rig = rig();
    write_slot(&rig.legacy_dir, &format!("{GAME_HASH}.svs"));
    write_sidecar(&rig.legacy_dir, "not json at all");

    let report = rig.migrator.migrate_game(&rig.legacy_dir, &rig.game_id);
    assert_eq!(report.migrated, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(rig.legacy_dir.join(format!("{GAME_HASH}.svs")).is_file());
}

#[test]
fn a_stale_sidecar_with_no_slots_is_removed() {
    let rig = rig();
    write_sidecar(&rig.legacy_dir, r#"{"core_id":"core.mock"}"#);

    let report = rig.migrator.migrate_game(&rig.legacy_dir, &rig.game_id);
    assert!(report.is_clean());
    assert_eq!(report.migrated, 0);
    assert_eq!(report.skipped, 6);
    assert!(!rig.legacy_dir.join(format!("{GAME_HASH}.info.json")).exists());
}
