// crates/savepoint-artifacts/tests/fs_store.rs
// ============================================================================
// Module: Filesystem Artifact Store Tests
// Description: Layout, atomic promotion, and deletion semantics.
// Purpose: Validate the durable artifact contract against a real temp dir.
// ============================================================================

//! Integration tests for [`savepoint_artifacts::FsArtifactStore`].

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

use std::fs;
use std::path::PathBuf;

use savepoint_artifacts::FsArtifactStore;
use savepoint_core::GameId;
use savepoint_core::interfaces::ArtifactError;
use savepoint_core::interfaces::ArtifactStore;

fn store() -> (tempfile::TempDir, FsArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path());
    (dir, store)
}

#[test]
fn image_write_lands_under_the_game_directory() {
    let (_dir, store) = store();
    let game = GameId::new("abc123");
    let path = store.write_image(&game, b"jpeg-bytes").unwrap();

    assert!(path.starts_with(store.game_dir(&game)));
    assert_eq!(path.extension().unwrap(), "jpg");
    assert_eq!(fs::read(&path).unwrap(), b"jpeg-bytes");
}

#[test]
fn staged_blob_is_invisible_until_commit() {
    let (_dir, store) = store();
    let game = GameId::new("abc123");
    let slot = store.stage_blob(&game).unwrap();
    assert!(!slot.final_path.exists());

    fs::write(&slot.temp_path, b"state").unwrap();
    assert!(!slot.final_path.exists());

    let committed = store.commit_blob(&slot).unwrap();
    assert_eq!(committed, slot.final_path);
    assert!(!slot.temp_path.exists());
    assert_eq!(fs::read(&committed).unwrap(), b"state");
}

#[test]
fn commit_without_a_staged_file_fails() {
    let (_dir, store) = store();
    let slot = store.stage_blob(&GameId::new("abc123")).unwrap();
    assert!(matches!(store.commit_blob(&slot), Err(ArtifactError::Write(_))));
}

#[test]
fn abort_discards_the_staged_file() {
    let (_dir, store) = store();
    let slot = store.stage_blob(&GameId::new("abc123")).unwrap();
    fs::write(&slot.temp_path, b"state").unwrap();
    store.abort_blob(&slot);
    assert!(!slot.temp_path.exists());
    // Aborting twice is harmless.
    store.abort_blob(&slot);
}

#[test]
fn rapid_allocations_never_collide() {
    let (_dir, store) = store();
    let game = GameId::new("abc123");
    let mut finals = Vec::new();
    for _ in 0 .. 32 {
        let slot = store.stage_blob(&game).unwrap();
        assert!(!finals.contains(&slot.final_path));
        finals.push(slot.final_path);
    }
}

#[test]
fn blob_slot_identifier_tracks_the_final_stem() {
    let (_dir, store) = store();
    let slot = store.stage_blob(&GameId::new("abc123")).unwrap();
    let stem = slot.final_path.file_stem().unwrap().to_string_lossy().into_owned();
    assert_eq!(slot.save_state_id().as_str(), stem);
    assert!(stem.starts_with("abc123."));
}

#[test]
fn delete_is_idempotent() {
    let (_dir, store) = store();
    let game = GameId::new("abc123");
    let path = store.write_image(&game, b"jpeg").unwrap();
    store.delete(&path).unwrap();
    assert!(!path.exists());
    // Second delete of the same path is not an error.
    store.delete(&path).unwrap();
}

#[test]
fn game_keys_with_path_characters_are_rejected() {
    let (_dir, store) = store();
    for key in ["", "../escape", "a/b", "a\\b", "dotted.key"] {
        let result = store.stage_blob(&GameId::new(key));
        assert!(matches!(result, Err(ArtifactError::InvalidKey(_))), "key: {key:?}");
    }
}

#[test]
fn orphan_sweep_spares_referenced_files() {
    let (_dir, store) = store();
    let game = GameId::new("abc123");
    let kept = store.write_image(&game, b"kept").unwrap();
    let orphan = store.write_image(&game, b"orphan").unwrap();

    let swept = store.sweep_orphans(&game, &[kept.clone()]).unwrap();
    assert_eq!(swept, vec![orphan.clone()]);
    assert!(kept.exists());
    assert!(!orphan.exists());
}

#[test]
fn orphan_sweep_of_an_absent_game_directory_is_empty() {
    let (_dir, store) = store();
    let swept = store.sweep_orphans(&GameId::new("nevergame"), &[]).unwrap();
    assert_eq!(swept, Vec::<PathBuf>::new());
}
