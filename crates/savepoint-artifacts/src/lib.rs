// crates/savepoint-artifacts/src/lib.rs
// ============================================================================
// Module: Savepoint Artifacts
// Description: Filesystem artifact store for state blobs and screenshots.
// Purpose: Own the on-disk layout and atomic write discipline for artifacts.
// Dependencies: savepoint-core, log
// ============================================================================

//! ## Overview
//! This crate provides [`FsArtifactStore`], the durable implementation of
//! the [`savepoint_core::interfaces::ArtifactStore`] seam. It owns artifact
//! naming, per-game directory layout, temp-then-rename promotion, and the
//! orphan sweep used to reclaim blobs whose catalog records are gone.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Filesystem store implementation.
pub mod store;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use store::BLOB_EXTENSION;
pub use store::FsArtifactStore;
pub use store::IMAGE_EXTENSION;
