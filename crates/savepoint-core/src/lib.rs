// crates/savepoint-core/src/lib.rs
// ============================================================================
// Module: Savepoint Core Library
// Description: Data model, trait seams, and autosave policy for Savepoint.
// Purpose: Single source of truth for the save-state coordinator's contracts.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! `savepoint-core` defines the canonical model for the save-state and
//! cheat-persistence coordinator: typed identifiers, durable record shapes,
//! the trait seams to the emulation core and its registries, and the pure
//! autosave policy. Durable storage lives in `savepoint-store-sqlite`, the
//! on-disk blob layout in `savepoint-artifacts`, and orchestration in
//! `savepoint-session`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::CheatId;
pub use crate::core::CheatRecord;
pub use crate::core::CoreDescriptor;
pub use crate::core::CoreId;
pub use crate::core::Game;
pub use crate::core::GameId;
pub use crate::core::SaveStateId;
pub use crate::core::SaveStateRecord;
pub use crate::core::SystemId;
pub use crate::core::Timestamp;
pub use crate::core::normalize_cheat_code;
pub use crate::interfaces::ArtifactError;
pub use crate::interfaces::ArtifactStore;
pub use crate::interfaces::BlobSlot;
pub use crate::interfaces::CatalogError;
pub use crate::interfaces::CoreBridge;
pub use crate::interfaces::CoreCapabilities;
pub use crate::interfaces::CoreError;
pub use crate::interfaces::CoreRegistry;
pub use crate::interfaces::FrameSource;
pub use crate::interfaces::GameRegistry;
pub use crate::interfaces::SaveStateCatalog;
pub use crate::runtime::AutosaveEvent;
pub use crate::runtime::AutosaveInput;
pub use crate::runtime::AutosavePolicy;
pub use crate::runtime::AutosaveState;
pub use crate::runtime::AutosaveVerdict;
pub use crate::runtime::DEFAULT_DEBOUNCE_SECS;
pub use crate::runtime::DEFAULT_KEEP_AUTOSAVES;
pub use crate::runtime::DEFAULT_MANUAL_GRACE_SECS;
pub use crate::runtime::DEFAULT_MINIMUM_PLAY_SECS;
pub use crate::runtime::DEFAULT_TIMER_INTERVAL_SECS;
pub use crate::runtime::InMemoryCatalog;
pub use crate::runtime::InvalidTransition;
pub use crate::runtime::SkipReason;
