// crates/savepoint-core/src/core/mod.rs
// ============================================================================
// Module: Savepoint Core Model
// Description: Identifiers, time, records, and cheat normalization.
// Purpose: Canonical data model consumed by every other Savepoint crate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The core model is deliberately small: opaque identifiers, millisecond
//! timestamps, registry snapshots, and the two durable record types. All
//! behavior lives behind the trait seams in [`crate::interfaces`] and the
//! policy machinery in [`crate::runtime`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cheats;
pub mod identifiers;
pub mod records;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cheats::normalize_cheat_code;
pub use identifiers::CheatId;
pub use identifiers::CoreId;
pub use identifiers::GameId;
pub use identifiers::SaveStateId;
pub use identifiers::SystemId;
pub use records::CheatRecord;
pub use records::CoreDescriptor;
pub use records::Game;
pub use records::SaveStateRecord;
pub use time::Timestamp;
