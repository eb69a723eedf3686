// crates/savepoint-core/src/runtime/mod.rs
// ============================================================================
// Module: Savepoint Runtime
// Description: Autosave policy machinery and test-oriented catalog.
// Purpose: House the pure decision logic the session driver executes against.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime holds the deterministic pieces that sit between the data model
//! and the session coordinator: the autosave policy (pure function + state
//! machine) and an in-memory catalog used by tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod memory;
pub mod policy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use memory::InMemoryCatalog;
pub use policy::AutosaveEvent;
pub use policy::DEFAULT_DEBOUNCE_SECS;
pub use policy::DEFAULT_KEEP_AUTOSAVES;
pub use policy::DEFAULT_MANUAL_GRACE_SECS;
pub use policy::DEFAULT_MINIMUM_PLAY_SECS;
pub use policy::DEFAULT_TIMER_INTERVAL_SECS;
pub use policy::AutosaveInput;
pub use policy::AutosavePolicy;
pub use policy::AutosaveState;
pub use policy::AutosaveVerdict;
pub use policy::InvalidTransition;
pub use policy::SkipReason;
