// crates/savepoint-session/src/guard.rs
// ============================================================================
// Module: Fault Guard
// Description: Panic-hook emergency autosave scoped to the session lifetime.
// Purpose: Capture one best-effort save when the process is going down.
// Dependencies: savepoint-core
// ============================================================================

//! ## Overview
//! While a session is running with autosave enabled, a panic hook performs
//! one synchronous best-effort save (no screenshot) before the previous
//! hook runs. The guard chains whatever hook was installed before it and
//! restores it on drop, so the emergency path lives exactly as long as the
//! session that armed it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::panic;
use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::coordinator::SessionCoordinator;

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Previous panic hook, shared between the chained hook and the guard.
type PreviousHook = Arc<dyn Fn(&PanicHookInfo<'_>) + Send + Sync>;

/// Session-scoped emergency save hook.
///
/// # Invariants
/// - The emergency save runs at most once per guard.
/// - Dropping the guard disarms the hook and restores the previous one.
pub struct FaultGuard {
    /// Disarms the emergency path before the hook is restored.
    armed: Arc<AtomicBool>,
    /// Hook that was installed before this guard.
    previous: PreviousHook,
}

impl FaultGuard {
    /// Installs the emergency save hook for a session.
    ///
    /// The guard holds only a weak reference; a coordinator that is already
    /// gone at panic time simply skips the save.
    #[must_use]
    pub fn install(coordinator: &Arc<SessionCoordinator>) -> Self {
        let armed = Arc::new(AtomicBool::new(true));
        let fired = AtomicBool::new(false);
        let weak: Weak<SessionCoordinator> = Arc::downgrade(coordinator);
        let previous: PreviousHook = Arc::from(panic::take_hook());

        let hook_armed = Arc::clone(&armed);
        let chained = Arc::clone(&previous);
        panic::set_hook(Box::new(move |info| {
            if hook_armed.load(Ordering::SeqCst)
                && !fired.swap(true, Ordering::SeqCst)
                && let Some(coordinator) = weak.upgrade()
            {
                coordinator.emergency_save();
            }
            chained(info);
        }));

        Self {
            armed,
            previous,
        }
    }
}

impl Drop for FaultGuard {
    fn drop(&mut self) {
        self.armed.store(false, Ordering::SeqCst);
        let previous = Arc::clone(&self.previous);
        panic::set_hook(Box::new(move |info| previous(info)));
    }
}
