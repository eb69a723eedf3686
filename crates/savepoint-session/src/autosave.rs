// crates/savepoint-session/src/autosave.rs
// ============================================================================
// Module: Autosave Driver
// Description: Timer thread driving periodic policy-checked autosaves.
// Purpose: Fire autosaves on an interval; suspension cancels, never defers.
// Dependencies: savepoint-core, log
// ============================================================================

//! ## Overview
//! The driver owns a timer thread that attempts one policy-checked autosave
//! per interval. Suspending cancels the thread outright: a timer that was
//! due while suspended does not fire on resume, it starts a fresh interval.
//! All lifecycle moves go through the [`AutosaveState`] machine, so an
//! illegal call (arming twice, resuming while armed) is a typed error
//! instead of a silent double timer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use savepoint_core::AutosaveEvent;
use savepoint_core::AutosaveState;
use savepoint_core::InvalidTransition;

use crate::coordinator::SessionCoordinator;

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Running timer thread and its cancellation channel.
struct TimerWorker {
    /// Dropping the sender wakes and stops the thread.
    stop: mpsc::Sender<()>,
    /// Join handle for the timer thread.
    thread: thread::JoinHandle<()>,
}

/// Periodic autosave driver bound to one session.
///
/// # Invariants
/// - At most one timer thread exists at a time.
/// - No autosave attempt starts after [`AutosaveDriver::suspend`] returns.
pub struct AutosaveDriver {
    /// Coordinator executing the autosave attempts.
    coordinator: Arc<SessionCoordinator>,
    /// Interval between attempts.
    interval: Duration,
    /// Lifecycle state shared with the timer thread.
    state: Arc<Mutex<AutosaveState>>,
    /// Currently running timer thread, if any.
    worker: Option<TimerWorker>,
}

impl AutosaveDriver {
    /// Creates an idle driver; no thread runs until [`Self::arm`].
    #[must_use]
    pub fn new(coordinator: Arc<SessionCoordinator>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
            state: Arc::new(Mutex::new(AutosaveState::Idle)),
            worker: None,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AutosaveState {
        self.state.lock().map_or(AutosaveState::Terminated, |guard| *guard)
    }

    /// Arms the driver and starts the timer thread.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the driver is idle.
    pub fn arm(&mut self) -> Result<(), InvalidTransition> {
        self.transition(AutosaveEvent::Arm)?;
        self.spawn_timer();
        Ok(())
    }

    /// Suspends the driver, cancelling the timer thread.
    ///
    /// Blocks until the thread has exited; an in-flight save attempt
    /// completes first, after which no further attempt starts.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the driver is armed.
    pub fn suspend(&mut self) -> Result<(), InvalidTransition> {
        self.stop_timer();
        self.transition(AutosaveEvent::Background)
    }

    /// Resumes a suspended driver with a fresh timer thread.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the driver is suspended.
    pub fn resume(&mut self) -> Result<(), InvalidTransition> {
        self.transition(AutosaveEvent::Foreground)?;
        self.spawn_timer();
        Ok(())
    }

    /// Terminates the driver for session teardown. Legal from every state.
    pub fn shutdown(&mut self) {
        self.stop_timer();
        if let Err(err) = self.transition(AutosaveEvent::SessionEnded) {
            log::warn!("autosave driver shutdown transition failed: {err}");
        }
    }

    /// Applies a lifecycle event to the shared state.
    fn transition(&self, event: AutosaveEvent) -> Result<(), InvalidTransition> {
        let mut guard = self.state.lock().map_err(|_| InvalidTransition {
            from: AutosaveState::Terminated,
            event,
        })?;
        *guard = guard.on_event(event)?;
        Ok(())
    }

    /// Spawns the timer thread for the current armed state.
    fn spawn_timer(&mut self) {
        let (stop, ticks) = mpsc::channel::<()>();
        let coordinator = Arc::clone(&self.coordinator);
        let state = Arc::clone(&self.state);
        let interval = self.interval;
        let thread = thread::spawn(move || {
            loop {
                match ticks.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => tick(&coordinator, &state),
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        self.worker = Some(TimerWorker {
            stop,
            thread,
        });
    }

    /// Stops and joins the timer thread, if one is running.
    fn stop_timer(&mut self) {
        if let Some(worker) = self.worker.take() {
            drop(worker.stop);
            if worker.thread.join().is_err() {
                log::warn!("autosave timer thread panicked");
            }
        }
    }
}

impl Drop for AutosaveDriver {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

/// One timer firing: move to saving, attempt, move back to armed.
fn tick(coordinator: &SessionCoordinator, state: &Mutex<AutosaveState>) {
    {
        let Ok(mut guard) = state.lock() else { return };
        match guard.on_event(AutosaveEvent::TimerFired) {
            Ok(next) => *guard = next,
            // Not armed anymore; the interval elapsed during teardown.
            Err(_) => return,
        }
    }
    match coordinator.autosave() {
        Ok(Some(id)) => log::info!("autosave {id} written"),
        Ok(None) => {}
        Err(err) => log::warn!("autosave attempt failed: {err}"),
    }
    if let Ok(mut guard) = state.lock()
        && let Ok(next) = guard.on_event(AutosaveEvent::SaveCompleted)
    {
        *guard = next;
    }
}
