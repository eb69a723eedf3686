// crates/savepoint-core/src/runtime/policy.rs
// ============================================================================
// Module: Savepoint Autosave Policy
// Description: Autosave gating decision and lifecycle state machine.
// Purpose: Decide when a timed autosave may fire, deterministically.
// Dependencies: crate::core::time, serde, thiserror
// ============================================================================

//! ## Overview
//! The policy is a pure function over explicit inputs: no wall clock, no
//! timer handle, no store access. The session crate owns the recurring
//! trigger and feeds observations in; this module only answers "may an
//! autosave fire right now" and tracks the legal lifecycle transitions.
//!
//! All elapsed-time gates use strict `<` against their thresholds: at
//! exactly the threshold the gate opens. 59 seconds of play blocks the
//! default 60-second minimum; 61 seconds passes it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default minimum play time before the first autosave (seconds).
pub const DEFAULT_MINIMUM_PLAY_SECS: u64 = 60;
/// Default debounce between consecutive autosaves (seconds).
pub const DEFAULT_DEBOUNCE_SECS: u64 = 60;
/// Default window in which a fresh manual save supersedes an autosave (seconds).
pub const DEFAULT_MANUAL_GRACE_SECS: u64 = 60;
/// Default autosave retention ceiling per game.
pub const DEFAULT_KEEP_AUTOSAVES: usize = 5;
/// Default recurring timer interval (seconds).
pub const DEFAULT_TIMER_INTERVAL_SECS: u64 = 600;

// ============================================================================
// SECTION: Policy Configuration
// ============================================================================

/// Thresholds governing timed autosaves.
///
/// # Invariants
/// - All durations are non-zero when constructed from validated config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutosavePolicy {
    /// Minimum elapsed play time before any autosave may fire.
    pub minimum_play: Duration,
    /// Minimum gap between consecutive autosaves.
    pub debounce: Duration,
    /// Window in which a recent manual save suppresses an autosave.
    pub manual_grace: Duration,
    /// Retention ceiling for autosave records per game.
    pub keep_autosaves: usize,
    /// Recurring timer interval for the autosave driver.
    pub timer_interval: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            minimum_play: Duration::from_secs(DEFAULT_MINIMUM_PLAY_SECS),
            debounce: Duration::from_secs(DEFAULT_DEBOUNCE_SECS),
            manual_grace: Duration::from_secs(DEFAULT_MANUAL_GRACE_SECS),
            keep_autosaves: DEFAULT_KEEP_AUTOSAVES,
            timer_interval: Duration::from_secs(DEFAULT_TIMER_INTERVAL_SECS),
        }
    }
}

// ============================================================================
// SECTION: Decision Function
// ============================================================================

/// Observations the decision function evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutosaveInput {
    /// Whether the core declared the save-state capability.
    pub save_states_supported: bool,
    /// When the current play session started, if known.
    pub last_played_at: Option<Timestamp>,
    /// Creation time of the newest autosave for this game, if any.
    pub last_autosave_at: Option<Timestamp>,
    /// Creation time of the newest manual save for this game, if any.
    pub last_manual_save_at: Option<Timestamp>,
}

/// Named reason an autosave was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Core does not support save states.
    CoreUnsupported,
    /// Session has not met the minimum play time.
    SessionTooYoung,
    /// A previous autosave is inside the debounce window.
    RecentAutosave,
    /// A manual save inside the grace window supersedes the autosave.
    RecentManualSave,
}

/// Outcome of one autosave policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveVerdict {
    /// All gates passed; the autosave may fire.
    Fire,
    /// A gate held; the autosave is skipped.
    Skip(SkipReason),
}

impl AutosaveVerdict {
    /// Returns true when the verdict permits a save.
    #[must_use]
    pub const fn should_fire(self) -> bool {
        matches!(self, Self::Fire)
    }
}

impl AutosavePolicy {
    /// Evaluates whether an autosave may fire at `now`.
    ///
    /// Returns the first failing gate, in fixed order: capability, minimum
    /// play time, autosave debounce, manual-save grace. A session with no
    /// known start time fails the minimum-play gate.
    #[must_use]
    pub fn should_autosave(&self, input: &AutosaveInput, now: Timestamp) -> AutosaveVerdict {
        if !input.save_states_supported {
            return AutosaveVerdict::Skip(SkipReason::CoreUnsupported);
        }
        match input.last_played_at {
            None => return AutosaveVerdict::Skip(SkipReason::SessionTooYoung),
            Some(started) => {
                if now.saturating_since(started) < self.minimum_play {
                    return AutosaveVerdict::Skip(SkipReason::SessionTooYoung);
                }
            }
        }
        if let Some(last_autosave) = input.last_autosave_at
            && now.saturating_since(last_autosave) < self.debounce
        {
            return AutosaveVerdict::Skip(SkipReason::RecentAutosave);
        }
        if let Some(last_manual) = input.last_manual_save_at
            && now.saturating_since(last_manual) < self.manual_grace
        {
            return AutosaveVerdict::Skip(SkipReason::RecentManualSave);
        }
        AutosaveVerdict::Fire
    }
}

// ============================================================================
// SECTION: Lifecycle State Machine
// ============================================================================

/// Autosave driver lifecycle state.
///
/// # Invariants
/// - The recurring trigger exists only in `Armed`; suspension cancels it
///   rather than muting it, so no catch-up fire occurs on resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutosaveState {
    /// Driver constructed, timer not yet armed.
    Idle,
    /// Timer armed and ticking.
    Armed,
    /// A policy-approved save is in flight.
    Saving,
    /// App backgrounded; timer cancelled.
    Suspended,
    /// Session ended; terminal.
    Terminated,
}

/// Lifecycle events applied to [`AutosaveState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveEvent {
    /// Arm the recurring timer.
    Arm,
    /// The timer fired and policy approved a save.
    TimerFired,
    /// The in-flight save finished (success or failure).
    SaveCompleted,
    /// The app entered the background.
    Background,
    /// The app returned to the foreground.
    Foreground,
    /// The session is shutting down.
    SessionEnded,
}

/// An event arrived in a state that has no transition for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no autosave transition from {from:?} on {event:?}")]
pub struct InvalidTransition {
    /// State the machine was in.
    pub from: AutosaveState,
    /// Event that had no transition.
    pub event: AutosaveEvent,
}

impl AutosaveState {
    /// Applies one lifecycle event, returning the next state.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the event is not legal in the
    /// current state. `SessionEnded` is legal everywhere.
    pub fn on_event(self, event: AutosaveEvent) -> Result<Self, InvalidTransition> {
        if matches!(event, AutosaveEvent::SessionEnded) {
            return Ok(Self::Terminated);
        }
        match (self, event) {
            (Self::Idle, AutosaveEvent::Arm)
            | (Self::Saving, AutosaveEvent::SaveCompleted)
            | (Self::Suspended, AutosaveEvent::Foreground) => Ok(Self::Armed),
            (Self::Armed, AutosaveEvent::TimerFired) => Ok(Self::Saving),
            (Self::Armed, AutosaveEvent::Background) => Ok(Self::Suspended),
            (from, event) => Err(InvalidTransition { from, event }),
        }
    }

    /// Returns true once the machine reached its terminal state.
    #[must_use]
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }
}
