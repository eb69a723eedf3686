// crates/savepoint-core/tests/policy.rs
// ============================================================================
// Module: Autosave Policy Unit Tests
// Description: Gate ordering, threshold boundaries, and lifecycle transitions.
// Purpose: Validate the pure autosave decision against its documented gates.
// ============================================================================

//! Unit tests for the autosave policy decision function and state machine.

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

use std::time::Duration;

use savepoint_core::AutosaveEvent;
use savepoint_core::AutosaveInput;
use savepoint_core::AutosavePolicy;
use savepoint_core::AutosaveState;
use savepoint_core::AutosaveVerdict;
use savepoint_core::SkipReason;
use savepoint_core::Timestamp;

fn at_secs(secs: i64) -> Timestamp {
    Timestamp::from_unix_millis(secs * 1_000)
}

fn supported_input(played_secs_ago: i64, now_secs: i64) -> AutosaveInput {
    AutosaveInput {
        save_states_supported: true,
        last_played_at: Some(at_secs(now_secs - played_secs_ago)),
        last_autosave_at: None,
        last_manual_save_at: None,
    }
}

#[test]
fn unsupported_core_blocks_before_any_time_gate() {
    let policy = AutosavePolicy::default();
    let input = AutosaveInput {
        save_states_supported: false,
        ..supported_input(3_600, 10_000)
    };
    assert_eq!(
        policy.should_autosave(&input, at_secs(10_000)),
        AutosaveVerdict::Skip(SkipReason::CoreUnsupported)
    );
}

#[test]
fn minimum_play_time_boundary_blocks_at_59_and_fires_at_61() {
    let policy = AutosavePolicy::default();
    let now = at_secs(10_000);

    let young = supported_input(59, 10_000);
    assert_eq!(
        policy.should_autosave(&young, now),
        AutosaveVerdict::Skip(SkipReason::SessionTooYoung)
    );

    let old_enough = supported_input(61, 10_000);
    assert_eq!(policy.should_autosave(&old_enough, now), AutosaveVerdict::Fire);
}

#[test]
fn minimum_play_time_opens_exactly_at_threshold() {
    let policy = AutosavePolicy::default();
    let input = supported_input(60, 10_000);
    assert!(policy.should_autosave(&input, at_secs(10_000)).should_fire());
}

#[test]
fn unknown_session_start_counts_as_too_young() {
    let policy = AutosavePolicy::default();
    let input = AutosaveInput {
        save_states_supported: true,
        last_played_at: None,
        last_autosave_at: None,
        last_manual_save_at: None,
    };
    assert_eq!(
        policy.should_autosave(&input, at_secs(10_000)),
        AutosaveVerdict::Skip(SkipReason::SessionTooYoung)
    );
}

#[test]
fn recent_autosave_debounces() {
    let policy = AutosavePolicy::default();
    let now = at_secs(10_000);
    let mut input = supported_input(3_600, 10_000);
    input.last_autosave_at = Some(at_secs(10_000 - 30));
    assert_eq!(
        policy.should_autosave(&input, now),
        AutosaveVerdict::Skip(SkipReason::RecentAutosave)
    );

    input.last_autosave_at = Some(at_secs(10_000 - 90));
    assert!(policy.should_autosave(&input, now).should_fire());
}

#[test]
fn fresh_manual_save_supersedes_autosave() {
    let policy = AutosavePolicy::default();
    let now = at_secs(10_000);
    let mut input = supported_input(3_600, 10_000);
    input.last_manual_save_at = Some(at_secs(10_000 - 10));
    assert_eq!(
        policy.should_autosave(&input, now),
        AutosaveVerdict::Skip(SkipReason::RecentManualSave)
    );
}

#[test]
fn custom_thresholds_are_honored() {
    let policy = AutosavePolicy {
        minimum_play: Duration::from_secs(5),
        debounce: Duration::from_secs(5),
        manual_grace: Duration::from_secs(5),
        ..AutosavePolicy::default()
    };
    let input = supported_input(6, 10_000);
    assert!(policy.should_autosave(&input, at_secs(10_000)).should_fire());
}

#[test]
fn clock_skew_saturates_instead_of_panicking() {
    let policy = AutosavePolicy::default();
    let mut input = supported_input(3_600, 10_000);
    // Session start in the future reads as zero elapsed play time.
    input.last_played_at = Some(at_secs(20_000));
    assert_eq!(
        policy.should_autosave(&input, at_secs(10_000)),
        AutosaveVerdict::Skip(SkipReason::SessionTooYoung)
    );
}

#[test]
fn lifecycle_happy_path() {
    let state = AutosaveState::Idle;
    let state = state.on_event(AutosaveEvent::Arm).unwrap();
    assert_eq!(state, AutosaveState::Armed);
    let state = state.on_event(AutosaveEvent::TimerFired).unwrap();
    assert_eq!(state, AutosaveState::Saving);
    let state = state.on_event(AutosaveEvent::SaveCompleted).unwrap();
    assert_eq!(state, AutosaveState::Armed);
}

#[test]
fn lifecycle_suspend_resume() {
    let state = AutosaveState::Armed;
    let state = state.on_event(AutosaveEvent::Background).unwrap();
    assert_eq!(state, AutosaveState::Suspended);
    // No timer fire is legal while suspended; the trigger was cancelled.
    assert!(state.on_event(AutosaveEvent::TimerFired).is_err());
    let state = state.on_event(AutosaveEvent::Foreground).unwrap();
    assert_eq!(state, AutosaveState::Armed);
}

#[test]
fn session_end_terminates_from_every_state() {
    for state in [
        AutosaveState::Idle,
        AutosaveState::Armed,
        AutosaveState::Saving,
        AutosaveState::Suspended,
        AutosaveState::Terminated,
    ] {
        let next = state.on_event(AutosaveEvent::SessionEnded).unwrap();
        assert!(next.is_terminated());
    }
}

#[test]
fn illegal_transitions_are_rejected() {
    let err = AutosaveState::Idle.on_event(AutosaveEvent::TimerFired).unwrap_err();
    assert_eq!(err.from, AutosaveState::Idle);
    assert!(AutosaveState::Terminated.on_event(AutosaveEvent::Arm).is_err());
}
