// crates/savepoint-session/tests/autosave_driver.rs
// ============================================================================
// Module: Autosave Driver Tests
// Description: Timer lifecycle, suspension semantics, and the fault guard.
// Purpose: Validate that suspension cancels the timer and saves fire once.
// ============================================================================

//! Integration tests for [`savepoint_session::AutosaveDriver`] and
//! [`savepoint_session::FaultGuard`].

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

use std::panic;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use savepoint_core::AutosaveState;
use savepoint_core::SaveStateCatalog;
use savepoint_session::AutosaveDriver;
use savepoint_session::FaultGuard;

use common::fixture;

/// Timer interval short enough for the tests to observe several ticks.
const TICK: Duration = Duration::from_millis(40);

#[test]
fn armed_timer_fires_one_debounced_autosave() {
    let fx = fixture();
    let mut driver = AutosaveDriver::new(Arc::clone(&fx.coordinator), TICK);
    driver.arm().unwrap();
    assert_eq!(driver.state(), AutosaveState::Armed);

    // Several intervals elapse; the debounce gate holds after the first.
    thread::sleep(TICK * 6);
    driver.suspend().unwrap();
    assert_eq!(driver.state(), AutosaveState::Suspended);

    let records = fx.catalog.list_save_states(&fx.game_id).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_autosave);
}

#[test]
fn suspension_cancels_without_a_catchup_fire() {
    let fx = fixture();
    let mut driver = AutosaveDriver::new(Arc::clone(&fx.coordinator), TICK * 4);
    driver.arm().unwrap();
    driver.suspend().unwrap();

    // The interval that was pending at suspension never fires.
    thread::sleep(TICK * 8);
    assert!(fx.catalog.list_save_states(&fx.game_id).unwrap().is_empty());

    driver.resume().unwrap();
    assert_eq!(driver.state(), AutosaveState::Armed);
    driver.shutdown();
    assert_eq!(driver.state(), AutosaveState::Terminated);
}

#[test]
fn arming_twice_is_an_invalid_transition() {
    let fx = fixture();
    let mut driver = AutosaveDriver::new(Arc::clone(&fx.coordinator), Duration::from_secs(600));
    driver.arm().unwrap();
    let err = driver.arm().unwrap_err();
    assert_eq!(err.from, AutosaveState::Armed);
}

#[test]
fn resume_requires_a_prior_suspension() {
    let fx = fixture();
    let mut driver = AutosaveDriver::new(Arc::clone(&fx.coordinator), Duration::from_secs(600));
    assert!(driver.resume().is_err());
    driver.arm().unwrap();
    assert!(driver.resume().is_err());
}

#[test]
fn shutdown_is_legal_from_every_state() {
    let fx = fixture();
    let mut idle = AutosaveDriver::new(Arc::clone(&fx.coordinator), Duration::from_secs(600));
    idle.shutdown();
    assert_eq!(idle.state(), AutosaveState::Terminated);

    let mut armed = AutosaveDriver::new(Arc::clone(&fx.coordinator), Duration::from_secs(600));
    armed.arm().unwrap();
    armed.shutdown();
    assert_eq!(armed.state(), AutosaveState::Terminated);
}

#[test]
fn fault_guard_saves_once_and_restores_the_hook() {
    let fx = fixture();
    let guard = FaultGuard::install(&fx.coordinator);

    let outcome = panic::catch_unwind(|| panic!("scripted fault"));
    assert!(outcome.is_err());
    assert_eq!(fx.catalog.list_save_states(&fx.game_id).unwrap().len(), 1);

    // The emergency path fires at most once per guard.
    let outcome = panic::catch_unwind(|| panic!("second fault"));
    assert!(outcome.is_err());
    assert_eq!(fx.catalog.list_save_states(&fx.game_id).unwrap().len(), 1);

    drop(guard);
    let outcome = panic::catch_unwind(|| panic!("after disarm"));
    assert!(outcome.is_err());
    assert_eq!(fx.catalog.list_save_states(&fx.game_id).unwrap().len(), 1);
}
