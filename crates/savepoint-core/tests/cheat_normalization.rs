// crates/savepoint-core/tests/cheat_normalization.rs
// ============================================================================
// Module: Cheat Normalization Tests
// Description: Unit and property tests for cheat-code normalization.
// Purpose: Validate the canonical wire form and the idempotency property.
// ============================================================================

//! Tests for [`savepoint_core::normalize_cheat_code`].

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

use proptest::prelude::*;
use savepoint_core::normalize_cheat_code;

#[test]
fn whitespace_becomes_single_separator() {
    assert_eq!(normalize_cheat_code("ABCD-1234 EFGH-5678"), "ABCD-1234+EFGH-5678");
    assert_eq!(normalize_cheat_code("ABCD\t \nEFGH"), "ABCD+EFGH");
}

#[test]
fn invalid_characters_are_dropped() {
    assert_eq!(normalize_cheat_code("AB!CD_12@34"), "ABCD1234");
    assert_eq!(normalize_cheat_code("01:23-45"), "01:23-45");
}

#[test]
fn separator_runs_collapse() {
    assert_eq!(normalize_cheat_code("++AAAA++++BBBB++"), "AAAA+BBBB");
    assert_eq!(normalize_cheat_code("+ + +AAAA+ "), "AAAA");
}

#[test]
fn empty_and_junk_only_inputs_normalize_to_empty() {
    assert_eq!(normalize_cheat_code(""), "");
    assert_eq!(normalize_cheat_code("  ++ !! "), "");
}

#[test]
fn already_normalized_input_is_unchanged() {
    let code = "AAAA-BBBB+CCCC:01";
    assert_eq!(normalize_cheat_code(code), code);
}

proptest! {
    #[test]
    fn normalization_is_idempotent(input in ".*") {
        let once = normalize_cheat_code(&input);
        let twice = normalize_cheat_code(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn output_charset_is_restricted(input in ".*") {
        let normalized = normalize_cheat_code(&input);
        prop_assert!(
            normalized.chars().all(|ch| ch.is_ascii_alphanumeric()
                || ch == '-'
                || ch == ':'
                || ch == '+')
        );
        prop_assert!(!normalized.starts_with('+'));
        prop_assert!(!normalized.ends_with('+'));
        prop_assert!(!normalized.contains("++"));
    }
}
