// crates/savepoint-core/src/core/cheats.rs
// ============================================================================
// Module: Savepoint Cheat Normalization
// Description: Canonical cheat-code normalization applied before core dispatch.
// Purpose: Guarantee a single stable wire form for any user-entered code.
// Dependencies: none
// ============================================================================

//! ## Overview
//! User-entered cheat codes arrive with arbitrary whitespace, separators,
//! and stray punctuation. Normalization scrubs the input to the
//! alphanumeric/hyphen/colon/plus charset and collapses separator runs to a
//! single `+`, producing the form handed to the emulation core and persisted
//! in the catalog.
//!
//! Normalization is pure and idempotent: applying it to its own output is a
//! no-op. The property test in `tests/cheat_normalization.rs` holds this
//! invariant over arbitrary input.

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Returns true for characters allowed inside a normalized code segment.
const fn is_code_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == ':'
}

/// Normalizes a cheat code to the canonical `+`-separated form.
///
/// Whitespace acts as a segment separator; characters outside
/// `[A-Za-z0-9:+-]` are dropped; empty segments (leading, trailing, or
/// produced by duplicate separators) are removed.
#[must_use]
pub fn normalize_cheat_code(raw: &str) -> String {
    let scrubbed: String = raw
        .chars()
        .map(|ch| if ch.is_whitespace() { '+' } else { ch })
        .filter(|ch| *ch == '+' || is_code_char(*ch))
        .collect();
    let segments: Vec<&str> = scrubbed.split('+').filter(|segment| !segment.is_empty()).collect();
    segments.join("+")
}
