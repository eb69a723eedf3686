// crates/savepoint-core/src/core/time.rs
// ============================================================================
// Module: Savepoint Time Model
// Description: Canonical timestamp representation for records and policy gates.
// Purpose: Keep elapsed-time decisions testable by passing `now` explicitly.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Savepoint stamps every record with unix-epoch milliseconds. The policy
//! engine never reads wall-clock time itself; callers supply `now` so the
//! debounce and minimum-play-time boundaries are deterministic under test.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Unix-epoch timestamp in milliseconds.
///
/// # Invariants
/// - Values are non-negative in practice; arithmetic saturates rather than
///   wrapping so a skewed clock never panics the save path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix-epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
    }

    /// Returns the raw unix-epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the elapsed duration since `earlier`, or zero if `earlier` is
    /// in the future.
    #[must_use]
    pub fn saturating_since(self, earlier: Self) -> Duration {
        let delta = self.0.saturating_sub(earlier.0);
        u64::try_from(delta).map_or(Duration::ZERO, Duration::from_millis)
    }

    /// Returns this timestamp advanced by `duration`, saturating on overflow.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
