//! Time utilities for respited
//!
//! Provides monotonic time (for measuring tick intervals) and helpers for
//! the signed `chrono::TimeDelta` used by the work countdown, which is
//! allowed to run below zero.

use chrono::{DateTime, Local, TimeDelta};
use std::time::{Duration, Instant};

/// Get the current local time, for display and event stamps only.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Represents a point in monotonic time.
/// This is immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    /// Duration since `earlier`, or zero if `earlier` is actually later.
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

/// Convert a non-negative duration into a signed one, saturating at
/// `TimeDelta::MAX` instead of failing.
pub fn to_signed(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// Format a signed duration as `[-]MM:SS` (minutes may exceed 59).
pub fn format_countdown(delta: TimeDelta) -> String {
    let secs = delta.num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let abs = secs.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}
