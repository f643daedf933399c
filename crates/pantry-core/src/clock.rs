//! Time source for store-assigned timestamps.
//!
//! Instants are kept at microsecond precision, the resolution `PostgreSQL`
//! stores, so a timestamp reads back exactly as it was written.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// Abstraction over system time so stores can be driven deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        truncate_to_micros(Utc::now())
    }
}

/// Drops any sub-microsecond part of `instant`.
#[must_use]
pub fn truncate_to_micros(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(TimeDelta::microseconds(1))
        .unwrap_or(instant)
}
