//! Wall-clock source.
//!
//! Replies embed the current date and envelopes carry a creation time, so
//! everything time-dependent reads through a [`Clock`] that tests can pin.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local};

/// Source of the current local time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Unix seconds, as carried in `ReplyEnvelope::created`.
    fn unix_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Parse an RFC 3339 timestamp, e.g. `"2024-03-05T12:00:00+00:00"`.
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
