//! Strictly increasing log timestamps.
//!
//! `(user_id, timestamp)` keys the message log, so two rows written within
//! one clock tick must not collide. The clock folds a monotonic bump into the
//! timestamp itself: each call returns max(now, last + 1ns), so values are
//! unique and non-decreasing per process, and the fixed-width RFC 3339
//! rendering sorts lexicographically in chronological order.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Default)]
pub struct LogClock {
    last_nanos: AtomicI64,
}

impl LogClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unique instant, strictly greater than every previous return.
    pub fn next(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros().saturating_mul(1000);
        let mut prev = self.last_nanos.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self.last_nanos.compare_exchange_weak(
                prev,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return DateTime::from_timestamp_nanos(candidate),
                Err(observed) => prev = observed,
            }
        }
    }

    /// [`LogClock::next`] rendered as the log's sort key.
    pub fn next_timestamp(&self) -> String {
        format_timestamp(self.next())
    }
}

/// Fixed-width RFC 3339 with nanoseconds, e.g.
/// `2025-01-01T00:00:00.000000001Z`.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
