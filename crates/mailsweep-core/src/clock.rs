//! Wall-clock abstraction for testability.
//!
//! Age criteria are relative to "now", so the planner takes its time from a
//! `Clock` rather than calling `Utc::now()` directly. Production code uses
//! [`SystemClock`]; tests use [`FixedClock`] to pin the reference instant.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Abstraction over the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock that uses real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a chosen instant, advanceable for tests.
#[derive(Debug)]
pub struct FixedClock {
    base: DateTime<Utc>,
    offset_secs: AtomicI64,
}

impl FixedClock {
    /// Creates a clock pinned at the given instant.
    #[must_use]
    pub const fn at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            offset_secs: AtomicI64::new(0),
        }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        self.offset_secs
            .fetch_add(duration.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + Duration::seconds(self.offset_secs.load(Ordering::SeqCst))
    }
}
