use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

/// Source of Unix-epoch-second timestamps.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self(AtomicI64::new(start))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// The timestamp for a mutation of a record last touched at `previous`.
/// Never earlier than `previous`, so `UpdatedAt` cannot go backwards.
pub(crate) fn stamp(clock: &dyn Clock, previous: i64) -> i64 {
    clock.now().max(previous)
}
