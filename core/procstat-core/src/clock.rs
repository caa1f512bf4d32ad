//! Wall-clock access for the sampler.

use chrono::Utc;
use std::thread;
use std::time::Duration;

/// Source of sample timestamps and inter-tick sleeps.
///
/// Timestamps are milliseconds since the Unix epoch. Only differences between
/// timestamps of one run are meaningful.
pub trait Clock {
    fn now_millis(&self) -> i64;

    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
