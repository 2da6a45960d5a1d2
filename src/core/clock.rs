//! Arrival stamps for inbound packets.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use crate::queue::Timestamp;

/// Wall-clock source whose stamps never repeat or go backwards.
///
/// Each stamp is `max(now, previous + 1µs)`, so two packets received within
/// the same clock tick (or across a clock step back) still order correctly.
#[derive(Debug, Default)]
pub struct StampClock {
    last_us: AtomicU64,
}

impl StampClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next stamp.
    pub fn now(&self) -> Timestamp {
        let wall = Timestamp::from_system(SystemTime::now()).as_micros();
        let mut prev = self.last_us.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev.saturating_add(1));
            match self
                .last_us
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return Timestamp::from_micros(next),
                Err(actual) => prev = actual,
            }
        }
    }
}
