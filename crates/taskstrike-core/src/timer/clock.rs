//! Wall-clock and sleep abstraction.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Time source for the countdown loop. Lets tests drive the loop without
/// real sleeps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, dur: Duration);
}

/// Real wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}
