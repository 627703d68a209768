use crate::app::time::now_millis;
use std::fmt;

/// Wall-clock source for power-up timers and session elapsed time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

#[cfg(test)]
pub use manual::ManualClock;
