//! Production implementation of SimClock using the system monotonic clock.

use crate::SimClock;
use std::time::{Duration, Instant};

/// Production clock backed by `Instant`.
///
/// This is the "real" implementation used by interactive hosts.
/// Time starts at zero when the clock is created.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl WallClock {
    /// Creates a new WallClock starting at zero.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Restarts the clock at zero.
    pub fn restart(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock for WallClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}
