//! Virtual clock implementing SimClock for deterministic runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trackview_env::SimClock;

/// Simulation clock backed by a manually advanced counter.
///
/// Time only moves when the harness calls [`ManualClock::advance_time`], so
/// a run is a pure function of its tick sequence. Clones share the same
/// counter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Sets the virtual time to a specific value.
    pub fn set_time(&self, time_ns: u64) {
        self.virtual_time_ns.store(time_ns, Ordering::SeqCst);
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        self.virtual_time_ns.load(Ordering::SeqCst)
    }
}

impl SimClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }
}
