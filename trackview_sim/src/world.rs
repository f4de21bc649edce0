//! SimWorld - the fixed-rate frame loop around a Simulation.

use crate::context::ManualClock;
use std::time::Duration;
use trackview_core::{Simulation, TickOutcome};
use trackview_env::SimClock;

/// A simulation driven at a fixed tick rate on virtual time.
pub struct SimWorld {
    /// The simulation under test
    pub sim: Simulation,

    /// Virtual clock (shared with nothing else unless cloned)
    pub clock: ManualClock,

    /// Tick rate in Hz
    tick_rate_hz: u32,

    /// Current tick count
    tick_count: u64,
}

impl SimWorld {
    /// Wraps `sim` at `tick_rate_hz` (raised to at least 1).
    pub fn new(sim: Simulation, tick_rate_hz: u32) -> Self {
        Self {
            sim,
            clock: ManualClock::new(),
            tick_rate_hz: tick_rate_hz.max(1),
            tick_count: 0,
        }
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }

    /// Starts playback at the current virtual time.
    pub fn start(&mut self) {
        let now = self.time();
        self.sim.start(now);
    }

    /// Advances virtual time by one tick, then the simulation.
    pub fn tick(&mut self) -> TickOutcome {
        self.clock.advance_time(Duration::from_secs_f64(self.dt()));
        self.tick_count += 1;
        self.sim.step(&self.clock)
    }

    /// Returns the current simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.clock.now_secs()
    }

    /// Returns the current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }
}
