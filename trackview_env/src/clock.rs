//! Core clock trait for TrackView hosts.

use std::time::Duration;

/// The central interface for reading time.
///
/// # Implementations
///
/// - **Production**: `WallClock` - wraps `std::time::Instant`
/// - **Simulation**: `ManualClock` (in `trackview_sim`) - a virtual clock
///   that only moves when the harness advances it
///
/// # Determinism
///
/// The playback engine is a pure function of the sequence of `now` values it
/// is fed. Any clock that returns the same sequence yields the same agent
/// pose sequence, bit for bit.
pub trait SimClock {
    /// Returns the monotonic time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Returns [`SimClock::now`] as fractional seconds.
    ///
    /// This is the unit the playback engine works in.
    fn now_secs(&self) -> f64 {
        self.now().as_secs_f64()
    }
}

impl<C: SimClock + ?Sized> SimClock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}
