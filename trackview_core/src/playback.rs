//! The playback engine: moves the agent along a path as time advances.
//!
//! # State machine
//!
//! ```text
//!            start(now)                 tick: past final timestamp, !looping
//!  Stopped ─────────────► Playing ───────────────────────────────► Stopped
//!     ▲                    │   ▲
//!     │  stop() / reset()  │   │ tick: past final timestamp, looping
//!     └────────────────────┘   └── reset() + start(now) (trail cleared)
//! ```
//!
//! The engine never owns the path. Every operation borrows it, so the same
//! immutable path is shared with the boundary generator and the renderer.

use crate::error::ConfigError;
use crate::math::{forward_from_yaw, mix, shortest_delta, smoothstep, wrap_degrees, yaw_from_direction};
use crate::path::Path;
use crate::trail::TrailBuffer;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Look-ahead blending starts at this fraction of a segment.
const LOOKAHEAD_START: f64 = 0.3;

/// Maximum weight given to the next segment's direction.
const LOOKAHEAD_WEIGHT: f64 = 0.3;

/// Yaw smoothing rate for turns sharper than 45°.
const SMOOTH_RATE_SHARP: f64 = 0.12;

/// Yaw smoothing rate for corrections under 10°.
const SMOOTH_RATE_FINE: f64 = 0.05;

const SMOOTH_RATE_DEFAULT: f64 = 0.08;

/// Pose of the simulated vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Vector3<f64>,

    /// Heading in degrees, wrapped to [-180, 180]
    pub yaw: f64,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            yaw: 0.0,
        }
    }
}

/// Playback lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Timing state of a playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackClock {
    pub state: PlaybackState,

    /// Restart at the first waypoint after the last one
    pub looping: bool,

    /// Multiplier applied to wall time since `start_time`
    pub speed: f64,

    /// Host time at which the current lap started (seconds)
    pub start_time: f64,

    /// Index of the segment start the agent is on
    pub current_index: usize,
}

impl PlaybackClock {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Path time corresponding to host time `now`.
    pub fn elapsed(&self, now: f64) -> f64 {
        (now - self.start_time) * self.speed
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            state: PlaybackState::Stopped,
            looping: false,
            speed: 1.0,
            start_time: 0.0,
            current_index: 0,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not playing, or nothing to play
    Idle,

    /// Agent moved along segment `index`
    Advanced { index: usize, progress: f64 },

    /// Lap finished with looping on; playback restarted at the first point
    LapRestarted,

    /// Lap finished with looping off; playback stopped
    Finished,
}

/// Drives the agent along a path and records its trail.
#[derive(Debug, Clone, Default)]
pub struct PlaybackEngine {
    clock: PlaybackClock,
    agent: AgentState,
    trail: TrailBuffer,

    /// Laps completed since creation
    laps: u64,
}

impl PlaybackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given speed and looping mode.
    pub fn with_settings(speed: f64, looping: bool) -> Result<Self, ConfigError> {
        let mut engine = Self::new();
        engine.set_speed(speed)?;
        engine.set_looping(looping);
        Ok(engine)
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn agent(&self) -> &AgentState {
        &self.agent
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    pub fn laps(&self) -> u64 {
        self.laps
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Sets the speed multiplier. Rejected values leave the speed unchanged.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        self.clock.speed = ConfigError::positive(speed, ConfigError::InvalidSpeed)?;
        Ok(())
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.clock.looping = looping;
    }

    /// Begins (or restarts) playback from the first waypoint at host time
    /// `now`. No-op on an empty path.
    pub fn start(&mut self, path: &Path, now: f64) {
        let Some(first) = path.first() else {
            return;
        };

        self.clock.state = PlaybackState::Playing;
        self.clock.start_time = now;
        self.clock.current_index = 0;
        self.agent = AgentState {
            position: first.position,
            yaw: wrap_degrees(first.yaw),
        };
        info!(now, speed = self.clock.speed, looping = self.clock.looping, "playback started");
    }

    /// Pauses playback, leaving the agent where it is.
    pub fn stop(&mut self) {
        if self.clock.is_playing() {
            self.clock.state = PlaybackState::Stopped;
            info!(index = self.clock.current_index, "playback stopped");
        }
    }

    /// Stops playback, rewinds to the first waypoint and clears the trail.
    pub fn reset(&mut self, path: &Path) {
        self.clock.state = PlaybackState::Stopped;
        self.clock.current_index = 0;
        self.trail.clear();
        if let Some(first) = path.first() {
            self.agent = AgentState {
                position: first.position,
                yaw: wrap_degrees(first.yaw),
            };
        }
        debug!("playback reset");
    }

    /// Advances playback to host time `now`.
    ///
    /// Call [`PlaybackEngine::reset`] after swapping in a different path. A
    /// segment index that no longer fits `path` is rewound to the start.
    pub fn tick(&mut self, path: &Path, now: f64) -> TickOutcome {
        if !self.clock.is_playing() || !path.is_playable() {
            return TickOutcome::Idle;
        }

        let points = path.points();
        let last = points.len() - 1;
        let elapsed = self.clock.elapsed(now);

        let mut index = if self.clock.current_index < last {
            self.clock.current_index
        } else {
            0
        };
        while index < last && elapsed > points[index + 1].timestamp {
            index += 1;
        }
        self.clock.current_index = index;

        if index == last {
            self.laps += 1;
            if self.clock.looping {
                info!(lap = self.laps, "lap complete, looping");
                self.reset(path);
                self.start(path, now);
                return TickOutcome::LapRestarted;
            }
            info!(lap = self.laps, "lap complete");
            self.stop();
            return TickOutcome::Finished;
        }

        let p0 = &points[index];
        let p1 = &points[index + 1];
        let duration = p1.timestamp - p0.timestamp;
        let progress = if duration > 0.0 {
            ((elapsed - p0.timestamp) / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        self.agent.position = p0.position.lerp(&p1.position, progress);

        let d0 = p1.position - p0.position;
        let heading = match points.get(index + 2) {
            Some(p2) => {
                let d1 = p2.position - p1.position;
                let w = smoothstep(LOOKAHEAD_START, 1.0, progress) * LOOKAHEAD_WEIGHT;
                mix(&d0, &d1, w)
            }
            None => d0,
        };
        let target_yaw = yaw_from_direction(&heading).unwrap_or(self.agent.yaw);
        self.agent.yaw = smooth_yaw(self.agent.yaw, target_yaw);

        self.trail.record(self.agent.position);

        TickOutcome::Advanced { index, progress }
    }

    /// Moves the agent `distance` along its heading. Only while stopped.
    pub fn nudge_forward(&mut self, distance: f64) -> bool {
        if self.clock.is_playing() {
            return false;
        }
        self.agent.position += forward_from_yaw(self.agent.yaw) * distance;
        self.trail.record(self.agent.position);
        true
    }

    /// Rotates the agent by `degrees` (positive turns towards +X from +Z).
    /// Only while stopped.
    pub fn nudge_turn(&mut self, degrees: f64) -> bool {
        if self.clock.is_playing() {
            return false;
        }
        self.agent.yaw = wrap_degrees(self.agent.yaw + degrees);
        self.trail.record(self.agent.position);
        true
    }

    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }
}

/// Eases `current` towards `target` along the shortest arc.
///
/// Large errors close quickly so sharp corners do not lag; small ones close
/// slowly so near-straight segments do not jitter.
fn smooth_yaw(current: f64, target: f64) -> f64 {
    let delta = shortest_delta(current, target);
    let rate = if delta.abs() > 45.0 {
        SMOOTH_RATE_SHARP
    } else if delta.abs() < 10.0 {
        SMOOTH_RATE_FINE
    } else {
        SMOOTH_RATE_DEFAULT
    };
    wrap_degrees(current + delta * rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::compute_yaw;
    use crate::path::{CircleGenerator, PathGenerator, PathPoint};
    use approx::assert_relative_eq;

    fn four_point_path() -> Path {
        compute_yaw(CircleGenerator.generate(4, 10.0, 4.0))
    }

    fn straight_path(n: usize) -> Path {
        compute_yaw(Path::new(
            (0..n)
                .map(|i| PathPoint::new(Vector3::new(0.0, 0.0, i as f64), i as f64))
                .collect(),
        ))
    }

    #[test]
    fn test_engine_created_stopped() {
        let engine = PlaybackEngine::new();
        assert!(!engine.is_playing());
        assert_eq!(engine.clock().current_index, 0);
        assert!(engine.trail().is_empty());
    }

    #[test]
    fn test_start_snaps_to_first_point() {
        let path = four_point_path();
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 5.0);

        assert!(engine.is_playing());
        assert_eq!(engine.clock().start_time, 5.0);
        assert_eq!(engine.agent().position, path.points()[0].position);
        assert_relative_eq!(engine.agent().yaw, wrap_degrees(path.points()[0].yaw));
    }

    #[test]
    fn test_start_on_empty_path_is_noop() {
        let mut engine = PlaybackEngine::new();
        engine.start(&Path::empty(), 0.0);
        assert!(!engine.is_playing());
        assert_eq!(engine.tick(&Path::empty(), 1.0), TickOutcome::Idle);
    }

    #[test]
    fn test_tick_on_segment_boundary() {
        let path = four_point_path();
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 0.0);

        let outcome = engine.tick(&path, 1.0);
        match outcome {
            TickOutcome::Advanced { index, progress } => {
                assert_eq!(index, 0);
                assert_relative_eq!(progress, 1.0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_relative_eq!(engine.agent().position, path.points()[1].position, epsilon = 1e-9);
    }

    #[test]
    fn test_tick_interpolates_midpoint() {
        let path = straight_path(5);
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 10.0);

        engine.tick(&path, 12.5);
        assert_eq!(engine.clock().current_index, 2);
        assert_relative_eq!(engine.agent().position.z, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_speed_scales_elapsed() {
        let path = straight_path(10);
        let mut engine = PlaybackEngine::with_settings(2.0, false).unwrap();
        engine.start(&path, 0.0);
        engine.tick(&path, 1.25);
        assert_relative_eq!(engine.agent().position.z, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_speed() {
        let mut engine = PlaybackEngine::new();
        assert!(engine.set_speed(0.0).is_err());
        assert!(engine.set_speed(-2.0).is_err());
        assert_eq!(engine.clock().speed, 1.0);
        assert!(PlaybackEngine::with_settings(f64::NAN, true).is_err());
    }

    #[test]
    fn test_finish_without_loop_stops() {
        let path = four_point_path();
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 0.0);
        engine.tick(&path, 2.5);
        let pose = *engine.agent();

        assert_eq!(engine.tick(&path, 3.5), TickOutcome::Finished);
        assert!(!engine.is_playing());
        assert_eq!(*engine.agent(), pose);
        assert_eq!(engine.laps(), 1);
        assert_eq!(engine.tick(&path, 4.0), TickOutcome::Idle);
    }

    #[test]
    fn test_loop_reanchors_start_time() {
        let path = four_point_path();
        let mut engine = PlaybackEngine::with_settings(1.0, true).unwrap();
        engine.start(&path, 0.0);
        engine.tick(&path, 2.0);
        assert!(!engine.trail().is_empty());

        assert_eq!(engine.tick(&path, 3.2), TickOutcome::LapRestarted);
        assert!(engine.is_playing());
        assert_eq!(engine.clock().current_index, 0);
        assert_eq!(engine.clock().start_time, 3.2);
        assert!(engine.trail().is_empty());
        assert_relative_eq!(engine.clock().elapsed(3.2), 0.0);

        match engine.tick(&path, 3.2) {
            TickOutcome::Advanced { index, progress } => {
                assert_eq!(index, 0);
                assert_relative_eq!(progress, 0.0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_stop_keeps_pose() {
        let path = straight_path(5);
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 0.0);
        engine.tick(&path, 1.5);
        let pose = *engine.agent();

        engine.stop();
        assert!(!engine.is_playing());
        assert_eq!(engine.tick(&path, 3.0), TickOutcome::Idle);
        assert_eq!(*engine.agent(), pose);
    }

    #[test]
    fn test_reset_while_playing() {
        let path = four_point_path();
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 0.0);
        engine.tick(&path, 0.5);
        engine.tick(&path, 1.5);
        assert!(engine.trail().len() > 0);

        engine.reset(&path);
        assert!(!engine.is_playing());
        assert_eq!(engine.trail().len(), 0);
        assert_eq!(engine.clock().current_index, 0);
        assert_eq!(engine.agent().position, path.points()[0].position);
    }

    #[test]
    fn test_yaw_eases_towards_target() {
        // Path turns 90 degrees at point 1
        let path = Path::new(vec![
            PathPoint::new(Vector3::new(0.0, 0.0, 0.0), 0.0),
            PathPoint::new(Vector3::new(0.0, 0.0, 10.0), 1.0),
            PathPoint::new(Vector3::new(10.0, 0.0, 10.0), 2.0),
            PathPoint::new(Vector3::new(10.0, 0.0, 20.0), 3.0),
        ]);
        let path = compute_yaw(path);
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 0.0);
        assert_relative_eq!(engine.agent().yaw, 0.0);

        // Early in segment 0 there is no look-ahead and the heading is on target
        engine.tick(&path, 0.1);
        assert_relative_eq!(engine.agent().yaw, 0.0);

        // Late in segment 0 the look-ahead pulls the target towards +X
        engine.tick(&path, 0.99);
        let yaw = engine.agent().yaw;
        assert!(yaw > 0.0 && yaw < 16.7);

        // Segment 1 targets 90 degrees; one tick closes 12% of the gap
        engine.tick(&path, 1.01);
        let expected = yaw + (90.0 - yaw) * SMOOTH_RATE_SHARP;
        assert!(engine.agent().yaw > yaw);
        assert!(engine.agent().yaw <= expected + 1e-9);
    }

    #[test]
    fn test_degenerate_segment_keeps_yaw() {
        // Segment 0 has zero length; only the look-ahead can give a heading
        let path = Path::new(vec![
            PathPoint::new(Vector3::new(0.0, 0.0, 0.0), 0.0),
            PathPoint::new(Vector3::new(0.0, 0.0, 0.0), 1.0),
            PathPoint::new(Vector3::new(5.0, 0.0, 0.0), 2.0),
            PathPoint::new(Vector3::new(5.0, 0.0, 5.0), 3.0),
        ]);
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 0.0);

        engine.tick(&path, 0.2);
        assert_eq!(engine.agent().yaw, 0.0);

        // Look-ahead weight is non-zero past 0.3, pulling towards +X
        engine.tick(&path, 0.95);
        assert_relative_eq!(engine.agent().yaw, 90.0 * SMOOTH_RATE_SHARP, epsilon = 1e-9);
    }

    #[test]
    fn test_last_segment_uses_d0() {
        let path = Path::new(vec![
            PathPoint::new(Vector3::new(0.0, 0.0, 0.0), 0.0),
            PathPoint::new(Vector3::new(0.0, 0.0, 10.0), 1.0),
            PathPoint::new(Vector3::new(10.0, 0.0, 10.0), 2.0),
        ]);
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 0.0);

        // Late in the final segment the target stays on the segment (+X)
        match engine.tick(&path, 1.9) {
            TickOutcome::Advanced { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_relative_eq!(engine.agent().yaw, 90.0 * SMOOTH_RATE_SHARP, epsilon = 1e-9);
    }

    #[test]
    fn test_stale_index_rewinds_on_shorter_path() {
        let long = straight_path(10);
        let mut engine = PlaybackEngine::new();
        engine.start(&long, 0.0);
        engine.tick(&long, 7.5);
        assert_eq!(engine.clock().current_index, 7);

        let short = Path::new(vec![
            PathPoint::new(Vector3::new(0.0, 0.0, 0.0), 0.0),
            PathPoint::new(Vector3::new(0.0, 0.0, 50.0), 50.0),
            PathPoint::new(Vector3::new(0.0, 0.0, 100.0), 100.0),
        ]);
        match engine.tick(&short, 7.6) {
            TickOutcome::Advanced { index, .. } => assert_eq!(index, 0),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(engine.is_playing());
        assert_relative_eq!(engine.agent().position.z, 7.6, epsilon = 1e-9);
    }

    #[test]
    fn test_smooth_yaw_rates() {
        assert_relative_eq!(smooth_yaw(0.0, 90.0), 90.0 * SMOOTH_RATE_SHARP, epsilon = 1e-12);
        assert_relative_eq!(smooth_yaw(0.0, 20.0), 20.0 * SMOOTH_RATE_DEFAULT, epsilon = 1e-12);
        assert_relative_eq!(smooth_yaw(0.0, 5.0), 5.0 * SMOOTH_RATE_FINE, epsilon = 1e-12);
        // Crosses the seam the short way
        assert_relative_eq!(smooth_yaw(175.0, -175.0), 175.0 + 10.0 * SMOOTH_RATE_DEFAULT, epsilon = 1e-9);
        assert_relative_eq!(smooth_yaw(179.0, -171.0), wrap_degrees(179.0 + 10.0 * SMOOTH_RATE_DEFAULT), epsilon = 1e-9);
    }

    #[test]
    fn test_trail_gated_during_playback() {
        let path = straight_path(3);
        let mut engine = PlaybackEngine::new();
        engine.start(&path, 0.0);
        engine.tick(&path, 0.0);
        engine.tick(&path, 0.01);
        engine.tick(&path, 0.2);
        assert_eq!(engine.trail().len(), 2);
    }

    #[test]
    fn test_nudges_only_when_stopped() {
        let path = straight_path(3);
        let mut engine = PlaybackEngine::new();
        engine.reset(&path);

        assert!(engine.nudge_forward(0.1));
        assert_relative_eq!(engine.agent().position.z, 0.1, epsilon = 1e-12);
        assert_eq!(engine.trail().len(), 1);

        assert!(engine.nudge_turn(5.0));
        assert_relative_eq!(engine.agent().yaw, 5.0, epsilon = 1e-12);

        engine.start(&path, 0.0);
        assert!(!engine.nudge_forward(0.1));
        assert!(!engine.nudge_turn(-5.0));
    }
}
