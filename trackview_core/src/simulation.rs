//! The `Simulation` facade: the one object the host loop, the control panel
//! and the renderer talk to.
//!
//! # Frame order
//!
//! ```text
//! host loop ──► advance(now) ──► PlaybackEngine::tick ──► CameraRig::update
//!                                                              │
//! renderer  ◄──────────────── snapshot() ◄────────────────────┘
//! ```
//!
//! All state is owned here and mutated only through `&mut self`, one call
//! at a time. Static geometry (path, rails, grid) is rebuilt synchronously
//! inside the mutator that invalidates it.

use crate::boundary::BoundaryCurves;
use crate::camera::{CameraFollowController, CameraPose, CameraRig};
use crate::config::SimConfig;
use crate::error::ConfigError;
use crate::orientation::compute_yaw;
use crate::path::{CircleGenerator, Path, PathGenerator};
use crate::playback::{AgentState, PlaybackClock, PlaybackEngine, TickOutcome};
use crate::scene::build_grid;
use crate::snapshot::FrameSnapshot;
use crate::trail::TrailBuffer;
use nalgebra::Vector3;
use trackview_env::SimClock;
use tracing::{info, warn};

/// A single-agent path playback session.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    path: Path,
    boundaries: BoundaryCurves,
    left_vertices: Vec<f32>,
    right_vertices: Vec<f32>,
    grid: Vec<f32>,
    playback: PlaybackEngine,
    camera: CameraRig,
    show_path: bool,
    show_boundaries: bool,
}

impl Simulation {
    /// Creates a session on the seed circle.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_generator(config, &CircleGenerator)
    }

    /// Creates a session on a path from `generator`.
    pub fn with_generator(config: SimConfig, generator: &dyn PathGenerator) -> Result<Self, ConfigError> {
        config.validate()?;
        let path = build_path(generator, &config)?;
        Ok(Self::assemble(config, path))
    }

    /// Builds the session from an already validated config and path.
    fn assemble(config: SimConfig, path: Path) -> Self {
        let controller = CameraFollowController {
            distance: config.follow_distance,
            height: config.follow_height,
        };
        let [cx, cy, cz] = config.manual_camera;
        let camera = CameraRig::new(Vector3::new(cx, cy, cz), controller);

        let mut playback = PlaybackEngine::new();
        playback.set_looping(config.looping);
        if let Err(e) = playback.set_speed(config.speed) {
            warn!("keeping default speed: {}", e);
        }
        playback.reset(&path);

        let grid = build_grid(config.grid_size);

        let mut sim = Self {
            config,
            path,
            boundaries: BoundaryCurves::default(),
            left_vertices: Vec::new(),
            right_vertices: Vec::new(),
            grid,
            playback,
            camera,
            show_path: true,
            show_boundaries: true,
        };
        sim.rebuild_boundaries();
        info!(
            points = sim.path.len(),
            radius = sim.config.radius,
            duration = sim.config.total_duration,
            "simulation ready"
        );
        sim
    }

    // ─── Queries ────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn boundaries(&self) -> &BoundaryCurves {
        &self.boundaries
    }

    pub fn agent(&self) -> &AgentState {
        self.playback.agent()
    }

    pub fn clock(&self) -> &PlaybackClock {
        self.playback.clock()
    }

    pub fn trail(&self) -> &TrailBuffer {
        self.playback.trail()
    }

    pub fn laps(&self) -> u64 {
        self.playback.laps()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn is_following(&self) -> bool {
        self.camera.is_following()
    }

    pub fn camera_pose(&self) -> &CameraPose {
        self.camera.pose()
    }

    pub fn show_path(&self) -> bool {
        self.show_path
    }

    pub fn show_boundaries(&self) -> bool {
        self.show_boundaries
    }

    // ─── Frame step ─────────────────────────────────────────────────────

    /// Advances playback to host time `now`, then refreshes the follow
    /// camera. Call exactly once per frame, before [`Simulation::snapshot`].
    pub fn advance(&mut self, now: f64) -> TickOutcome {
        let outcome = self.playback.tick(&self.path, now);
        self.camera.update(self.playback.agent());
        outcome
    }

    /// [`Simulation::advance`] with the time read from `clock`.
    pub fn step<C: SimClock>(&mut self, clock: &C) -> TickOutcome {
        self.advance(clock.now_secs())
    }

    /// Read-only view for the renderer.
    pub fn snapshot(&self) -> FrameSnapshot<'_> {
        let (left, right) = if self.show_boundaries {
            (self.left_vertices.as_slice(), self.right_vertices.as_slice())
        } else {
            (&[][..], &[][..])
        };
        FrameSnapshot {
            grid: &self.grid,
            trail: if self.show_path {
                self.playback.trail().vertices()
            } else {
                Vec::new()
            },
            left_boundary: left,
            right_boundary: right,
            agent: *self.playback.agent(),
            camera: *self.camera.pose(),
        }
    }

    // ─── Playback controls ──────────────────────────────────────────────

    pub fn start(&mut self, now: f64) {
        self.playback.start(&self.path, now);
        self.camera.update(self.playback.agent());
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn reset(&mut self) {
        self.playback.reset(&self.path);
        self.camera.update(self.playback.agent());
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        self.playback.set_speed(speed).inspect_err(|e| warn!("rejected speed: {}", e))?;
        self.config.speed = speed;
        Ok(())
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.playback.set_looping(looping);
        self.config.looping = looping;
    }

    pub fn clear_trail(&mut self) {
        self.playback.clear_trail();
    }

    // ─── Geometry controls ──────────────────────────────────────────────

    /// Changes the lane half-width and rebuilds both rails.
    pub fn set_lane_width(&mut self, lane_width: f64) -> Result<(), ConfigError> {
        ConfigError::positive(lane_width, ConfigError::InvalidLaneWidth)
            .inspect_err(|e| warn!("rejected lane width: {}", e))?;
        self.config.lane_width = lane_width;
        self.rebuild_boundaries();
        Ok(())
    }

    /// Rebuilds the seed circle with new parameters. Playback is reset.
    pub fn regenerate_path(
        &mut self,
        radius: f64,
        sample_count: usize,
        total_duration: f64,
    ) -> Result<(), ConfigError> {
        let candidate = SimConfig {
            radius,
            sample_count,
            total_duration,
            ..self.config.clone()
        };
        candidate
            .validate()
            .inspect_err(|e| warn!("rejected path parameters: {}", e))?;
        let path = build_path(&CircleGenerator, &candidate)?;
        self.config = candidate;
        self.replace_path(path);
        Ok(())
    }

    /// Replaces the path with one from `generator`, using the current
    /// sample count, radius and duration. Playback is reset.
    pub fn load_path(&mut self, generator: &dyn PathGenerator) -> Result<(), ConfigError> {
        let path = build_path(generator, &self.config).inspect_err(|e| warn!("rejected path: {}", e))?;
        self.replace_path(path);
        Ok(())
    }

    fn replace_path(&mut self, path: Path) {
        self.path = path;
        self.playback.reset(&self.path);
        self.rebuild_boundaries();
        self.camera.update(self.playback.agent());
        info!(points = self.path.len(), "path regenerated");
    }

    fn rebuild_boundaries(&mut self) {
        self.boundaries = BoundaryCurves::generate(&self.path, self.config.lane_width, self.config.boundary_lift);
        self.left_vertices = self.boundaries.left_vertices();
        self.right_vertices = self.boundaries.right_vertices();
    }

    // ─── View controls ──────────────────────────────────────────────────

    pub fn set_follow(&mut self, follow: bool) {
        self.camera.set_follow(follow);
        self.camera.update(self.playback.agent());
    }

    /// Changes how far behind and above the agent the follow camera sits.
    pub fn set_follow_offset(&mut self, distance: f64, height: f64) -> Result<(), ConfigError> {
        let controller =
            CameraFollowController::new(distance, height).inspect_err(|e| warn!("rejected follow offset: {}", e))?;
        self.camera.set_controller(controller);
        self.config.follow_distance = distance;
        self.config.follow_height = height;
        self.camera.update(self.playback.agent());
        Ok(())
    }

    /// Places the manual camera (used while follow mode is off).
    pub fn set_camera_position(&mut self, position: Vector3<f64>) {
        self.camera.set_manual_position(position);
        self.config.manual_camera = [position.x, position.y, position.z];
    }

    pub fn toggle_show_path(&mut self) -> bool {
        self.show_path = !self.show_path;
        self.show_path
    }

    pub fn toggle_show_boundaries(&mut self) -> bool {
        self.show_boundaries = !self.show_boundaries;
        self.show_boundaries
    }

    // ─── Manual driving ─────────────────────────────────────────────────

    /// Manual heading control is available while stopped in follow mode.
    pub fn manual_control_active(&self) -> bool {
        !self.playback.is_playing() && self.camera.is_following()
    }

    pub fn advance_forward(&mut self) -> bool {
        let step = self.config.manual_step;
        self.manual(|engine| engine.nudge_forward(step))
    }

    pub fn advance_backward(&mut self) -> bool {
        let step = self.config.manual_step;
        self.manual(|engine| engine.nudge_forward(-step))
    }

    /// Turns towards the agent's left (increasing yaw).
    pub fn turn_left(&mut self) -> bool {
        let turn = self.config.manual_turn_degrees;
        self.manual(|engine| engine.nudge_turn(turn))
    }

    pub fn turn_right(&mut self) -> bool {
        let turn = self.config.manual_turn_degrees;
        self.manual(|engine| engine.nudge_turn(-turn))
    }

    fn manual(&mut self, nudge: impl FnOnce(&mut PlaybackEngine) -> bool) -> bool {
        if !self.manual_control_active() {
            return false;
        }
        let applied = nudge(&mut self.playback);
        self.camera.update(self.playback.agent());
        applied
    }
}

impl Default for Simulation {
    fn default() -> Self {
        let config = SimConfig::default();
        let path = compute_yaw(CircleGenerator.generate(config.sample_count, config.radius, config.total_duration));
        Self::assemble(config, path)
    }
}

/// Generates a path and solves its headings.
fn build_path(generator: &dyn PathGenerator, config: &SimConfig) -> Result<Path, ConfigError> {
    let path = generator.generate(config.sample_count, config.radius, config.total_duration);
    if !path.is_playable() {
        return Err(ConfigError::DegeneratePath(path.len()));
    }
    Ok(compute_yaw(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::WaypointLoop;
    use approx::assert_relative_eq;

    fn small_config() -> SimConfig {
        SimConfig {
            sample_count: 4,
            radius: 10.0,
            total_duration: 4.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_session() {
        let sim = Simulation::default();
        assert_eq!(sim.path().len(), 1000);
        assert_eq!(sim.boundaries().len(), 1000);
        assert!(!sim.is_playing());
        assert_eq!(sim.agent().position, sim.path().points()[0].position);
        assert_eq!(sim.camera_pose().position, Vector3::new(0.0, 1.0, -6.0));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimConfig {
            sample_count: 1,
            ..Default::default()
        };
        assert_eq!(Simulation::new(config).err(), Some(ConfigError::InvalidSampleCount(1)));
    }

    #[test]
    fn test_scenario_tick_reaches_second_waypoint() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.start(0.0);
        sim.advance(1.0);
        assert_relative_eq!(sim.agent().position, Vector3::new(-5.0, 0.0, 8.660254), epsilon = 1e-5);
    }

    #[test]
    fn test_reset_while_playing() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.start(0.0);
        sim.advance(0.5);
        sim.advance(1.5);
        assert!(sim.trail().len() > 0);

        sim.reset();
        assert!(!sim.is_playing());
        assert_eq!(sim.trail().len(), 0);
        assert_eq!(sim.agent().position, sim.path().points()[0].position);
    }

    #[test]
    fn test_lane_width_rebuilds_and_rejects() {
        let mut sim = Simulation::default();
        sim.set_lane_width(3.0).unwrap();
        let center = sim.path().points()[10].position;
        let lift = Vector3::new(0.0, sim.config().boundary_lift, 0.0);
        assert_relative_eq!((sim.boundaries().left[10] - center - lift).norm(), 3.0, epsilon = 1e-4);

        let before = sim.boundaries().clone();
        assert!(sim.set_lane_width(0.0).is_err());
        assert!(sim.set_lane_width(f64::NAN).is_err());
        assert_eq!(sim.boundaries(), &before);
        assert_eq!(sim.config().lane_width, 3.0);
    }

    #[test]
    fn test_speed_rejection_keeps_state() {
        let mut sim = Simulation::default();
        sim.set_speed(2.5).unwrap();
        assert!(sim.set_speed(-1.0).is_err());
        assert_eq!(sim.clock().speed, 2.5);
        assert_eq!(sim.config().speed, 2.5);
    }

    #[test]
    fn test_follow_camera_tracks_agent() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.set_follow(true);
        sim.start(0.0);
        sim.advance(0.5);

        let agent = *sim.agent();
        let pose = *sim.camera_pose();
        assert_eq!(pose.target, agent.position);
        assert_relative_eq!(pose.position.y, agent.position.y + 3.0, epsilon = 1e-12);

        sim.set_follow(false);
        assert_eq!(sim.camera_pose().target, Vector3::zeros());
    }

    #[test]
    fn test_snapshot_layers() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.start(0.0);
        sim.advance(0.5);

        let snap = sim.snapshot();
        assert_eq!(snap.grid.len(), 31 * 4 * 3);
        assert_eq!(snap.boundary_vertex_count(), 4);
        assert_eq!(snap.trail_vertex_count(), 1);

        assert!(!sim.toggle_show_path());
        assert!(!sim.toggle_show_boundaries());
        let hidden = sim.snapshot();
        assert!(hidden.trail.is_empty());
        assert!(hidden.left_boundary.is_empty());
        assert!(hidden.right_boundary.is_empty());
        assert!(!hidden.grid.is_empty());
    }

    #[test]
    fn test_manual_driving_requires_stopped_follow() {
        let mut sim = Simulation::new(small_config()).unwrap();
        assert!(!sim.advance_forward());

        sim.set_follow(true);
        let start = sim.agent().position;
        let yaw = sim.agent().yaw;
        assert!(sim.advance_forward());
        assert_relative_eq!((sim.agent().position - start).norm(), 0.1, epsilon = 1e-12);
        assert!(sim.advance_backward());
        assert_relative_eq!(sim.agent().position, start, epsilon = 1e-12);

        assert!(sim.turn_left());
        assert_relative_eq!(sim.agent().yaw, crate::math::wrap_degrees(yaw + 5.0), epsilon = 1e-9);
        assert!(sim.turn_right());
        assert_relative_eq!(sim.agent().yaw, crate::math::wrap_degrees(yaw), epsilon = 1e-9);

        sim.start(0.0);
        assert!(!sim.turn_left());
    }

    #[test]
    fn test_regenerate_path() {
        let mut sim = Simulation::default();
        sim.start(0.0);
        sim.advance(1.0);

        sim.regenerate_path(5.0, 200, 30.0).unwrap();
        assert_eq!(sim.path().len(), 200);
        assert_eq!(sim.boundaries().len(), 200);
        assert!(!sim.is_playing());
        assert!(sim.trail().is_empty());

        assert!(sim.regenerate_path(5.0, 1, 30.0).is_err());
        assert_eq!(sim.path().len(), 200);
        assert_eq!(sim.config().sample_count, 200);
    }

    #[test]
    fn test_load_external_path() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let square = WaypointLoop::new(vec![
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, -1.0),
            Vector3::new(-1.0, 0.0, -1.0),
            Vector3::new(-1.0, 0.0, 1.0),
        ]);
        sim.load_path(&square).unwrap();
        assert_eq!(sim.path().len(), 4);

        let empty = WaypointLoop::new(Vec::new());
        assert_eq!(sim.load_path(&empty), Err(ConfigError::DegeneratePath(0)));
        assert_eq!(sim.path().len(), 4);
    }

    #[test]
    fn test_step_with_clock() {
        struct Fixed(f64);
        impl SimClock for Fixed {
            fn now(&self) -> std::time::Duration {
                std::time::Duration::from_secs_f64(self.0)
            }
        }

        let mut sim = Simulation::new(small_config()).unwrap();
        sim.start(0.0);
        sim.step(&Fixed(1.0));
        assert_relative_eq!(sim.agent().position, sim.path().points()[1].position, epsilon = 1e-9);
    }
}
