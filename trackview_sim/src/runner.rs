//! Scenario runner - executes harness scenarios against the core.

use crate::exporter::{Recorder, SimExport};
use crate::scenarios::ScenarioId;
use crate::shapes::WobbleGenerator;
use crate::world::SimWorld;

use nalgebra::Vector3;
use tracing::{debug, info, warn};
use trackview_core::math::shortest_delta;
use trackview_core::{
    CircleGenerator, PathGenerator, SimConfig, Simulation, TickOutcome, WaypointLoop, TRAIL_CAPACITY,
    TRAIL_MIN_SPACING,
};

/// Largest heading change one tick of yaw smoothing can make (degrees).
const MAX_YAW_STEP: f64 = 0.12 * 180.0;

/// Tolerance for geometric checks.
const GEOMETRY_TOLERANCE: f64 = 1e-4;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Laps completed
    pub laps: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Times playback restarted from the first waypoint
    pub lap_restarts: u64,

    /// Largest trail length observed
    pub max_trail_len: usize,

    /// Smallest distance between consecutive trail entries
    pub min_trail_spacing: Option<f64>,

    /// Largest agent heading change in a single tick (degrees)
    pub max_yaw_step: f64,

    /// Largest heading jump between adjacent waypoints (degrees)
    pub max_path_yaw_step: f64,

    /// Largest deviation of a rail from its lane width
    pub max_boundary_error: f64,

    /// Largest deviation of the follow camera from its offset
    pub max_camera_error: f64,

    /// Manual nudges accepted
    pub manual_moves: u64,
}

/// Collected assertion failures.
#[derive(Debug, Default)]
struct Checks {
    failures: Vec<String>,
}

impl Checks {
    fn require(&mut self, condition: bool, message: impl FnOnce() -> String) {
        if !condition {
            self.fail(message());
        }
    }

    fn fail(&mut self, message: String) {
        warn!("check failed: {}", message);
        self.failures.push(message);
    }

    fn reason(&self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(self.failures.join("; "))
        }
    }
}

/// Runs harness scenarios.
pub struct ScenarioRunner {
    /// Seed for generated tracks
    seed: u64,

    /// Tick rate in Hz
    tick_rate_hz: u32,

    /// Maximum duration in seconds
    max_duration_secs: f64,

    /// Base configuration every scenario starts from
    config: SimConfig,

    /// Track replacing the seed circle, if loaded
    track: Option<WaypointLoop>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tick_rate_hz: 30,
            max_duration_secs: 20.0,
            config: SimConfig::default(),
            track: None,
        }
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    /// Sets the base configuration.
    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the seed circle with a closed track.
    pub fn with_track(mut self, track: WaypointLoop) -> Self {
        self.track = Some(track);
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, Recorder::disabled()).0
    }

    /// Runs a scenario, keeping every `interval`-th tick as an export frame.
    pub fn run_with_export(&self, scenario: ScenarioId, interval: u64) -> (ScenarioResult, SimExport) {
        let recorder = Recorder::every(interval, SimExport::new(scenario.name(), self.seed));
        let (result, export) = self.execute(scenario, recorder);
        let export = export.unwrap_or_else(|| SimExport::new(scenario.name(), self.seed));
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, mut recorder: Recorder) -> (ScenarioResult, Option<SimExport>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("{}", scenario.description());

        let mut checks = Checks::default();
        let mut metrics = ScenarioMetrics::default();

        let outcome = match scenario {
            ScenarioId::SingleLap => self.run_single_lap(&mut checks, &mut metrics, &mut recorder),
            ScenarioId::Looping => self.run_looping(&mut checks, &mut metrics, &mut recorder),
            ScenarioId::WobblyTrack => self.run_wobbly_track(&mut checks, &mut metrics, &mut recorder),
            ScenarioId::LaneSweep => self.run_lane_sweep(&mut checks, &mut metrics, &mut recorder),
            ScenarioId::FollowCam => self.run_follow_cam(&mut checks, &mut metrics, &mut recorder),
            ScenarioId::ManualDrive => self.run_manual_drive(&mut checks, &mut metrics, &mut recorder),
        };

        let (total_ticks, final_time_secs, laps) = match outcome {
            Some(world) => (world.tick_count(), world.time(), world.sim.laps()),
            None => (0, 0.0, 0),
        };

        let failure_reason = checks.reason();
        let passed = failure_reason.is_none();
        let export = recorder.finish(passed, failure_reason.clone());

        (
            ScenarioResult {
                scenario,
                seed: self.seed,
                passed,
                total_ticks,
                final_time_secs,
                laps,
                failure_reason,
                metrics,
            },
            export,
        )
    }

    /// Builds a world on the configured track (or the seed circle).
    fn build_world(&self, config: SimConfig, checks: &mut Checks) -> Option<SimWorld> {
        let generator: &dyn PathGenerator = match &self.track {
            Some(track) => track,
            None => &CircleGenerator,
        };
        self.build_world_with(config, generator, checks)
    }

    fn build_world_with(
        &self,
        config: SimConfig,
        generator: &dyn PathGenerator,
        checks: &mut Checks,
    ) -> Option<SimWorld> {
        match Simulation::with_generator(config, generator) {
            Ok(sim) => Some(SimWorld::new(sim, self.tick_rate_hz)),
            Err(e) => {
                checks.fail(format!("setup failed: {}", e));
                None
            }
        }
    }

    /// Number of ticks covering `secs` of virtual time.
    fn ticks_for(&self, secs: f64) -> u64 {
        (secs.max(0.0) * self.tick_rate_hz as f64).ceil() as u64
    }

    /// Time one lap takes on `world` at its current speed.
    fn lap_secs(world: &SimWorld) -> f64 {
        world.sim.path().final_timestamp().unwrap_or(0.0) / world.sim.clock().speed
    }

    /// Plays one lap with looping off.
    fn run_single_lap(
        &self,
        checks: &mut Checks,
        metrics: &mut ScenarioMetrics,
        recorder: &mut Recorder,
    ) -> Option<SimWorld> {
        let config = SimConfig {
            looping: false,
            ..self.config.clone()
        };
        let mut world = self.build_world(config, checks)?;
        record_path_metrics(&world, checks, metrics);

        let target_ticks = self.ticks_for(Self::lap_secs(&world) + 1.0);
        world.start();
        let mut probe = TickProbe::new(&world);
        let mut finished_pose = None;
        let mut finishes = 0;

        for _ in 0..target_ticks {
            let outcome = world.tick();
            probe.observe(&world, outcome, checks, metrics);
            recorder.observe(&world);

            if outcome == TickOutcome::Finished {
                finishes += 1;
                finished_pose = Some(*world.sim.agent());
            }
        }

        checks.require(finishes == 1, || format!("expected 1 finish, saw {}", finishes));
        checks.require(!world.sim.is_playing(), || "still playing after the lap".to_string());
        checks.require(world.sim.laps() == 1, || format!("expected 1 lap, saw {}", world.sim.laps()));
        if let Some(pose) = finished_pose {
            checks.require(*world.sim.agent() == pose, || "agent moved after stopping".to_string());
        }

        info!(
            "✓ SingleLap complete: {} ticks, trail {} entries",
            world.tick_count(),
            world.sim.trail().len()
        );
        Some(world)
    }

    /// Loops for the whole duration.
    fn run_looping(
        &self,
        checks: &mut Checks,
        metrics: &mut ScenarioMetrics,
        recorder: &mut Recorder,
    ) -> Option<SimWorld> {
        let config = SimConfig {
            looping: true,
            total_duration: (self.max_duration_secs / 4.0).max(1.0),
            ..self.config.clone()
        };
        let mut world = self.build_world(config, checks)?;
        record_path_metrics(&world, checks, metrics);

        let target_ticks = self.ticks_for(self.max_duration_secs);
        world.start();
        let mut probe = TickProbe::new(&world);

        for _ in 0..target_ticks {
            let outcome = world.tick();
            probe.observe(&world, outcome, checks, metrics);
            recorder.observe(&world);
        }

        let lap = Self::lap_secs(&world);
        let expected = if lap > 0.0 { (world.time() / lap).floor() as u64 } else { 0 };
        let restarts = metrics.lap_restarts;
        checks.require(world.sim.is_playing(), || "looping playback stopped".to_string());
        checks.require(restarts <= expected && restarts + 1 >= expected, || {
            format!("expected about {} lap restarts, saw {}", expected, restarts)
        });

        info!("✓ Looping complete: {} restarts in {:.1}s", restarts, world.time());
        Some(world)
    }

    /// Loops around a seeded wobbly track.
    fn run_wobbly_track(
        &self,
        checks: &mut Checks,
        metrics: &mut ScenarioMetrics,
        recorder: &mut Recorder,
    ) -> Option<SimWorld> {
        let config = SimConfig {
            looping: true,
            total_duration: (self.max_duration_secs / 2.0).max(1.0),
            ..self.config.clone()
        };
        let generator = WobbleGenerator::new(self.seed, 6, 0.12);
        let mut world = self.build_world_with(config, &generator, checks)?;
        record_path_metrics(&world, checks, metrics);

        let target_ticks = self.ticks_for(self.max_duration_secs);
        world.start();
        let mut probe = TickProbe::new(&world);

        for tick in 0..target_ticks {
            let outcome = world.tick();
            probe.observe(&world, outcome, checks, metrics);
            recorder.observe(&world);

            if tick % 30 == 0 {
                debug!(
                    "  t={:.1}s | index={} | yaw={:.1}",
                    world.time(),
                    world.sim.clock().current_index,
                    world.sim.agent().yaw
                );
            }
        }

        checks.require(metrics.max_yaw_step <= MAX_YAW_STEP + 1e-9, || {
            format!("yaw step {:.2}° exceeds {:.1}°", metrics.max_yaw_step, MAX_YAW_STEP)
        });

        info!(
            "✓ WobblyTrack complete: max yaw step {:.2}°, max path yaw step {:.2}°",
            metrics.max_yaw_step, metrics.max_path_yaw_step
        );
        Some(world)
    }

    /// Edits the lane width and measures the rails after each edit.
    fn run_lane_sweep(
        &self,
        checks: &mut Checks,
        metrics: &mut ScenarioMetrics,
        recorder: &mut Recorder,
    ) -> Option<SimWorld> {
        let mut world = self.build_world(self.config.clone(), checks)?;
        world.start();

        for width in [0.25, 0.5, 1.0, 1.5, 2.0, 3.0, 5.0] {
            if let Err(e) = world.sim.set_lane_width(width) {
                checks.fail(format!("width {} rejected: {}", width, e));
                continue;
            }
            let error = boundary_error(&world.sim, width);
            metrics.max_boundary_error = metrics.max_boundary_error.max(error);
            checks.require(error <= GEOMETRY_TOLERANCE, || {
                format!("rail error {:.2e} at width {}", error, width)
            });

            world.tick();
            recorder.observe(&world);
        }

        let before = world.sim.boundaries().clone();
        for width in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            checks.require(world.sim.set_lane_width(width).is_err(), || {
                format!("width {} was accepted", width)
            });
        }
        checks.require(world.sim.boundaries() == &before, || {
            "rejected width changed the rails".to_string()
        });

        info!("✓ LaneSweep complete: max rail error {:.2e}", metrics.max_boundary_error);
        Some(world)
    }

    /// Loops with the chase camera on.
    fn run_follow_cam(
        &self,
        checks: &mut Checks,
        metrics: &mut ScenarioMetrics,
        recorder: &mut Recorder,
    ) -> Option<SimWorld> {
        let config = SimConfig {
            looping: true,
            ..self.config.clone()
        };
        let distance = config.follow_distance;
        let height = config.follow_height;
        let mut world = self.build_world(config, checks)?;
        world.sim.set_follow(true);

        let target_ticks = self.ticks_for(self.max_duration_secs);
        world.start();
        let mut probe = TickProbe::new(&world);

        for _ in 0..target_ticks {
            let outcome = world.tick();
            probe.observe(&world, outcome, checks, metrics);
            recorder.observe(&world);

            let agent = world.sim.agent();
            let pose = world.sim.camera_pose();
            let offset = pose.position - agent.position;
            let flat = Vector3::new(offset.x, 0.0, offset.z).norm();
            let error = (flat - distance).abs().max((offset.y - height).abs());
            metrics.max_camera_error = metrics.max_camera_error.max(error);

            if pose.target != agent.position {
                checks.fail("camera not looking at the agent".to_string());
                break;
            }
        }

        checks.require(metrics.max_camera_error <= GEOMETRY_TOLERANCE, || {
            format!("camera offset error {:.2e}", metrics.max_camera_error)
        });

        info!("✓ FollowCam complete: max camera error {:.2e}", metrics.max_camera_error);
        Some(world)
    }

    /// Drives a 2x2 square by hand, then checks nudges lock out during play.
    fn run_manual_drive(
        &self,
        checks: &mut Checks,
        metrics: &mut ScenarioMetrics,
        recorder: &mut Recorder,
    ) -> Option<SimWorld> {
        let config = SimConfig {
            manual_step: 0.1,
            manual_turn_degrees: 5.0,
            ..self.config.clone()
        };
        let mut world = self.build_world(config, checks)?;

        checks.require(!world.sim.advance_forward(), || {
            "nudge accepted without follow mode".to_string()
        });

        world.sim.set_follow(true);
        let origin = world.sim.agent().position;

        for _side in 0..4 {
            for _ in 0..20 {
                if world.sim.advance_forward() {
                    metrics.manual_moves += 1;
                }
                world.tick();
                recorder.observe(&world);
            }
            for _ in 0..18 {
                if world.sim.turn_left() {
                    metrics.manual_moves += 1;
                }
                world.tick();
                recorder.observe(&world);
            }
        }

        let drift = (world.sim.agent().position - origin).norm();
        metrics.max_trail_len = world.sim.trail().len();
        checks.require(metrics.manual_moves == 4 * 38, || {
            format!("expected 152 nudges, {} accepted", metrics.manual_moves)
        });
        checks.require(drift < 1e-6, || format!("square did not close, drift {:.2e}", drift));
        checks.require(world.sim.trail().len() == 80, || {
            format!("expected 80 trail entries, saw {}", world.sim.trail().len())
        });

        world.start();
        checks.require(!world.sim.turn_right(), || "nudge accepted while playing".to_string());

        info!("✓ ManualDrive complete: {} nudges, drift {:.2e}", metrics.manual_moves, drift);
        Some(world)
    }
}

/// Per-tick invariant checks shared by the playback scenarios.
struct TickProbe {
    previous_yaw: f64,
}

impl TickProbe {
    fn new(world: &SimWorld) -> Self {
        Self {
            previous_yaw: world.sim.agent().yaw,
        }
    }

    fn observe(
        &mut self,
        world: &SimWorld,
        outcome: TickOutcome,
        checks: &mut Checks,
        metrics: &mut ScenarioMetrics,
    ) {
        let sim = &world.sim;
        let yaw = sim.agent().yaw;

        match outcome {
            TickOutcome::Advanced { .. } => {
                let step = shortest_delta(self.previous_yaw, yaw).abs();
                metrics.max_yaw_step = metrics.max_yaw_step.max(step);
            }
            TickOutcome::LapRestarted => {
                metrics.lap_restarts += 1;
                let clock = sim.clock();
                checks.require(clock.current_index == 0, || "index not rewound on loop".to_string());
                checks.require(clock.elapsed(world.time()).abs() < 1e-9, || {
                    format!("start time not re-anchored: elapsed {}", clock.elapsed(world.time()))
                });
                checks.require(sim.trail().is_empty(), || "trail kept across loop".to_string());
            }
            TickOutcome::Finished | TickOutcome::Idle => {}
        }
        self.previous_yaw = yaw;

        let trail = sim.trail();
        metrics.max_trail_len = metrics.max_trail_len.max(trail.len());
        checks.require(trail.len() <= TRAIL_CAPACITY, || format!("trail grew to {}", trail.len()));

        let previous = trail.len().checked_sub(2).and_then(|i| trail.iter().nth(i));
        if let (Some(a), Some(b)) = (trail.last(), previous) {
            let spacing = (a - b).norm();
            let min = metrics.min_trail_spacing.map_or(spacing, |m| m.min(spacing));
            metrics.min_trail_spacing = Some(min);
            checks.require(spacing >= TRAIL_MIN_SPACING, || format!("trail spacing {:.4}", spacing));
        }
    }
}

/// Checks heading continuity along the path.
fn record_path_metrics(world: &SimWorld, checks: &mut Checks, metrics: &mut ScenarioMetrics) {
    let step = world
        .sim
        .path()
        .points()
        .windows(2)
        .map(|pair| (pair[1].yaw - pair[0].yaw).abs())
        .fold(0.0, f64::max);
    metrics.max_path_yaw_step = metrics.max_path_yaw_step.max(step);
    checks.require(step <= 180.0, || format!("path yaw jumps {:.1}°", step));
}

/// Largest deviation of either rail from `width` over interior points,
/// measured from the centerline itself (the rail lift included).
fn boundary_error(sim: &Simulation, width: f64) -> f64 {
    let points = sim.path().points();
    let curves = sim.boundaries();
    if points.len() < 3 {
        return 0.0;
    }

    (1..points.len() - 1)
        .map(|i| {
            let center = points[i].position;
            let left = ((curves.left[i] - center).norm() - width).abs();
            let right = ((curves.right[i] - center).norm() - width).abs();
            left.max(right)
        })
        .fold(0.0, f64::max)
}
