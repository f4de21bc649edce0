//! JSON exporter for offline inspection of a run.

use crate::world::SimWorld;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Segment the agent is on
    pub index: usize,

    pub playing: bool,

    /// Agent position and yaw (degrees)
    pub agent: AgentPose,

    /// Camera position and look-at target
    pub camera: CameraFrame,

    /// Trail entries at this frame
    pub trail_len: usize,
}

/// Agent pose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
}

/// Camera pose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraFrame {
    pub position: [f64; 3],
    pub target: [f64; 3],
}

impl SimFrame {
    /// Captures the current state of `world`.
    pub fn capture(world: &SimWorld) -> Self {
        let agent = world.sim.agent();
        let camera = world.sim.camera_pose();
        Self {
            time_sec: world.time(),
            index: world.sim.clock().current_index,
            playing: world.sim.is_playing(),
            agent: AgentPose {
                x: agent.position.x,
                y: agent.position.y,
                z: agent.position.z,
                yaw: agent.yaw,
            },
            camera: CameraFrame {
                position: camera.position.into(),
                target: camera.target.into(),
            },
            trail_len: world.sim.trail().len(),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Samples frames from a run into an optional export.
pub(crate) struct Recorder {
    interval: u64,
    export: Option<SimExport>,
}

impl Recorder {
    /// A recorder that keeps nothing.
    pub(crate) fn disabled() -> Self {
        Self {
            interval: 1,
            export: None,
        }
    }

    /// A recorder that keeps every `interval`-th tick.
    pub(crate) fn every(interval: u64, export: SimExport) -> Self {
        Self {
            interval: interval.max(1),
            export: Some(export),
        }
    }

    pub(crate) fn observe(&mut self, world: &SimWorld) {
        if let Some(export) = self.export.as_mut() {
            if world.tick_count() % self.interval == 0 {
                export.add_frame(SimFrame::capture(world));
            }
        }
    }

    pub(crate) fn finish(self, passed: bool, failure_reason: Option<String>) -> Option<SimExport> {
        self.export.map(|mut export| {
            export.finalize(passed, failure_reason);
            export
        })
    }
}
