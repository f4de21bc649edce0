//! Simulation configuration.
//!
//! Every tunable of the core lives here instead of in scattered mutable
//! fields. The struct deserializes with `#[serde(default)]`, so a partial
//! JSON document overrides only the keys it names.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Largest accepted ground grid extent.
pub const MAX_GRID_SIZE: u32 = 1000;

/// Configuration for a simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Loop radius of the seed circle (world units)
    pub radius: f64,

    /// Number of waypoints generated per lap
    pub sample_count: usize,

    /// Duration of one lap at speed 1.0 (seconds)
    pub total_duration: f64,

    /// Half-distance from centerline to each rail
    pub lane_width: f64,

    /// Playback speed multiplier
    pub speed: f64,

    /// Restart from the first waypoint after the last one
    pub looping: bool,

    /// Rails are lifted this far above the path plane
    pub boundary_lift: f64,

    /// Follow camera distance behind the agent
    pub follow_distance: f64,

    /// Follow camera height above the agent
    pub follow_height: f64,

    /// Camera position used when follow mode is off
    pub manual_camera: [f64; 3],

    /// Ground grid extent (lines per axis minus one)
    pub grid_size: u32,

    /// Distance moved per manual advance
    pub manual_step: f64,

    /// Degrees turned per manual turn
    pub manual_turn_degrees: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            sample_count: 1000,
            total_duration: 120.0,
            lane_width: 1.5,
            speed: 1.0,
            looping: false,
            boundary_lift: 0.001,
            follow_distance: 8.0,
            follow_height: 3.0,
            manual_camera: [0.0, 1.0, -6.0],
            grid_size: 30,
            manual_step: 0.1,
            manual_turn_degrees: 5.0,
        }
    }
}

impl SimConfig {
    /// Returns the first invalid field, if any.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::positive(self.radius, ConfigError::InvalidRadius)?;
        if self.sample_count < 2 {
            return Err(ConfigError::InvalidSampleCount(self.sample_count));
        }
        ConfigError::positive(self.total_duration, ConfigError::InvalidDuration)?;
        ConfigError::positive(self.lane_width, ConfigError::InvalidLaneWidth)?;
        ConfigError::positive(self.speed, ConfigError::InvalidSpeed)?;
        ConfigError::positive(self.follow_distance, ConfigError::InvalidFollowDistance)?;
        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }

        let finite = [
            ("boundary_lift", self.boundary_lift),
            ("follow_height", self.follow_height),
            ("manual_step", self.manual_step),
            ("manual_turn_degrees", self.manual_turn_degrees),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }
        if self.manual_camera.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::NonFinite("manual_camera"));
        }
        Ok(())
    }
}
