//! Error types for the TrackView core.

use thiserror::Error;

/// A rejected configuration value.
///
/// Mutators that return this leave the previous state untouched, so a
/// caller that ignores the error gets a plain no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Loop radius must be positive and finite
    #[error("Invalid radius: {0} (must be > 0)")]
    InvalidRadius(f64),

    /// A path needs at least two samples
    #[error("Invalid sample count: {0} (must be >= 2)")]
    InvalidSampleCount(usize),

    /// Lap duration must be positive and finite
    #[error("Invalid duration: {0}s (must be > 0)")]
    InvalidDuration(f64),

    /// Lane half-width must be positive and finite
    #[error("Invalid lane width: {0} (must be > 0)")]
    InvalidLaneWidth(f64),

    /// Playback speed multiplier must be positive and finite
    #[error("Invalid speed: {0} (must be > 0)")]
    InvalidSpeed(f64),

    /// Follow camera distance must be positive and finite
    #[error("Invalid follow distance: {0} (must be > 0)")]
    InvalidFollowDistance(f64),

    /// Ground grid extent out of range
    #[error("Invalid grid size: {0} (must be <= {max})", max = crate::config::MAX_GRID_SIZE)]
    InvalidGridSize(u32),

    /// The path source produced fewer than two waypoints
    #[error("Path source produced {0} waypoints (need at least 2)")]
    DegeneratePath(usize),

    /// Any other non-finite input
    #[error("Non-finite value for {0}")]
    NonFinite(&'static str),
}

impl ConfigError {
    /// Checks that `value` is finite and strictly positive.
    pub(crate) fn positive(value: f64, err: fn(f64) -> ConfigError) -> Result<f64, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(err(value))
        }
    }
}
