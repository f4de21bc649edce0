//! TrackView Core - Closed-Loop Path Playback
//!
//! Simulates a single vehicle driving a closed, time-parameterized path:
//! 1. **Path**: timestamped waypoints from a [`PathGenerator`] (seed circle or
//!    any closed polyline), with continuous headings from [`compute_yaw`]
//! 2. **Playback**: time-driven interpolation with look-ahead heading
//!    smoothing and a bounded trail ([`PlaybackEngine`], [`TrailBuffer`])
//! 3. **View**: lane rails ([`BoundaryCurves`]), a chase camera
//!    ([`CameraRig`]) and flattened per-frame [`FrameSnapshot`]s
//!
//! The host drives everything through [`Simulation`]: one `advance(now)`
//! per frame, then one `snapshot()`.

pub mod boundary;
pub mod camera;
pub mod config;
pub mod error;
pub mod math;
pub mod orientation;
pub mod path;
pub mod playback;
pub mod scene;
pub mod simulation;
pub mod snapshot;
pub mod trail;

// Re-export key types for convenience
pub use boundary::BoundaryCurves;
pub use camera::{CameraFollowController, CameraPose, CameraRig, Projection};
pub use config::{SimConfig, MAX_GRID_SIZE};
pub use error::ConfigError;
pub use orientation::compute_yaw;
pub use path::{CircleGenerator, Path, PathGenerator, PathPoint, WaypointLoop};
pub use playback::{AgentState, PlaybackClock, PlaybackEngine, PlaybackState, TickOutcome};
pub use simulation::Simulation;
pub use snapshot::FrameSnapshot;
pub use trail::{TrailBuffer, TRAIL_CAPACITY, TRAIL_MIN_SPACING};
