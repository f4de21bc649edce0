//! TrackView Deterministic Simulation Harness
//!
//! Drives the TrackView core headlessly on a virtual clock so every run is
//! reproducible from its seed and tick rate.
//!
//! # Core Principle
//!
//! The core only ever sees the time it is handed. Here that time comes from
//! a [`ManualClock`] advanced one fixed tick at a time, so two runs with the
//! same inputs produce bit-identical agent poses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ScenarioRunner                │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ SimWorld                               │  │
//! │  │  ManualClock ──now──► Simulation       │  │
//! │  └────────────────────────────────────────┘  │
//! │        │ per-tick checks        │ frames     │
//! │        ▼                        ▼            │
//! │  ScenarioResult            SimExport (JSON)  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use trackview_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::Looping);
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod runner;
mod shapes;
mod track_file;
mod world;
pub mod scenarios;

pub use context::ManualClock;
pub use error::SimError;
pub use exporter::{AgentPose, CameraFrame, SimExport, SimFrame};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use shapes::WobbleGenerator;
pub use track_file::{load_config, load_track, parse_track};
pub use world::SimWorld;
