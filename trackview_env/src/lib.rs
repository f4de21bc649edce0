//! TrackView Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" time abstraction that lets the
//! TrackView core run against **Wall time** (an interactive viewer) or
//! **Virtual time** (the deterministic headless harness).
//!
//! # Core Concept
//!
//! The simulation core never reads the system clock itself. Every frame the
//! host asks a [`SimClock`] for "now" and hands that value to the core's
//! single `advance(now)` step. Swapping the clock is the only difference
//! between a live session and a reproducible test run.
//!
//! # Example
//!
//! ```ignore
//! use trackview_env::{SimClock, WallClock};
//!
//! let clock = WallClock::new();
//! loop {
//!     sim.advance(clock.now_secs());
//!     render(sim.snapshot());
//! }
//! ```

mod clock;
mod wall;

pub use clock::SimClock;
pub use wall::WallClock;
