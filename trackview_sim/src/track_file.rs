//! Loading closed tracks and configs from JSON files.
//!
//! A track file is either a bare array of `[x, y, z]` vertices or an object
//! with a `points` array:
//!
//! ```json
//! { "points": [[1, 0, 1], [1, 0, -1], [-1, 0, -1], [-1, 0, 1]] }
//! ```

use crate::error::SimError;
use nalgebra::Vector3;
use serde::Deserialize;
use std::fs;
use std::path::Path as FsPath;
use tracing::info;
use trackview_core::{SimConfig, WaypointLoop};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TrackDocument {
    Bare(Vec<[f64; 3]>),
    Named { points: Vec<[f64; 3]> },
}

/// Parses a track document.
pub fn parse_track(json: &str) -> Result<WaypointLoop, SimError> {
    let points = match serde_json::from_str::<TrackDocument>(json)? {
        TrackDocument::Bare(points) | TrackDocument::Named { points } => points,
    };

    if points.len() < 2 {
        return Err(SimError::InvalidTrack(format!(
            "need at least 2 vertices, got {}",
            points.len()
        )));
    }
    if points.iter().flatten().any(|c| !c.is_finite()) {
        return Err(SimError::InvalidTrack("non-finite coordinate".to_string()));
    }

    Ok(WaypointLoop::new(
        points.into_iter().map(|[x, y, z]| Vector3::new(x, y, z)).collect(),
    ))
}

/// Reads and parses a track file.
pub fn load_track(path: &FsPath) -> Result<WaypointLoop, SimError> {
    let json = fs::read_to_string(path)?;
    let track = parse_track(&json)?;
    info!("Loaded track with {} vertices from {}", track.vertices().len(), path.display());
    Ok(track)
}

/// Reads a (possibly partial) config file and validates it.
pub fn load_config(path: &FsPath) -> Result<SimConfig, SimError> {
    let json = fs::read_to_string(path)?;
    let config: SimConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}
