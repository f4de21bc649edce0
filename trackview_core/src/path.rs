//! Closed-loop paths and the generators that build them.
//!
//! A [`Path`] is a timestamped sequence of waypoints. Conceptually it is a
//! loop: the direction leaving the last point heads back into the first.
//! Paths are immutable once built; changing any generation parameter means
//! building a new one.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::debug;

/// A single timestamped waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// World position
    pub position: Vector3<f64>,

    /// Heading in degrees, unwrapped (continuous along the path)
    pub yaw: f64,

    /// Time at which the agent reaches this point at speed 1.0 (seconds)
    pub timestamp: f64,
}

impl PathPoint {
    /// Creates a waypoint with zero yaw.
    pub fn new(position: Vector3<f64>, timestamp: f64) -> Self {
        Self {
            position,
            yaw: 0.0,
            timestamp,
        }
    }
}

/// An ordered, closed sequence of waypoints with strictly increasing
/// timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<PathPoint>,
}

impl Path {
    /// Wraps a point sequence.
    pub fn new(points: Vec<PathPoint>) -> Self {
        Self { points }
    }

    /// The empty path. All playback operations on it are no-ops.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the path has at least one segment to play.
    pub fn is_playable(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&PathPoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    /// Timestamp of the final waypoint, i.e. the length of one lap.
    pub fn final_timestamp(&self) -> Option<f64> {
        self.points.last().map(|p| p.timestamp)
    }

    pub fn positions(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.points.iter().map(|p| p.position)
    }

    pub(crate) fn points_mut(&mut self) -> &mut [PathPoint] {
        &mut self.points
    }
}

/// Source of a closed path.
///
/// Implementations must be deterministic in their inputs and return an empty
/// path when the inputs cannot produce one.
pub trait PathGenerator {
    /// Builds `sample_count` waypoints covering one lap of `total_duration`
    /// seconds. Yaw is left at zero; run the orientation solver afterwards.
    fn generate(&self, sample_count: usize, radius: f64, total_duration: f64) -> Path;
}

/// Shared input check for generators.
fn valid_inputs(sample_count: usize, radius: f64, total_duration: f64) -> bool {
    sample_count >= 2
        && radius.is_finite()
        && radius > 0.0
        && total_duration.is_finite()
        && total_duration > 0.0
}

/// Timestamp of sample `i`.
fn sample_timestamp(i: usize, sample_count: usize, total_duration: f64) -> f64 {
    i as f64 * (total_duration / sample_count as f64)
}

/// The default seed path: one revolution of a circle on the XZ plane.
///
/// The first and last samples coincide so the loop closes exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleGenerator;

impl PathGenerator for CircleGenerator {
    fn generate(&self, sample_count: usize, radius: f64, total_duration: f64) -> Path {
        if !valid_inputs(sample_count, radius, total_duration) {
            debug!(sample_count, radius, total_duration, "circle generator rejected inputs");
            return Path::empty();
        }

        let last = (sample_count - 1) as f64;
        let points = (0..sample_count)
            .map(|i| {
                let angle = (i as f64 / last) * TAU;
                let position = Vector3::new(radius * angle.cos(), 0.0, radius * angle.sin());
                PathPoint::new(position, sample_timestamp(i, sample_count, total_duration))
            })
            .collect();

        Path::new(points)
    }
}

/// An externally supplied closed polyline, resampled by arc length.
///
/// The outline is scaled so that its farthest point from the vertical axis
/// sits at `radius`. The closing segment from the last vertex back to the
/// first is implied; a repeated first vertex at the end is tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointLoop {
    vertices: Vec<Vector3<f64>>,
}

impl WaypointLoop {
    pub fn new(vertices: Vec<Vector3<f64>>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    /// Vertex list with the closing vertex appended.
    fn closed_ring(&self) -> Vec<Vector3<f64>> {
        let mut ring = self.vertices.clone();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if (last - first).norm() > f64::EPSILON {
                ring.push(first);
            }
        }
        ring
    }

    /// Farthest horizontal distance of any vertex from the origin.
    fn reference_radius(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| (v.x * v.x + v.z * v.z).sqrt())
            .fold(0.0, f64::max)
    }
}

impl PathGenerator for WaypointLoop {
    fn generate(&self, sample_count: usize, radius: f64, total_duration: f64) -> Path {
        if !valid_inputs(sample_count, radius, total_duration) || self.vertices.len() < 2 {
            debug!(
                sample_count,
                vertices = self.vertices.len(),
                "waypoint loop rejected inputs"
            );
            return Path::empty();
        }

        let ring = self.closed_ring();
        let mut cumulative = Vec::with_capacity(ring.len());
        cumulative.push(0.0);
        for pair in ring.windows(2) {
            let prev = cumulative[cumulative.len() - 1];
            cumulative.push(prev + (pair[1] - pair[0]).norm());
        }
        let perimeter = cumulative[cumulative.len() - 1];
        if perimeter < f64::EPSILON {
            debug!("waypoint loop has zero perimeter");
            return Path::empty();
        }

        let reference = self.reference_radius();
        let scale = if reference > f64::EPSILON { radius / reference } else { 1.0 };

        let last = (sample_count - 1) as f64;
        let mut segment = 0;
        let points = (0..sample_count)
            .map(|i| {
                let s = (i as f64 / last) * perimeter;
                while segment + 2 < cumulative.len() && cumulative[segment + 1] < s {
                    segment += 1;
                }
                let seg_len = cumulative[segment + 1] - cumulative[segment];
                let t = if seg_len > f64::EPSILON {
                    ((s - cumulative[segment]) / seg_len).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let position = ring[segment].lerp(&ring[segment + 1], t) * scale;
                PathPoint::new(position, sample_timestamp(i, sample_count, total_duration))
            })
            .collect();

        Path::new(points)
    }
}
