//! Per-frame, read-only view of the simulation for the renderer.
//!
//! Everything is flattened to `xyz` float arrays ready for vertex upload.
//! Hidden layers come through as empty slices.

use crate::camera::CameraPose;
use crate::playback::AgentState;
use serde::Serialize;

/// Everything the renderer reads in one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot<'a> {
    /// Ground grid line list (static)
    pub grid: &'a [f32],

    /// Recorded agent trail, oldest first
    pub trail: Vec<f32>,

    /// Left rail line strip
    pub left_boundary: &'a [f32],

    /// Right rail line strip
    pub right_boundary: &'a [f32],

    /// Agent pose for the vehicle model matrix
    pub agent: AgentState,

    /// Camera position and look-at target
    pub camera: CameraPose,
}

impl FrameSnapshot<'_> {
    /// Number of vertices in the trail strip.
    pub fn trail_vertex_count(&self) -> usize {
        self.trail.len() / 3
    }

    /// Number of vertices in each rail strip.
    pub fn boundary_vertex_count(&self) -> usize {
        self.left_boundary.len() / 3
    }
}
