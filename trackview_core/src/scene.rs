//! Static scene geometry handed to the renderer: the ground grid and the
//! vehicle body.

use crate::playback::AgentState;
use nalgebra::{Matrix4, Vector3};

/// Half extents of the vehicle box: width, height, length.
///
/// The long axis is +Z so that yaw 0 faces along it.
pub const VEHICLE_HALF_EXTENTS: [f32; 3] = [0.25, 0.5, 1.0];

/// Number of vertices in [`vehicle_vertices`].
pub const VEHICLE_VERTEX_COUNT: usize = 36;

/// Ground grid as a line list of `xyz` floats on the Y = 0 plane.
///
/// Lines run parallel to X and to Z at every integer from `-size/2` to
/// `size/2`, so a size of 30 yields 31 lines per axis.
pub fn build_grid(size: u32) -> Vec<f32> {
    let area = i64::from(size / 2);
    let extent = area as f32;
    let per_axis = (2 * area + 1) as usize;
    let mut vertices = Vec::with_capacity(per_axis * 2 * 6);

    for i in -area..=area {
        let i = i as f32;
        vertices.extend_from_slice(&[-extent, 0.0, i, extent, 0.0, i]);
    }
    for i in -area..=area {
        let i = i as f32;
        vertices.extend_from_slice(&[i, 0.0, -extent, i, 0.0, extent]);
    }
    vertices
}

/// Vehicle box as a triangle list of `xyz` floats, centred on the origin.
pub fn vehicle_vertices() -> Vec<f32> {
    let [hx, hy, hz] = VEHICLE_HALF_EXTENTS;
    let corner = |sx: f32, sy: f32, sz: f32| [sx * hx, sy * hy, sz * hz];

    // Each face as a quad, wound a -> b -> c -> d
    let faces = [
        [corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)],
        [corner(1.0, -1.0, -1.0), corner(-1.0, -1.0, -1.0), corner(-1.0, 1.0, -1.0), corner(1.0, 1.0, -1.0)],
        [corner(-1.0, -1.0, -1.0), corner(-1.0, -1.0, 1.0), corner(-1.0, 1.0, 1.0), corner(-1.0, 1.0, -1.0)],
        [corner(1.0, -1.0, 1.0), corner(1.0, -1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, 1.0, 1.0)],
        [corner(-1.0, -1.0, -1.0), corner(1.0, -1.0, -1.0), corner(1.0, -1.0, 1.0), corner(-1.0, -1.0, 1.0)],
        [corner(-1.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), corner(1.0, 1.0, -1.0), corner(-1.0, 1.0, -1.0)],
    ];

    let mut vertices = Vec::with_capacity(VEHICLE_VERTEX_COUNT * 3);
    for [a, b, c, d] in faces {
        for v in [a, b, c, c, d, a] {
            vertices.extend_from_slice(&v);
        }
    }
    vertices
}

/// Model matrix placing the vehicle at the agent's pose.
pub fn vehicle_model_matrix(agent: &AgentState) -> Matrix4<f64> {
    Matrix4::new_translation(&agent.position)
        * Matrix4::new_rotation(Vector3::y() * agent.yaw.to_radians())
}
