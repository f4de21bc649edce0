//! Angle and interpolation helpers shared by the orientation solver and the
//! playback engine.
//!
//! All angles are in degrees. Yaw is measured about +Y with 0° facing +Z and
//! +90° facing +X, i.e. `yaw = atan2(dir.x, dir.z)`.

use nalgebra::Vector3;

/// Direction vectors shorter than this have no usable heading.
pub const DIRECTION_EPSILON: f64 = 1e-3;

/// World up axis.
pub fn up() -> Vector3<f64> {
    Vector3::y()
}

/// Wraps an angle into `[-180, 180)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Signed shortest rotation from `from` to `to`, in `[-180, 180)`.
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    wrap_degrees(to - from)
}

/// Heading of a direction vector, or `None` when the vector is degenerate.
pub fn yaw_from_direction(direction: &Vector3<f64>) -> Option<f64> {
    if direction.norm() < DIRECTION_EPSILON {
        return None;
    }
    Some(direction.x.atan2(direction.z).to_degrees())
}

/// Unit forward vector on the XZ plane for a yaw in degrees.
pub fn forward_from_yaw(yaw_degrees: f64) -> Vector3<f64> {
    let rad = yaw_degrees.to_radians();
    Vector3::new(rad.sin(), 0.0, rad.cos())
}

/// Hermite smoothstep between two edges, clamped to `[0, 1]`.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear blend `a + (b - a) * t`.
pub fn mix(a: &Vector3<f64>, b: &Vector3<f64>, t: f64) -> Vector3<f64> {
    a + (b - a) * t
}

/// Flattens a point list into an `xyz xyz ...` float array for vertex upload.
pub fn flatten(points: impl IntoIterator<Item = Vector3<f64>>) -> Vec<f32> {
    points
        .into_iter()
        .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect()
}
