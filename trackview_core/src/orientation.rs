//! Heading solver: fills in each waypoint's yaw from the path geometry.

use crate::math::yaw_from_direction;
use crate::path::Path;

/// Computes a continuous yaw track for `path`, in place.
///
/// Each point faces the next one; the last point faces the first, closing
/// the loop. Degenerate steps (coincident points) inherit the previous
/// heading. A second pass unwraps the sequence so adjacent yaws never differ
/// by more than 180°.
pub fn compute_yaw(mut path: Path) -> Path {
    solve_in_place(&mut path);
    path
}

fn solve_in_place(path: &mut Path) {
    let len = path.len();
    if len == 0 {
        return;
    }

    let points = path.points_mut();
    let mut previous = 0.0;
    for i in 0..len {
        let next = if i + 1 < len { i + 1 } else { 0 };
        let direction = points[next].position - points[i].position;
        let yaw = yaw_from_direction(&direction).unwrap_or(previous);
        points[i].yaw = yaw;
        previous = yaw;
    }

    // Unwrap
    for i in 1..len {
        let diff = points[i].yaw - points[i - 1].yaw;
        if diff > 180.0 {
            points[i].yaw -= 360.0;
        } else if diff < -180.0 {
            points[i].yaw += 360.0;
        }
    }
}
