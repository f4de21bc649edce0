//! Lane rails: two curves offset sideways from the path centerline.

use crate::math::{flatten, up, DIRECTION_EPSILON};
use crate::path::Path;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Left and right rail curves, one point per path waypoint.
///
/// Derived data: rebuilt in full whenever the path or the lane width
/// changes, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCurves {
    pub left: Vec<Vector3<f64>>,
    pub right: Vec<Vector3<f64>>,
}

impl BoundaryCurves {
    /// Builds both rails for `path` at `lane_width` from the centerline.
    ///
    /// Each rail point is lifted by `lift` on Y so it does not z-fight with
    /// the centerline. Returns empty curves when the path has fewer than two
    /// points or the width is not positive.
    pub fn generate(path: &Path, lane_width: f64, lift: f64) -> Self {
        let len = path.len();
        if len < 2 || !(lane_width.is_finite() && lane_width > 0.0) {
            debug!(len, lane_width, "skipping boundary generation");
            return Self::default();
        }

        let points = path.points();
        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);

        // Right-hand side when facing +Z
        let mut right_dir = Vector3::new(-1.0, 0.0, 0.0);
        let lift_vec = up() * lift;

        for i in 0..len {
            let forward = if i + 1 < len {
                points[i + 1].position - points[i].position
            } else {
                points[i].position - points[i - 1].position
            };

            if forward.norm() >= DIRECTION_EPSILON {
                let side = forward.normalize().cross(&up());
                if side.norm() >= DIRECTION_EPSILON {
                    right_dir = side.normalize();
                }
            }

            let center = points[i].position;
            left.push(center - right_dir * lane_width + lift_vec);
            right.push(center + right_dir * lane_width + lift_vec);
        }

        debug!(points = len, lane_width, "boundaries regenerated");
        Self { left, right }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Left rail as a flat `xyz` vertex array.
    pub fn left_vertices(&self) -> Vec<f32> {
        flatten(self.left.iter().copied())
    }

    /// Right rail as a flat `xyz` vertex array.
    pub fn right_vertices(&self) -> Vec<f32> {
        flatten(self.right.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::path::{CircleGenerator, PathGenerator, PathPoint};
    use approx::assert_relative_eq;

    const LIFT: f64 = 0.01;

    fn two_point_path() -> Path {
        Path::new(vec![
            PathPoint::new(Vector3::new(0.0, 0.0, 0.0), 0.0),
            PathPoint::new(Vector3::new(0.0, 0.0, 10.0), 1.0),
        ])
    }

    #[test]
    fn test_straight_path_rails() {
        let curves = BoundaryCurves::generate(&two_point_path(), 1.5, LIFT);
        assert_eq!(curves.len(), 2);

        // Facing +Z, cross(forward, up) points to -X, so the right rail sits
        // at -X and the left rail at +X in this right-handed, Y-up frame
        assert_relative_eq!(curves.right[0], Vector3::new(-1.5, LIFT, 0.0), epsilon = 1e-12);
        assert_relative_eq!(curves.right[1], Vector3::new(-1.5, LIFT, 10.0), epsilon = 1e-12);
        assert_relative_eq!(curves.left[0], Vector3::new(1.5, LIFT, 0.0), epsilon = 1e-12);
        assert_relative_eq!(curves.left[1], Vector3::new(1.5, LIFT, 10.0), epsilon = 1e-12);
    }

    #[test]
    fn test_circle_offset_exactness() {
        let path = CircleGenerator.generate(500, 10.0, 60.0);
        let curves = BoundaryCurves::generate(&path, 2.0, LIFT);
        assert_eq!(curves.len(), path.len());

        for (i, point) in path.points().iter().enumerate() {
            let center = point.position + up() * LIFT;
            assert_relative_eq!((curves.left[i] - center).norm(), 2.0, epsilon = 1e-4);
            assert_relative_eq!((curves.right[i] - center).norm(), 2.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_default_lift_keeps_width_from_centerline() {
        let lift = SimConfig::default().boundary_lift;
        let path = CircleGenerator.generate(1000, 10.0, 120.0);

        for width in [0.1, 0.25, 1.5, 5.0] {
            let curves = BoundaryCurves::generate(&path, width, lift);
            for i in 1..path.len() - 1 {
                let center = path.points()[i].position;
                assert_relative_eq!((curves.left[i] - center).norm(), width, epsilon = 1e-4);
                assert_relative_eq!((curves.right[i] - center).norm(), width, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_circle_right_rail_is_inner() {
        // The seed circle turns towards its right-hand side
        let path = CircleGenerator.generate(360, 10.0, 60.0);
        let curves = BoundaryCurves::generate(&path, 1.0, 0.0);
        let outer = curves.left[90].norm();
        let inner = curves.right[90].norm();
        assert!(outer > inner);
        assert_relative_eq!(outer - inner, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_segment_reuses_previous_side() {
        let path = Path::new(vec![
            PathPoint::new(Vector3::new(0.0, 0.0, 0.0), 0.0),
            PathPoint::new(Vector3::new(1.0, 0.0, 0.0), 1.0),
            PathPoint::new(Vector3::new(1.0, 0.0, 0.0), 2.0),
            PathPoint::new(Vector3::new(1.0, 0.0, 4.0), 3.0),
        ]);
        let curves = BoundaryCurves::generate(&path, 1.0, 0.0);
        // Point 1 -> 2 is degenerate, so point 1 keeps point 0's side
        assert_relative_eq!(curves.right[1], curves.right[0] + Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_width() {
        assert!(BoundaryCurves::generate(&two_point_path(), 0.0, LIFT).is_empty());
        assert!(BoundaryCurves::generate(&Path::empty(), 1.5, LIFT).is_empty());
    }

    #[test]
    fn test_flat_vertices() {
        let curves = BoundaryCurves::generate(&two_point_path(), 1.5, 0.0);
        assert_eq!(curves.left_vertices(), vec![1.5, 0.0, 0.0, 1.5, 0.0, 10.0]);
    }
}
