//! Camera rig: a manually placed camera, or one that trails the agent.

use crate::error::ConfigError;
use crate::math::up;
use crate::playback::AgentState;
use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Derives a chase-camera position behind the agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraFollowController {
    /// Horizontal distance behind the agent
    pub distance: f64,

    /// Height above the agent
    pub height: f64,
}

impl CameraFollowController {
    pub fn new(distance: f64, height: f64) -> Result<Self, ConfigError> {
        ConfigError::positive(distance, ConfigError::InvalidFollowDistance)?;
        if !height.is_finite() {
            return Err(ConfigError::NonFinite("follow_height"));
        }
        Ok(Self { distance, height })
    }

    /// Camera position `distance` behind and `height` above the agent.
    pub fn follow(&self, agent: &AgentState) -> Vector3<f64> {
        let yaw = agent.yaw.to_radians();
        let backward = Vector3::new(-yaw.sin(), 0.0, -yaw.cos());
        let mut position = agent.position + backward * self.distance;
        position.y = agent.position.y + self.height;
        position
    }
}

/// Where the camera is and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vector3<f64>,
    pub target: Vector3<f64>,
}

impl CameraPose {
    /// Right-handed look-at view matrix with +Y up.
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &up(),
        )
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 55.0,
            aspect: 1280.0 / 800.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self) -> Matrix4<f64> {
        Perspective3::new(self.aspect, self.fov_y_degrees.to_radians(), self.near, self.far).to_homogeneous()
    }

    /// Combined `projection * view` for a pose.
    pub fn view_projection(&self, pose: &CameraPose) -> Matrix4<f64> {
        self.matrix() * pose.view_matrix()
    }
}

/// The scene camera.
///
/// In manual mode the position is set from outside and the camera looks at
/// the origin. In follow mode the position is derived from the agent each
/// frame and the camera looks at the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    follow: bool,
    manual_position: Vector3<f64>,
    controller: CameraFollowController,
    pose: CameraPose,
}

impl CameraRig {
    pub fn new(manual_position: Vector3<f64>, controller: CameraFollowController) -> Self {
        Self {
            follow: false,
            manual_position,
            controller,
            pose: CameraPose {
                position: manual_position,
                target: Vector3::zeros(),
            },
        }
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn controller(&self) -> &CameraFollowController {
        &self.controller
    }

    pub fn set_controller(&mut self, controller: CameraFollowController) {
        self.controller = controller;
    }

    /// Switches follow mode. Leaving follow mode returns to the last manual
    /// position.
    pub fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
        if !follow {
            self.pose = CameraPose {
                position: self.manual_position,
                target: Vector3::zeros(),
            };
        }
    }

    /// Places the manual camera. Takes effect immediately unless following.
    pub fn set_manual_position(&mut self, position: Vector3<f64>) {
        self.manual_position = position;
        if !self.follow {
            self.pose.position = position;
        }
    }

    /// Refreshes the pose from the agent when following; otherwise nothing.
    pub fn update(&mut self, agent: &AgentState) {
        if self.follow {
            self.pose = CameraPose {
                position: self.controller.follow(agent),
                target: agent.position,
            };
        }
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn agent(x: f64, y: f64, z: f64, yaw: f64) -> AgentState {
        AgentState {
            position: Vector3::new(x, y, z),
            yaw,
        }
    }

    #[test]
    fn test_follow_behind_yaw_zero() {
        let controller = CameraFollowController::new(8.0, 3.0).unwrap();
        let cam = controller.follow(&agent(1.0, 0.5, 2.0, 0.0));
        assert_relative_eq!(cam, Vector3::new(1.0, 3.5, -6.0), epsilon = 1e-12);
    }

    #[test]
    fn test_follow_behind_yaw_ninety() {
        let controller = CameraFollowController::new(4.0, 1.0).unwrap();
        let cam = controller.follow(&agent(0.0, 0.0, 0.0, 90.0));
        assert_relative_eq!(cam, Vector3::new(-4.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_follow_horizontal_distance() {
        let controller = CameraFollowController::new(6.0, 2.0).unwrap();
        let a = agent(3.0, 0.0, -2.0, -137.0);
        let cam = controller.follow(&a);
        let flat = Vector3::new(cam.x - a.position.x, 0.0, cam.z - a.position.z);
        assert_relative_eq!(flat.norm(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_controller_rejects_bad_distance() {
        assert!(CameraFollowController::new(0.0, 1.0).is_err());
        assert!(CameraFollowController::new(5.0, f64::NAN).is_err());
    }

    #[test]
    fn test_rig_manual_ignores_agent() {
        let controller = CameraFollowController::new(8.0, 3.0).unwrap();
        let mut rig = CameraRig::new(Vector3::new(0.0, 1.0, -6.0), controller);
        rig.update(&agent(5.0, 0.0, 5.0, 45.0));
        assert_eq!(rig.pose().position, Vector3::new(0.0, 1.0, -6.0));
        assert_eq!(rig.pose().target, Vector3::zeros());
    }

    #[test]
    fn test_rig_follow_then_release() {
        let controller = CameraFollowController::new(8.0, 3.0).unwrap();
        let mut rig = CameraRig::new(Vector3::new(0.0, 1.0, -6.0), controller);

        rig.set_follow(true);
        rig.update(&agent(5.0, 0.0, 5.0, 0.0));
        assert_eq!(rig.pose().target, Vector3::new(5.0, 0.0, 5.0));
        assert_relative_eq!(rig.pose().position, Vector3::new(5.0, 3.0, -3.0), epsilon = 1e-12);

        // Manual moves while following are remembered, not applied
        rig.set_manual_position(Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(rig.pose().position, Vector3::new(5.0, 3.0, -3.0), epsilon = 1e-12);

        rig.set_follow(false);
        assert_eq!(rig.pose().position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(rig.pose().target, Vector3::zeros());
    }

    #[test]
    fn test_view_projection_maps_target_to_center() {
        let pose = CameraPose {
            position: Vector3::new(0.0, 1.0, -6.0),
            target: Vector3::zeros(),
        };
        let vp = Projection::default().view_projection(&pose);
        let clip = vp * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-9);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-9);
    }
}
