//! Camera: orientation, position, and focal length (§4.J). Right/up/forward
//! are derived from the orientation quaternion rather than stored
//! separately, so there is exactly one source of truth for where the camera
//! points.

use crate::math::{Quat, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub orientation: Quat,
    pub position: Vec3,
    pub focal_length: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            orientation: Quat::IDENTITY,
            position: Vec3::ZERO,
            focal_length: 1.0,
        }
    }
}

impl Camera {
    pub fn new(orientation: Quat, position: Vec3, focal_length: f32) -> Self {
        Camera {
            orientation,
            position,
            focal_length,
        }
    }

    /// A camera at `position` looking towards `target`, with `up` as the
    /// world up hint. `forward` is `-Z` in camera space (OpenGL/original
    /// convention), matching the teacher's `Camera::look_at`.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3, focal_length: f32) -> Self {
        let forward = (target - position).normalize();
        let right = forward.cross(up).normalize();
        let cam_up = right.cross(forward);
        let rotation_matrix = crate::math::Mat3::from_cols(right, cam_up, -forward);
        Camera {
            orientation: Quat::from_mat3(&rotation_matrix),
            position,
            focal_length,
        }
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let camera = Camera::look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0), Vec3::Y, 1.0);
        assert!((camera.forward() - Vec3::Z).length() < 1e-4);
    }
}
