use crate::math::{Quat, Vec3};

/// Orientation + position + nonuniform scale. `extern_*` maps a local-space
/// quantity into world space; `intern_*` is the inverse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub orientation: Quat,
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            orientation: Quat::IDENTITY,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(orientation: Quat, position: Vec3, scale: Vec3) -> Self {
        Transform {
            orientation,
            position,
            scale,
        }
    }

    /// local-space point -> world-space point.
    #[inline]
    pub fn extern_pos(&self, p: Vec3) -> Vec3 {
        self.orientation * (p * self.scale) + self.position
    }

    /// world-space point -> local-space point.
    #[inline]
    pub fn intern_pos(&self, p: Vec3) -> Vec3 {
        (self.orientation.conjugate() * (p - self.position)) / self.scale
    }

    /// local-space direction -> world-space direction, normalized.
    #[inline]
    pub fn extern_dir(&self, d: Vec3) -> Vec3 {
        (self.orientation * (d * self.scale)).normalize()
    }

    /// world-space direction -> local-space direction, normalized.
    #[inline]
    pub fn intern_dir(&self, d: Vec3) -> Vec3 {
        ((self.orientation.conjugate() * d) / self.scale).normalize()
    }
}
