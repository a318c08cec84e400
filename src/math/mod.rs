//! Vector/quaternion algebra on top of `glam`, plus the handful of
//! free functions the tracer needs that `glam` doesn't provide directly.

mod aabb;

pub use aabb::Aabb;
pub use glam::{Mat3, Quat, Vec2, Vec3};

/// `origin - color * t`; the scaled-origin trick used throughout the slab test
/// so traversal can reuse `direction_reciprocal` without re-dividing per axis.
#[inline]
pub fn scale_add(direction: Vec3, t: f32, origin: Vec3) -> Vec3 {
    direction * t + origin
}

/// Reflects `d` (assumed to point *into* the surface) around `normal`.
#[inline]
pub fn reflect(d: Vec3, normal: Vec3) -> Vec3 {
    d - normal * (2.0 * d.dot(normal))
}

/// Schlick's approximation to the Fresnel term, per channel.
#[inline]
pub fn fresnel_schlick(cos_theta: f32, r0: Vec3) -> Vec3 {
    let m = (1.0 - cos_theta).clamp(0.0, 1.0);
    let m2 = m * m;
    let m5 = m2 * m2 * m;
    r0 + (Vec3::ONE - r0) * m5
}

/// Clamps a dot product to `[0, inf)`, matching the source's `clampedValue`
/// (negative contributions are physically meaningless here).
#[inline]
pub fn clamped(x: f32) -> f32 {
    x.max(0.0)
}

/// Which octant a direction vector points into, expressed as a 0/1 shift per
/// axis (1 when the component is negative). Used to pick the near/far slab
/// plane without branching per axis during AABB traversal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OctantShifts {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl OctantShifts {
    #[inline]
    pub fn from_direction(d: Vec3) -> Self {
        Self {
            x: (d.x < 0.0) as usize,
            y: (d.y < 0.0) as usize,
            z: (d.z < 0.0) as usize,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            x: 1 - self.x,
            y: 1 - self.y,
            z: 1 - self.z,
        }
    }
}

pub const ONE_OVER_PI: f32 = std::f32::consts::FRAC_1_PI;
pub const SQRT3: f32 = 1.732_050_8;
/// `1/sqrt(3)`, the extremum coordinate of the canonical tetrahedron's
/// corners (matches the original's `_0577` constant).
pub const TET_MAX: f32 = 0.577_350_26;
pub const TET_MIN: f32 = 0.288_675_13;
