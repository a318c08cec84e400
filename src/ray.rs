use crate::math::{Aabb, OctantShifts, Vec2, Vec3};
use crate::transform::Transform;

/// A small forward offset applied to secondary ray origins so a ray doesn't
/// immediately re-hit the surface it just left due to floating point error.
pub const TRACE_OFFSET: f32 = 1e-4;

/// Result of an intersection test, reused across calls: callers seed
/// `distance` with the current closest hit and a test only "wins" if it
/// improves on it.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub distance: f32,
    pub uv_coverage: f32,
    pub cone_width: f32,
    pub cone_width_scaling_factor: f32,
    pub id: u32,
    pub from_behind: bool,
}

impl Default for RayHit {
    fn default() -> Self {
        RayHit {
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            uv: Vec2::ZERO,
            distance: f32::INFINITY,
            uv_coverage: 0.0,
            cone_width: 0.0,
            cone_width_scaling_factor: 1.0,
            id: 0,
            from_behind: false,
        }
    }
}

impl RayHit {
    pub fn with_max_distance(max_distance: f32) -> Self {
        RayHit {
            distance: max_distance,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub scaled_origin: Vec3,
    pub direction: Vec3,
    pub direction_reciprocal: Vec3,
    pub octant_shifts: OctantShifts,
    pub pixel_coords: (u32, u32),
    pub depth: u8,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let mut ray = Ray {
            origin,
            scaled_origin: Vec3::ZERO,
            direction,
            direction_reciprocal: Vec3::ZERO,
            octant_shifts: OctantShifts::default(),
            pixel_coords: (0, 0),
            depth: 0,
        };
        ray.reset(origin, direction);
        ray
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.direction * t + self.origin
    }

    /// Re-derives the cached reciprocal/octant fields after `origin`/`direction`
    /// change; called whenever a ray is localized into a new geometry's space.
    #[inline]
    pub fn reset(&mut self, new_origin: Vec3, new_direction: Vec3) {
        self.origin = new_origin;
        self.direction = new_direction;
        self.direction_reciprocal = Vec3::ONE / new_direction;
        self.scaled_origin = -self.origin * self.direction_reciprocal;
        self.octant_shifts = OctantShifts::from_direction(new_direction);
    }

    /// Transforms a world-space ray into a geometry's local space.
    pub fn localize(world_ray: &Ray, transform: &Transform) -> Ray {
        let inv_scale = Vec3::ONE / transform.scale;
        let inv_rotation = transform.orientation.conjugate();
        let local_origin = inv_scale * (inv_rotation * (world_ray.origin - transform.position));
        let local_direction = inv_scale * (inv_rotation * world_ray.direction);
        let mut local_ray = Ray::new(local_origin, local_direction);
        local_ray.pixel_coords = world_ray.pixel_coords;
        local_ray.depth = world_ray.depth;
        local_ray
    }

    /// Slab test. Returns the entry distance (clamped to 0) if the ray
    /// intersects `aabb` strictly before `hit_distance`.
    #[inline]
    pub fn hits_aabb(&self, aabb: &Aabb, hit_distance: f32) -> Option<f32> {
        let min = [aabb.min.x, aabb.min.y, aabb.min.z];
        let max = [aabb.max.x, aabb.max.y, aabb.max.z];
        let shifts = [
            self.octant_shifts.x,
            self.octant_shifts.y,
            self.octant_shifts.z,
        ];

        let near = Vec3::new(
            if shifts[0] == 0 { min[0] } else { max[0] },
            if shifts[1] == 0 { min[1] } else { max[1] },
            if shifts[2] == 0 { min[2] } else { max[2] },
        );
        let far = Vec3::new(
            if shifts[0] == 0 { max[0] } else { min[0] },
            if shifts[1] == 0 { max[1] } else { min[1] },
            if shifts[2] == 0 { max[2] } else { min[2] },
        );

        let min_t = near * self.direction_reciprocal + self.scaled_origin;
        let max_t = far * self.direction_reciprocal + self.scaled_origin;

        let entry = min_t.max_element().max(0.0);
        let exit = max_t.min_element();
        if entry <= exit {
            Some(entry)
        } else {
            None
        }
    }

    /// Ray/plane intersection; fills `hit` only if it strictly improves on
    /// `hit.distance`. Returns `false` for a parallel ray or a ray that
    /// originated exactly in the plane (both degenerate).
    pub fn hits_plane(&self, plane_origin: Vec3, plane_normal: Vec3, hit: &mut RayHit) -> bool {
        let n_dot_rd = plane_normal.dot(self.direction);
        if n_dot_rd == 0.0 {
            return false;
        }

        let n_dot_rop = plane_normal.dot(plane_origin - self.origin);
        if n_dot_rop == 0.0 {
            return false;
        }

        let ray_faces_plane = n_dot_rd < 0.0;
        let from_behind = n_dot_rop > 0.0;
        if from_behind == ray_faces_plane {
            return false;
        }

        let t = n_dot_rop / n_dot_rd;
        if t > hit.distance {
            return false;
        }

        hit.distance = t;
        hit.position = self.at(t);
        hit.normal = plane_normal;
        hit.from_behind = from_behind;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_aabb_misses_when_ray_points_away() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        let aabb = Aabb::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(ray.hits_aabb(&aabb, f32::INFINITY).is_none());
    }

    #[test]
    fn hits_aabb_enters_at_expected_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let aabb = Aabb::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0));
        let t = ray.hits_aabb(&aabb, f32::INFINITY).expect("should hit");
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn hits_plane_rejects_parallel_ray() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(!ray.hits_plane(Vec3::ZERO, Vec3::Y, &mut hit));
    }
}
