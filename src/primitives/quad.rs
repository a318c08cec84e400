use super::{on_checkerboard, shift_to_normalized};
use crate::math::{Vec2, Vec3};
use crate::ray::{Ray, RayHit};

/// Intersects the unit quad (`y = 0`, `|x|,|z| <= 1`). Mirrors
/// `hitsDefaultQuad` in the original: a ray parallel to the plane, or
/// originating exactly in it, misses (both degenerate).
pub fn hits_default_quad(ray: &Ray, hit: &mut RayHit, is_transparent: bool) -> bool {
    if ray.direction.y == 0.0 {
        return false;
    }
    if ray.origin.y == 0.0 {
        return false;
    }

    let from_behind = ray.origin.y < 0.0;
    if from_behind == (ray.direction.y < 0.0) {
        return false;
    }

    let t = (ray.origin.y * ray.direction_reciprocal.y).abs();
    if t > hit.distance {
        return false;
    }

    let position = ray.at(t);
    if position.x < -1.0 || position.x > 1.0 || position.z < -1.0 || position.z > 1.0 {
        return false;
    }

    let uv = Vec2::new(
        shift_to_normalized(position.x),
        shift_to_normalized(position.z),
    );

    if is_transparent && on_checkerboard(uv.x, uv.y) {
        return false;
    }

    hit.distance = t;
    hit.position = position;
    hit.normal = Vec3::Y;
    hit.uv = uv;
    hit.uv_coverage = 0.25;
    hit.from_behind = from_behind;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_down_hit_lands_at_center() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(hits_default_quad(&ray, &mut hit, false));
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!((hit.uv.x - 0.5).abs() < 1e-5);
        assert!((hit.uv.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn misses_outside_unit_square() {
        let ray = Ray::new(Vec3::new(5.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(!hits_default_quad(&ray, &mut hit, false));
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(!hits_default_quad(&ray, &mut hit, false));
    }
}
