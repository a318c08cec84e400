use crate::math::{Mat3, Vec2, Vec3};
use crate::ray::{Ray, RayHit};

/// Per-triangle precomputed data used by mesh-local intersection: a plane
/// point/normal for the ray/plane test, and the affine map from a point in
/// the triangle's plane to barycentric `(u, v)`.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub position: Vec3,
    pub normal: Vec3,
    pub local_to_tangent: Mat3,
    pub area_parallelogram: f32,
    pub area_uv: f32,
    /// Index of this triangle within its owning mesh (`RayHit::id` on a hit).
    pub geo_id: u32,
}

/// Intersects one triangle: plane-hit then barycentric inside-test. Fills
/// `hit` only if the hit both lands inside the triangle and improves on
/// `closest_distance`.
pub fn hits_triangle(ray: &Ray, triangle: &Triangle, closest_distance: f32, hit: &mut RayHit) -> bool {
    let mut plane_hit = RayHit::with_max_distance(closest_distance);
    if !ray.hits_plane(triangle.position, triangle.normal, &mut plane_hit) {
        return false;
    }

    let uv = triangle.local_to_tangent * (plane_hit.position - triangle.position);
    if uv.x < 0.0 || uv.y < 0.0 || (uv.x + uv.y) > 1.0 {
        return false;
    }

    hit.distance = plane_hit.distance;
    hit.position = plane_hit.position;
    hit.normal = plane_hit.normal;
    hit.from_behind = plane_hit.from_behind;
    hit.uv = Vec2::new(uv.x, uv.y);
    hit.uv_coverage = triangle.area_parallelogram;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_xy_triangle() -> Triangle {
        // Vertices at (0,0,0), (1,0,0), (0,1,0); plane z=0, normal +Z.
        Triangle {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            local_to_tangent: Mat3::from_cols(Vec3::X, Vec3::Y, Vec3::Z),
            area_parallelogram: 1.0,
            area_uv: 1.0,
            geo_id: 0,
        }
    }

    #[test]
    fn hits_inside_triangle() {
        let triangle = unit_xy_triangle();
        let ray = Ray::new(Vec3::new(0.2, 0.2, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(hits_triangle(&ray, &triangle, f32::INFINITY, &mut hit));
        assert!((hit.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn misses_outside_barycentric_range() {
        let triangle = unit_xy_triangle();
        let ray = Ray::new(Vec3::new(0.9, 0.9, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(!hits_triangle(&ray, &triangle, f32::INFINITY, &mut hit));
    }
}
