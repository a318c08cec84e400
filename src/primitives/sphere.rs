use super::on_checkerboard;
use crate::math::Vec2;
use crate::ray::{Ray, RayHit};

/// `(4*pi) / 6`: unit sphere surface area divided into six cube-map-style
/// faces, used to derive a uniform per-texel footprint for mip selection.
const UNIT_SPHERE_AREA_OVER_SIX: f32 = 2.094_395_1;

/// Axis-ratio projection: the normal's dominant axis picks a cube face, and
/// the other two components (divided by the dominant one) give the UV
/// within that face. Deliberately not a spherical (lat/long) parameterization
/// — that would distort texel density badly near the poles.
fn uv_on_unit_sphere(n: crate::math::Vec3) -> Vec2 {
    let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
    let (u, v) = if ax >= ay && ax >= az {
        (n.z / ax, n.y / ax)
    } else if ay >= az {
        (n.x / ay, n.z / ay)
    } else {
        (n.x / az, n.y / az)
    };
    Vec2::new((u + 1.0) * 0.5, (v + 1.0) * 0.5)
}

/// Intersects the unit sphere via the standard quadratic form. Mirrors
/// `hitsDefaultSphere`: a near hit behind the ray, or cut out by the
/// transparency checkerboard, falls back to the far hit.
pub fn hits_default_sphere(ray: &Ray, hit: &mut RayHit, is_transparent: bool) -> bool {
    let t_to_closest = -(ray.origin.dot(ray.direction));
    if t_to_closest <= 0.0 {
        return false;
    }

    let direction_squared_length = ray.direction.length_squared();
    let delta_squared = t_to_closest * t_to_closest
        + (1.0 - ray.origin.length_squared()) * direction_squared_length;
    if delta_squared <= 0.0 {
        return false;
    }

    let delta = delta_squared.sqrt();
    let mut t = (t_to_closest - delta) / direction_squared_length;
    if t > hit.distance {
        return false;
    }

    let mut normal = ray.at(t);
    let mut uv = uv_on_unit_sphere(normal);
    let mut from_behind = t <= 0.0 || (is_transparent && on_checkerboard(uv.x, uv.y));

    if from_behind {
        t = (t_to_closest + delta) / direction_squared_length;
        if t <= 0.0 || t > hit.distance {
            return false;
        }
        normal = ray.at(t);
        uv = uv_on_unit_sphere(normal);
        if is_transparent && on_checkerboard(uv.x, uv.y) {
            return false;
        }
        from_behind = true;
    }

    hit.distance = t;
    hit.position = normal;
    hit.normal = normal;
    hit.uv = uv;
    hit.uv_coverage = 1.0 / UNIT_SPHERE_AREA_OVER_SIX;
    hit.from_behind = from_behind;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn hits_unit_sphere_head_on() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(hits_default_sphere(&ray, &mut hit, false));
        assert!((hit.distance - 4.0).abs() < 1e-5);
        assert!((hit.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn misses_when_ray_passes_outside() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(!hits_default_sphere(&ray, &mut hit, false));
    }

    #[test]
    fn misses_when_sphere_behind_ray() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(!hits_default_sphere(&ray, &mut hit, false));
    }
}
