use super::on_checkerboard;
use crate::math::{Vec2, Vec3, SQRT3, TET_MAX, TET_MIN};
use crate::ray::{Ray, RayHit};

/// One face's plane point/normal plus the tangent basis (as three rows)
/// that maps a point on the face into (u, v, _) barycentric-style
/// coordinates. The four tables below are the canonical tetrahedron's faces
/// with corners at `+-TET_MAX`; they are not derivable from a simple
/// formula so are ported verbatim.
struct Face {
    plane_point: Vec3,
    normal: Vec3,
    tangent_rows: [Vec3; 2],
}

fn faces() -> [Face; 4] {
    [
        Face {
            plane_point: Vec3::splat(-TET_MAX),
            normal: Vec3::new(-TET_MAX, TET_MAX, -TET_MAX),
            tangent_rows: [
                Vec3::new(TET_MAX, -TET_MIN, -TET_MAX),
                Vec3::new(TET_MIN, TET_MIN, TET_MAX),
            ],
        },
        Face {
            plane_point: Vec3::splat(-TET_MAX),
            normal: Vec3::new(TET_MAX, -TET_MAX, -TET_MAX),
            tangent_rows: [
                Vec3::new(TET_MIN, TET_MIN, TET_MAX),
                Vec3::new(-TET_MIN, TET_MAX, -TET_MAX),
            ],
        },
        Face {
            plane_point: Vec3::splat(-TET_MAX),
            normal: Vec3::new(-TET_MAX, -TET_MAX, TET_MAX),
            tangent_rows: [
                Vec3::new(-TET_MIN, TET_MAX, -TET_MAX),
                Vec3::new(TET_MAX, -TET_MIN, -TET_MAX),
            ],
        },
        Face {
            plane_point: Vec3::new(TET_MAX, -TET_MAX, TET_MAX),
            normal: Vec3::splat(TET_MAX),
            tangent_rows: [
                Vec3::new(-TET_MAX, TET_MIN, TET_MAX),
                Vec3::new(TET_MIN, TET_MIN, TET_MAX),
            ],
        },
    ]
}

/// Intersects the canonical tetrahedron (corners at `+-TET_MAX`) by testing
/// all four faces as planes and keeping the closest one whose barycentric
/// coordinates land inside the triangle.
pub fn hits_default_tetrahedron(ray: &Ray, hit: &mut RayHit, is_transparent: bool) -> bool {
    let mut found = false;
    let mut current = RayHit::with_max_distance(hit.distance);

    for face in faces() {
        current.distance = hit.distance;
        if !ray.hits_plane(face.plane_point, face.normal, &mut current) {
            continue;
        }

        let rel = current.position - face.plane_point;
        let u = face.tangent_rows[0].dot(rel);
        let v = face.tangent_rows[1].dot(rel);
        if u < 0.0 || v < 0.0 || u + v > 1.0 {
            continue;
        }

        let uv = Vec2::new(u, v);
        if is_transparent && on_checkerboard(uv.x, uv.y) {
            continue;
        }

        if current.distance < hit.distance {
            current.uv = uv;
            current.uv_coverage = SQRT3 / 4.0;
            *hit = current;
            found = true;
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_top_face_from_above() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(hits_default_tetrahedron(&ray, &mut hit, false));
        assert!(hit.distance.is_finite());
    }

    #[test]
    fn misses_ray_that_passes_outside() {
        let ray = Ray::new(Vec3::new(10.0, 10.0, 10.0), Vec3::new(1.0, 0.0, 0.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        assert!(!hits_default_tetrahedron(&ray, &mut hit, false));
    }
}
