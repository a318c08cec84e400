use crate::bvh::{traverse_bvh, Bvh};
use crate::error::AssetError;
use crate::math::{Aabb, Mat3, Vec2, Vec3};
use crate::primitives::triangle::{hits_triangle, Triangle};
use crate::ray::{Ray, RayHit};

/// A triangle mesh: vertex arrays, per-triangle index triples, precomputed
/// per-triangle intersection data, and the mesh-local BVH over triangles.
pub struct Mesh {
    pub vertex_positions: Vec<Vec3>,
    pub vertex_normals: Vec<Vec3>,
    pub vertex_uvs: Vec<Vec2>,
    pub position_indices: Vec<[u32; 3]>,
    pub normal_indices: Vec<[u32; 3]>,
    pub uv_indices: Vec<[u32; 3]>,
    pub triangles: Vec<Triangle>,
    pub bvh: Bvh,
    pub aabb: Aabb,
}

impl Mesh {
    /// Builds a `Mesh` from already-decoded arrays, shaped exactly like the
    /// binary mesh file layout's sections (the *reader* that turns bytes
    /// into these arrays is an external collaborator, out of scope here).
    pub fn from_arrays(
        vertex_positions: Vec<Vec3>,
        vertex_normals: Vec<Vec3>,
        vertex_uvs: Vec<Vec2>,
        position_indices: Vec<[u32; 3]>,
        normal_indices: Vec<[u32; 3]>,
        uv_indices: Vec<[u32; 3]>,
    ) -> Result<Mesh, AssetError> {
        let n_positions = vertex_positions.len() as u32;
        for tri in &position_indices {
            for &i in tri {
                if i >= n_positions {
                    return Err(AssetError::IndexOutOfRange {
                        what: "position index",
                        index: i,
                        len: n_positions,
                    });
                }
            }
        }

        let triangle_count = position_indices.len();
        if !normal_indices.is_empty() && normal_indices.len() != triangle_count {
            return Err(AssetError::ArrayLengthMismatch {
                what: "normal_indices",
                expected: triangle_count,
                got: normal_indices.len(),
            });
        }
        if !uv_indices.is_empty() && uv_indices.len() != triangle_count {
            return Err(AssetError::ArrayLengthMismatch {
                what: "uv_indices",
                expected: triangle_count,
                got: uv_indices.len(),
            });
        }

        let mut triangles = Vec::with_capacity(triangle_count);
        let mut aabb = Aabb::EMPTY;
        for (i, tri) in position_indices.iter().enumerate() {
            let a = vertex_positions[tri[0] as usize];
            let b = vertex_positions[tri[1] as usize];
            let c = vertex_positions[tri[2] as usize];
            aabb.grow(a);
            aabb.grow(b);
            aabb.grow(c);

            let ab = b - a;
            let ac = c - a;
            let raw_normal = ab.cross(ac);
            let area_parallelogram = raw_normal.length();
            let normal = if area_parallelogram > 0.0 {
                raw_normal / area_parallelogram
            } else {
                Vec3::Y
            };

            // Affine map from a point `p` in the triangle's plane to
            // barycentric (u, v) such that `p = a + u*ab + v*ac`, via the
            // scalar triple product identity (avoids an explicit 2x2 solve).
            let n_dot_n = raw_normal.length_squared();
            let (row_u, row_v) = if n_dot_n > 0.0 {
                (
                    ac.cross(raw_normal) / n_dot_n,
                    raw_normal.cross(ab) / n_dot_n,
                )
            } else {
                (Vec3::ZERO, Vec3::ZERO)
            };
            let local_to_tangent = Mat3::from_cols(
                Vec3::new(row_u.x, row_v.x, 0.0),
                Vec3::new(row_u.y, row_v.y, 0.0),
                Vec3::new(row_u.z, row_v.z, 0.0),
            );

            triangles.push(Triangle {
                position: a,
                normal,
                local_to_tangent,
                area_parallelogram,
                area_uv: 1.0,
                geo_id: i as u32,
            });
        }

        let aabbs: Vec<Aabb> = position_indices
            .iter()
            .map(|tri| {
                let mut bb = Aabb::EMPTY;
                bb.grow(vertex_positions[tri[0] as usize]);
                bb.grow(vertex_positions[tri[1] as usize]);
                bb.grow(vertex_positions[tri[2] as usize]);
                bb
            })
            .collect();
        let bvh = Bvh::build(&aabbs, 2);

        Ok(Mesh {
            vertex_positions,
            vertex_normals,
            vertex_uvs,
            position_indices,
            normal_indices,
            uv_indices,
            triangles,
            bvh,
            aabb,
        })
    }

    /// Iterative BVH descent over this mesh's triangles (§4.C/§4.E).
    /// Returns whether a (possibly closer) triangle was hit, updates `hit`,
    /// and reports whether the traversal stack overflowed (soft failure).
    pub fn trace(&self, ray: &Ray, hit: &mut RayHit, stack_limit: usize, any_hit: bool) -> (bool, bool) {
        let mut best_hit = *hit;
        let triangles = &self.triangles;
        let leaf_ids = &self.bvh.leaf_ids;

        let (found, best_distance, overflowed) = traverse_bvh(
            &self.bvh,
            ray,
            stack_limit,
            any_hit,
            hit.distance,
            |first, count, best| {
                let mut local_best = best;
                let mut found_here = false;
                for i in 0..count as u32 {
                    let leaf_index = leaf_ids[(first + i) as usize];
                    let triangle = &triangles[leaf_index as usize];
                    let mut candidate = RayHit::with_max_distance(local_best);
                    if hits_triangle(ray, triangle, local_best, &mut candidate) {
                        candidate.id = triangle.geo_id;
                        local_best = candidate.distance;
                        best_hit = candidate;
                        found_here = true;
                        if any_hit {
                            break;
                        }
                    }
                }
                if found_here {
                    Some(local_best)
                } else {
                    None
                }
            },
        );

        if found {
            best_hit.distance = best_distance;
            *hit = best_hit;
        }
        (found, overflowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle_mesh() -> Mesh {
        Mesh::from_arrays(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![],
            vec![],
            vec![[0, 1, 2]],
            vec![],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn hits_the_single_triangle() {
        let mesh = single_triangle_mesh();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        let (found, overflowed) = mesh.trace(&ray, &mut hit, 8, false);
        assert!(found);
        assert!(!overflowed);
        assert!((hit.distance - 5.0).abs() < 1e-4);
    }

    #[test]
    fn misses_outside_triangle() {
        let mesh = single_triangle_mesh();
        let ray = Ray::new(Vec3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        let (found, _) = mesh.trace(&ray, &mut hit, 8, false);
        assert!(!found);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let result = Mesh::from_arrays(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![],
            vec![],
            vec![[0, 1, 9]],
            vec![],
            vec![],
        );
        assert!(matches!(result, Err(AssetError::IndexOutOfRange { .. })));
    }
}
