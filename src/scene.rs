use crate::bvh::{traverse_bvh, Bvh};
use crate::error::SceneBuildError;
use crate::geometry::{Geometry, GeometryFlags, GeometryType};
use crate::light::{AmbientLight, Light};
use crate::material::Material;
use crate::math::{Aabb, Mat3, Vec3, TET_MAX};
use crate::mesh::Mesh;
use crate::primitives::{hits_default_box, hits_default_quad, hits_default_sphere, hits_default_tetrahedron};
use crate::ray::{Ray, RayHit, TRACE_OFFSET};
use crate::texture::Texture;

const QUAD_VERTICES: [Vec3; 4] = [
    Vec3::new(-1.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(-1.0, 0.0, 1.0),
];

const BOX_VERTICES: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
];

const TET_VERTICES: [Vec3; 4] = [
    Vec3::new(TET_MAX, TET_MAX, TET_MAX),
    Vec3::new(TET_MAX, -TET_MAX, -TET_MAX),
    Vec3::new(-TET_MAX, TET_MAX, -TET_MAX),
    Vec3::new(-TET_MAX, -TET_MAX, TET_MAX),
];

const SPHERE_RING_STEPS: u32 = 24;

/// Owns every scene array plus the derived AABBs/BVH built from the
/// geometries' current transforms (§3). Geometries/materials/meshes are
/// read-only during a frame; the only mutation allowed between frames is
/// updating a geometry's transform and calling [`Scene::refresh`].
pub struct Scene {
    pub geometries: Vec<Geometry>,
    pub lights: Vec<Light>,
    pub ambient_light: AmbientLight,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub meshes: Vec<Mesh>,
    aabbs: Vec<Aabb>,
    bvh: Bvh,
    has_emissive_quads: bool,
}

impl Scene {
    pub fn build(
        geometries: Vec<Geometry>,
        lights: Vec<Light>,
        ambient_light: AmbientLight,
        materials: Vec<Material>,
        textures: Vec<Texture>,
        meshes: Vec<Mesh>,
    ) -> Result<Scene, SceneBuildError> {
        for (i, geo) in geometries.iter().enumerate() {
            if geo.material_id as usize >= materials.len() {
                return Err(SceneBuildError::InvalidMaterialId {
                    geometry_index: i as u32,
                    material_id: geo.material_id,
                    material_count: materials.len() as u32,
                });
            }
            if geo.geometry_type == GeometryType::Mesh && geo.mesh_id as usize >= meshes.len() {
                return Err(SceneBuildError::InvalidMeshId {
                    geometry_index: i as u32,
                    mesh_id: geo.mesh_id,
                    mesh_count: meshes.len() as u32,
                });
            }
        }
        for (i, material) in materials.iter().enumerate() {
            for slot in 0..material.texture_count as usize {
                let texture_id = material.texture_ids[slot];
                if texture_id as usize >= textures.len() {
                    return Err(SceneBuildError::InvalidTextureId {
                        material_index: i as u32,
                        texture_id,
                        texture_count: textures.len() as u32,
                    });
                }
            }
        }

        let has_emissive_quads = geometries.iter().any(|g| {
            g.geometry_type == GeometryType::Quad && materials[g.material_id as usize].is_emissive()
        });

        let mut scene = Scene {
            geometries,
            lights,
            ambient_light,
            materials,
            textures,
            meshes,
            aabbs: Vec::new(),
            bvh: Bvh::build(&[], 1),
            has_emissive_quads,
        };
        scene.refresh();
        Ok(scene)
    }

    /// Whether any quad in the scene is emissive; gates the analytic
    /// area-light pass (§4.H) so scenes without one skip it entirely.
    #[inline]
    pub fn has_emissive_quads(&self) -> bool {
        self.has_emissive_quads
    }

    /// Recomputes AABBs and rebuilds the scene BVH; call after mutating any
    /// geometry's transform. The only scene mutation path between frames.
    pub fn refresh(&mut self) {
        self.update_aabbs();
        self.update_bvh(1);
    }

    fn update_aabbs(&mut self) {
        self.aabbs.clear();
        self.aabbs
            .extend(self.geometries.iter().map(|g| self.geometry_aabb(g)));
    }

    fn geometry_aabb(&self, geo: &Geometry) -> Aabb {
        match geo.geometry_type {
            GeometryType::Quad => aabb_of_vertices(geo, &QUAD_VERTICES),
            GeometryType::Box => aabb_of_vertices(geo, &BOX_VERTICES),
            GeometryType::Tet => aabb_of_vertices(geo, &TET_VERTICES),
            GeometryType::Mesh => {
                let mesh = &self.meshes[geo.mesh_id as usize];
                let corners = [
                    Vec3::new(mesh.aabb.min.x, mesh.aabb.min.y, mesh.aabb.min.z),
                    Vec3::new(mesh.aabb.max.x, mesh.aabb.min.y, mesh.aabb.min.z),
                    Vec3::new(mesh.aabb.max.x, mesh.aabb.max.y, mesh.aabb.min.z),
                    Vec3::new(mesh.aabb.min.x, mesh.aabb.max.y, mesh.aabb.min.z),
                    Vec3::new(mesh.aabb.min.x, mesh.aabb.min.y, mesh.aabb.max.z),
                    Vec3::new(mesh.aabb.max.x, mesh.aabb.min.y, mesh.aabb.max.z),
                    Vec3::new(mesh.aabb.max.x, mesh.aabb.max.y, mesh.aabb.max.z),
                    Vec3::new(mesh.aabb.min.x, mesh.aabb.max.y, mesh.aabb.max.z),
                ];
                aabb_of_vertices(geo, &corners)
            }
            GeometryType::Sphere => sphere_aabb(geo),
        }
    }

    fn update_bvh(&mut self, max_leaf_size: usize) {
        self.bvh = Bvh::build(&self.aabbs, max_leaf_size);
    }

    /// Mesh-local BVH stack bound (§5): the tallest loaded mesh BVH plus 2.
    pub fn mesh_stack_size(&self) -> usize {
        self.meshes
            .iter()
            .map(|m| m.bvh.height as usize)
            .max()
            .unwrap_or(0)
            + 2
    }

    /// Scene BVH stack bound (§5): the scene BVH's height.
    pub fn scene_stack_size(&self) -> usize {
        self.bvh.height as usize + 1
    }
}

fn aabb_of_vertices(geo: &Geometry, vertices: &[Vec3]) -> Aabb {
    let mut aabb = Aabb::EMPTY;
    for &v in vertices {
        aabb.grow(geo.transform.extern_pos(v));
    }
    aabb
}

fn sphere_aabb(geo: &Geometry) -> Aabb {
    let scale = geo.transform.scale;
    if (scale.x - scale.y).abs() < 1e-6 && (scale.x - scale.z).abs() < 1e-6 {
        let r = scale.x.abs();
        return Aabb::from_min_max(
            geo.transform.position - Vec3::splat(r),
            geo.transform.position + Vec3::splat(r),
        );
    }

    let mut aabb = Aabb::EMPTY;
    let rotation = Mat3::from_rotation_y(std::f32::consts::TAU / SPHERE_RING_STEPS as f32);
    let mut orbit = Vec3::new(1.0, 0.0, 0.0);
    for _ in 0..SPHERE_RING_STEPS {
        orbit = rotation * orbit;
        aabb.grow(geo.transform.extern_pos(orbit));
        aabb.grow(geo.transform.extern_pos(Vec3::new(orbit.x, orbit.z, 0.0)));
        aabb.grow(geo.transform.extern_pos(Vec3::new(0.0, orbit.x, orbit.z)));
    }
    aabb
}

/// Per-thread traversal scratch: traversal stacks and shadow/aux ray state
/// (§5). One instance per rendering worker; never shared across threads.
pub struct SceneTracer {
    scene_stack_limit: usize,
    mesh_stack_limit: usize,
    pub stack_overflows: u32,
    pub closest_hit_rays: u64,
    pub shadow_rays: u64,
}

/// Closest-hit result against the scene: which geometry was hit (if any)
/// and the finalized world-space hit record.
pub struct SceneHit {
    pub geometry_index: u32,
    pub hit: RayHit,
}

impl SceneTracer {
    pub fn new(scene: &Scene) -> Self {
        SceneTracer {
            scene_stack_limit: scene.scene_stack_size().max(1),
            mesh_stack_limit: scene.mesh_stack_size().max(1),
            stack_overflows: 0,
            closest_hit_rays: 0,
            shadow_rays: 0,
        }
    }

    /// Any-hit shadow test from `origin` towards `direction`, up to `max_distance`.
    pub fn in_shadow(&mut self, scene: &Scene, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        self.shadow_rays += 1;
        let mut shadow_ray = Ray::new(direction.mul_add(Vec3::splat(TRACE_OFFSET), origin), direction);
        let mut hit = RayHit::with_max_distance(max_distance);
        self.trace(scene, &mut shadow_ray, &mut hit, true).is_some()
    }

    /// Closest-hit scene trace, finalized into world space (§4.F), with the
    /// ray-cone scaling factor defaulted to 1 (used by tests and any trace
    /// that isn't a primary camera ray).
    pub fn find_closest(&mut self, scene: &Scene, ray: &mut Ray) -> Option<SceneHit> {
        self.find_closest_with_cone_scale(scene, ray, 1.0)
    }

    /// Closest-hit scene trace seeded with the driver's per-pixel
    /// `cone_width_scaling_factor` (§4.G), finalized into world space.
    pub fn find_closest_with_cone_scale(
        &mut self,
        scene: &Scene,
        ray: &mut Ray,
        cone_width_scaling_factor: f32,
    ) -> Option<SceneHit> {
        self.closest_hit_rays += 1;
        let mut hit = RayHit::with_max_distance(f32::INFINITY);
        hit.cone_width_scaling_factor = cone_width_scaling_factor;
        let geometry_index = self.trace(scene, ray, &mut hit, false)?;
        self.finalize_hit(scene, &scene.geometries[geometry_index as usize], ray, &mut hit);
        Some(SceneHit { geometry_index, hit })
    }

    fn trace(&mut self, scene: &Scene, ray: &mut Ray, hit: &mut RayHit, any_hit: bool) -> Option<u32> {
        ray.reset(ray.direction.mul_add(Vec3::splat(TRACE_OFFSET), ray.origin), ray.direction);

        let visibility_flag = if any_hit {
            GeometryFlags::SHADOWING
        } else {
            GeometryFlags::VISIBLE
        };

        let mut hit_geometry_index: Option<u32> = None;
        let (_, best_distance, overflowed) = traverse_bvh(
            &scene.bvh,
            ray,
            self.scene_stack_limit,
            any_hit,
            hit.distance,
            |first, count, best| {
                let mut local_best = best;
                let mut found_here = false;
                for i in 0..count as u32 {
                    let geo_index = scene.bvh.leaf_ids[(first + i) as usize];
                    let geo = &scene.geometries[geo_index as usize];
                    if !geo.flags.contains(visibility_flag) {
                        continue;
                    }

                    let local_ray = Ray::localize(ray, &geo.transform);
                    let mut candidate = RayHit::with_max_distance(local_best);
                    let (this_hit, sub_overflowed) = self.hit_geometry_local(scene, geo, &local_ray, &mut candidate);
                    if sub_overflowed {
                        self.stack_overflows += 1;
                    }
                    if this_hit && candidate.distance < local_best {
                        local_best = candidate.distance;
                        *hit = candidate;
                        found_here = true;
                        hit_geometry_index = Some(geo_index);
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

        if overflowed {
            self.stack_overflows += 1;
        }
        hit.distance = best_distance;
        hit_geometry_index
    }

    fn hit_geometry_local(&mut self, scene: &Scene, geo: &Geometry, local_ray: &Ray, hit: &mut RayHit) -> (bool, bool) {
        let is_transparent = geo.is_transparent();
        match geo.geometry_type {
            GeometryType::Quad => (hits_default_quad(local_ray, hit, is_transparent), false),
            GeometryType::Box => (hits_default_box(local_ray, hit, is_transparent).is_some(), false),
            GeometryType::Sphere => (hits_default_sphere(local_ray, hit, is_transparent), false),
            GeometryType::Tet => (hits_default_tetrahedron(local_ray, hit, is_transparent), false),
            GeometryType::Mesh => {
                let mesh = &scene.meshes[geo.mesh_id as usize];
                mesh.trace(local_ray, hit, self.mesh_stack_limit, false)
            }
        }
    }

    /// Applies uv repeat, flips the normal if hit from behind, computes the
    /// ray-cone footprint, and rotates position/normal back to world space
    /// (§4.F). The hit must still be in the geometry's local space.
    fn finalize_hit(&self, scene: &Scene, geometry: &Geometry, world_ray: &Ray, hit: &mut RayHit) {
        let material = &scene.materials[geometry.material_id as usize];
        hit.uv *= material.uv_repeat;
        if hit.from_behind {
            hit.normal = -hit.normal;
        }

        hit.cone_width = hit.distance * hit.cone_width_scaling_factor;
        let n_dot_rd = (-hit.normal.dot(world_ray.direction)).abs().max(1e-4);
        let scale_term = (Vec3::ONE - hit.normal).dot(geometry.transform.scale).abs().max(1e-4);
        hit.uv_coverage *= (hit.cone_width.powi(3))
            / (material.uv_repeat.x.max(1e-4) * material.uv_repeat.y.max(1e-4) * n_dot_rd * scale_term);

        hit.position = world_ray.at(hit.distance);
        hit.normal = geometry.transform.extern_dir(hit.normal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;

    fn unit_sphere_scene() -> Scene {
        let material = Material::default();
        let geo = Geometry::new(
            GeometryType::Sphere,
            Transform::new(crate::math::Quat::IDENTITY, Vec3::new(0.0, 0.0, 5.0), Vec3::ONE),
            0,
        );
        Scene::build(vec![geo], vec![], AmbientLight::default(), vec![material], vec![], vec![]).unwrap()
    }

    #[test]
    fn finds_closest_geometry_head_on() {
        let scene = unit_sphere_scene();
        let mut tracer = SceneTracer::new(&scene);
        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let result = tracer.find_closest(&scene, &mut ray).expect("should hit sphere");
        assert_eq!(result.geometry_index, 0);
        assert!((result.hit.distance - 4.0).abs() < 1e-2);
    }

    #[test]
    fn misses_when_ray_points_away() {
        let scene = unit_sphere_scene();
        let mut tracer = SceneTracer::new(&scene);
        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(tracer.find_closest(&scene, &mut ray).is_none());
    }

    #[test]
    fn shadow_ray_is_occluded_by_the_sphere() {
        let scene = unit_sphere_scene();
        let mut tracer = SceneTracer::new(&scene);
        assert!(tracer.in_shadow(&scene, Vec3::new(0.0, 0.0, 10.0), -Vec3::Z, 100.0));
    }

    #[test]
    fn rejects_invalid_material_id() {
        let geo = Geometry::new(GeometryType::Sphere, Transform::default(), 5);
        let result = Scene::build(vec![geo], vec![], AmbientLight::default(), vec![], vec![], vec![]);
        assert!(matches!(result, Err(SceneBuildError::InvalidMaterialId { .. })));
    }
}
