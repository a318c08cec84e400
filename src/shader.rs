//! Per-surface shading (§4.H): normal mapping, BRDF evaluation, direct
//! lighting, analytic emissive-quad area lights, and refraction setup. One
//! `SurfaceShader` is scratch state owned by a single rendering worker and
//! reused hit after hit; nothing here is shared across threads.

use crate::color::{Color, BLACK};
use crate::light::Light;
use crate::material::{blinn_specular, cook_torrance, lambert, phong_specular, Brdf, Material};
use crate::math::{clamped, reflect, Quat, Vec3, ONE_OVER_PI};
use crate::ray::{Ray, RayHit, TRACE_OFFSET};
use crate::scene::{Scene, SceneTracer};
use crate::texture::Texture;
use crate::transform::Transform;

use crate::geometry::GeometryType;
use crate::primitives::{hits_default_quad, hits_default_sphere};

/// Decodes a tangent-space normal map sample (`rgb` in `[0, 1]`) into a unit
/// vector. The `r, b, g` swizzle (not `r, g, b`) matches the source's
/// `decodeNormal`, which stores map-space `y` (up) in the texture's blue
/// channel.
#[inline]
pub(crate) fn decode_normal(sample: Color) -> Vec3 {
    Vec3::new(sample.x, sample.z, sample.y)
        .mul_add(Vec3::splat(2.0), Vec3::splat(-1.0))
        .normalize()
}

/// The rotation that tilts the geometric normal towards a decoded normal-map
/// sample, blended by `magnitude`. Built from the axis perpendicular to both
/// world-up and the sample (`(n.z, 0, -n.x)`), matching `getNormalRotation`.
fn normal_rotation(n: Vec3, magnitude: f32) -> Quat {
    let axis = Vec3::new(n.z, 0.0, -n.x);
    let axis = if axis.length_squared() > 1e-10 {
        axis.normalize()
    } else {
        Vec3::X
    };
    Quat::from_axis_angle(axis, n.y.clamp(-1.0, 1.0).acos() * magnitude)
}

fn sample_texture_slot(material: &Material, slot: usize, textures: &[Texture], uv: crate::math::Vec2, uv_coverage: f32) -> Color {
    if (material.texture_count as usize) > slot {
        textures[material.texture_ids[slot] as usize].sample(uv.x, uv.y, uv_coverage)
    } else {
        BLACK
    }
}

/// The area-light emission vector for a quad (the solid-angle-weighted sum
/// over its four edges, à la Lambert's formula for a polygon's form factor),
/// plus its four world-space corners for the "is the light behind P" test.
/// Mirrors `getAreaLightVector`.
fn area_light_vector(transform: &Transform, p: Vec3) -> (Vec3, [Vec3; 4]) {
    let u = transform.orientation * Vec3::new(transform.scale.x.abs(), 0.0, 0.0);
    let v = transform.orientation * Vec3::new(0.0, 0.0, transform.scale.z.abs());
    let corners = [
        transform.position - u - v,
        transform.position + u - v,
        transform.position + u + v,
        transform.position - u + v,
    ];

    let directions: Vec<Vec3> = corners.iter().map(|&c| (c - p).normalize()).collect();
    let mut sum = Vec3::ZERO;
    for i in 0..4 {
        let a = directions[i];
        let b = directions[(i + 1) % 4];
        let cos_theta = a.dot(b).clamp(-1.0, 1.0);
        sum += a.cross(b) * (cos_theta.acos() * 0.5);
    }
    (sum, corners)
}

/// Per-worker scratch state for shading one surface hit at a time: the
/// local shading frame plus whatever the last BRDF evaluation produced.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceShader {
    /// Shaded point, in world space.
    pub p: Vec3,
    /// Shading normal, in world space (post normal-map rotation).
    pub n: Vec3,
    /// View direction (points away from the surface, towards the camera/prior bounce).
    pub v: Vec3,
    /// Mirror-reflection direction of the incoming ray around `n`.
    pub r: Vec3,
    /// Refraction direction, valid only when `refracted` is true.
    pub rf: Vec3,
    pub albedo_from_map: Color,
    pub refracted: bool,
    pub n_dot_v: f32,

    /// Direction towards the light currently being evaluated.
    pub l: Vec3,
    pub n_dot_l: f32,

    /// Diffuse/specular split from the last `radiance_fraction` call, kept
    /// around so IBL sampling can weight irradiance/radiance separately.
    pub fd: Color,
    pub fs: Color,
}

impl SurfaceShader {
    /// Builds the local shading frame for a fresh hit: normal-map rotation,
    /// view/reflection vectors, albedo sample, and (for refractive
    /// materials) the refracted direction with a total-internal-reflection
    /// check. Mirrors `prepareForShading`.
    pub fn prepare(&mut self, ray_direction: Vec3, hit: &mut RayHit, material: &Material, textures: &[Texture]) {
        if material.has_normal_map() {
            let sample = sample_texture_slot(material, 1, textures, hit.uv, hit.uv_coverage);
            let decoded = decode_normal(sample);
            hit.normal = normal_rotation(decoded, material.normal_magnitude) * hit.normal;
        }

        self.p = hit.position;
        self.n = hit.normal;
        self.v = -ray_direction;
        self.r = reflect(ray_direction, self.n);
        self.n_dot_v = clamped(self.n.dot(self.v));

        self.albedo_from_map = if material.has_albedo_map() {
            sample_texture_slot(material, 0, textures, hit.uv, hit.uv_coverage)
        } else {
            Color::ONE
        };

        self.refracted = material.is_refractive();
        if self.refracted {
            let eta = if hit.from_behind {
                material.ior2_over_ior1
            } else {
                material.ior1_over_ior2
            };
            let c = eta * eta * (1.0 - self.n_dot_v * self.n_dot_v);
            self.refracted = c < 1.0;
            self.rf = if self.refracted {
                (self.n * (eta * self.n_dot_v - (1.0 - c).sqrt()) + ray_direction * eta).normalize()
            } else {
                self.r
            };
        }
    }

    /// Sets `l`/`n_dot_l` (and, for point lights, `ld`/`ld2`) for `light`.
    /// Returns whether the surface faces the light at all.
    fn face_light(&mut self, light: &Light) -> Option<f32> {
        if light.is_directional {
            self.l = -light.position_or_direction;
            self.n_dot_l = clamped(self.n.dot(self.l));
            return if self.n_dot_l > 0.0 { Some(f32::INFINITY) } else { None };
        }

        let to_light = light.position_or_direction - self.p;
        let ld2 = to_light.length_squared();
        let ld = ld2.sqrt();
        self.l = to_light / ld.max(1e-8);
        self.n_dot_l = clamped(self.n.dot(self.l));
        if self.n_dot_l > 0.0 {
            Some(ld2)
        } else {
            None
        }
    }

    /// Evaluates the BRDF named by `material.brdf` for the current `l`/`v`/`n`,
    /// splitting the result into `fd` (diffuse) and `fs` (specular) and
    /// returning their sum. Cook-Torrance follows the original's GGX /
    /// Smith-Schlick / Schlick-Fresnel combination exactly, weighting its
    /// diffuse term by `(1 - metalness)`; the legacy Lambert/Phong/Blinn
    /// lobes instead weight diffuse by `roughness`, matching the original's
    /// non-Cook-Torrance branch.
    pub fn radiance_fraction(&mut self, material: &Material) -> Color {
        let albedo = material.albedo * self.albedo_from_map;
        let legacy_diffuse = albedo * (material.roughness * ONE_OVER_PI);

        match material.brdf {
            Brdf::CookTorrance => {
                let mut fd = lambert(albedo, material.metalness);
                let mut fs = Color::ZERO;
                if self.n_dot_v > 0.0 && self.n_dot_l > 0.0 && material.roughness > 0.0 {
                    let h = (self.l + self.v).normalize();
                    let n_dot_h = clamped(self.n.dot(h));
                    let h_dot_l = clamped(h.dot(self.l));
                    let (specular, fresnel) =
                        cook_torrance(material.roughness, self.n_dot_l, self.n_dot_v, h_dot_l, n_dot_h, material.reflectivity);
                    fd *= Color::ONE - fresnel;
                    fs = specular;
                }
                self.fd = fd;
                self.fs = fs;
                fd + fs
            }
            Brdf::Lambert => {
                self.fd = legacy_diffuse;
                self.fs = Color::ZERO;
                self.fd
            }
            Brdf::Phong => {
                self.fd = legacy_diffuse;
                self.fs = phong_specular(material.reflectivity, clamped(self.r.dot(self.l)), material.roughness);
                self.fd + self.fs
            }
            Brdf::Blinn => {
                let h = (self.l + self.v).normalize();
                self.fd = legacy_diffuse;
                self.fs = blinn_specular(material.reflectivity, clamped(self.n.dot(h)), material.roughness);
                self.fd + self.fs
            }
        }
    }

    /// Direct lighting from one light: skips it entirely if the surface
    /// faces away or a shadow ray finds an occluder. Mirrors `shadeFromLight`.
    pub fn shade_from_light(
        &mut self,
        light: &Light,
        scene: &Scene,
        tracer: &mut SceneTracer,
        material: &Material,
        color: &mut Color,
    ) {
        let Some(ld2) = self.face_light(light) else {
            return;
        };
        let shadow_distance = if ld2.is_finite() { ld2.sqrt() } else { f32::INFINITY };
        if tracer.in_shadow(scene, self.p, self.l, shadow_distance) {
            return;
        }
        let fraction = self.radiance_fraction(material);
        *color += fraction * light.color * (self.n_dot_l * light.intensity / ld2.max(1.0));
    }

    /// Analytic area-light contribution from every emissive quad in the
    /// scene, with a cheap, deliberately approximate occlusion estimate
    /// (sphere and quad occluders attenuate the light by different
    /// heuristics) rather than a full shadow trace per quad. Ported as-is
    /// from `shadeFromEmissiveQuads`; see `DESIGN.md`'s Open Questions.
    pub fn shade_from_emissive_quads(
        &mut self,
        scene: &Scene,
        material: &Material,
        current_geometry_index: u32,
        color: &mut Color,
    ) {
        for (i, quad) in scene.geometries.iter().enumerate() {
            if i as u32 == current_geometry_index {
                continue;
            }
            if quad.geometry_type != GeometryType::Quad {
                continue;
            }
            let quad_material = &scene.materials[quad.material_id as usize];
            if !quad_material.is_emissive() {
                continue;
            }

            let transform = &quad.transform;
            let to_light = transform.position - self.p;
            if self.n.dot(to_light) <= 0.0 {
                continue;
            }
            let facing_hint = transform.orientation * Vec3::new(0.0, -1.0, 1.0);
            if to_light.dot(facing_hint) <= 0.0 {
                continue;
            }

            let (area_vector, corners) = area_light_vector(transform, self.p);
            let emission_intensity = self.n.dot(area_vector);
            if emission_intensity <= 0.0 {
                continue;
            }
            if corners.iter().all(|&c| self.n.dot(c - self.p) < 0.0) {
                continue;
            }

            let l = to_light.normalize();
            let shadow_origin = l.mul_add(Vec3::splat(TRACE_OFFSET), self.p);
            let mut shaded_light = 1.0f32;

            for (s, occluder) in scene.geometries.iter().enumerate() {
                if s == i {
                    continue;
                }
                let local_ray = Ray::localize(&Ray::new(shadow_origin, l), &occluder.transform);
                let mut local_hit = RayHit::with_max_distance(f32::INFINITY);
                let d = match occluder.geometry_type {
                    GeometryType::Sphere => {
                        if hits_default_sphere(&local_ray, &mut local_hit, occluder.is_transparent()) {
                            1.0 - (1.0 - local_hit.distance) / (local_hit.distance * emission_intensity * 3.0)
                        } else {
                            1.0
                        }
                    }
                    GeometryType::Quad => {
                        if hits_default_quad(&local_ray, &mut local_hit, occluder.is_transparent()) {
                            let mut px = local_hit.position.x.abs();
                            let mut pz = local_hit.position.z.abs();
                            if px > pz {
                                std::mem::swap(&mut px, &mut pz);
                            }
                            1.0 - (1.0 - pz) / (local_hit.distance * emission_intensity)
                        } else {
                            1.0
                        }
                    }
                    _ => 1.0,
                };
                if d < shaded_light {
                    shaded_light = d;
                }
                if shaded_light <= 0.0 {
                    break;
                }
            }

            if shaded_light <= 0.0 {
                continue;
            }

            self.l = l;
            self.n_dot_l = clamped(self.n.dot(l));
            if self.n_dot_l <= 0.0 {
                continue;
            }
            let fraction = self.radiance_fraction(material);
            *color += fraction * quad_material.emission * (emission_intensity * shaded_light);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    fn facing_frame() -> SurfaceShader {
        let mut shader = SurfaceShader::default();
        shader.p = Vec3::ZERO;
        shader.n = Vec3::Y;
        shader.v = Vec3::Y;
        shader.n_dot_v = 1.0;
        shader
    }

    #[test]
    fn lambert_radiance_is_pure_diffuse() {
        let mut shader = facing_frame();
        shader.l = Vec3::Y;
        shader.n_dot_l = 1.0;
        let material = Material::default();
        let fraction = shader.radiance_fraction(&material);
        assert_eq!(shader.fs, Color::ZERO);
        assert!(fraction.x > 0.0);
    }

    #[test]
    fn cook_torrance_adds_a_specular_lobe_when_facing_the_light() {
        let mut shader = facing_frame();
        shader.l = Vec3::Y;
        shader.n_dot_l = 1.0;
        let mut material = Material::default();
        material.brdf = Brdf::CookTorrance;
        material.roughness = 0.3;
        shader.radiance_fraction(&material);
        assert!(shader.fs.x > 0.0);
    }

    #[test]
    fn decode_normal_round_trips_straight_up() {
        // r=0.5,g=1.0,b=0.5 decodes (with the r,b,g swizzle) to (0,1,0).
        let n = decode_normal(Color::new(0.5, 0.5, 1.0));
        assert!((n - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn face_light_rejects_light_behind_surface() {
        let mut shader = facing_frame();
        let light = Light::point(Vec3::new(0.0, -5.0, 0.0), Color::ONE, 10.0);
        assert!(shader.face_light(&light).is_none());
    }

    #[test]
    fn sample_texture_slot_is_black_without_enough_textures() {
        let material = Material::default();
        let c = sample_texture_slot(&material, 0, &[], Vec2::ZERO, 0.0);
        assert_eq!(c, BLACK);
    }
}
