//! The ray tracer driver (§4.J): turns a [`Camera`] + [`Canvas`] pair into a
//! per-sample projection, casts primary rays through [`SceneTracer`], and
//! runs the bounce loop that accumulates direct lighting, emissive quads,
//! image-based lighting, and reflection/refraction throughput into a color.

use crate::camera::Camera;
use crate::canvas::{Antialias, Canvas};
use crate::color::{tone_map, Color, BLACK};
use crate::config::{RenderMode, RendererConfig};
use crate::geometry::GeometryType;
use crate::light::LightVolumeShader;
use crate::material::Brdf;
use crate::math::{clamped, fresnel_schlick, Quat, Vec3};
use crate::ray::{Ray, RayHit};
use crate::scene::{Scene, SceneHit, SceneTracer};
use crate::shader::SurfaceShader;

/// The camera/canvas pair resolved into per-sample ray directions and the
/// ray-cone scaling factor, recomputed once per frame. Mirrors
/// `RayTracerProjection::reset`.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub camera_position: Vec3,
    inverse_orientation: Quat,
    start: Vec3,
    right: Vec3,
    down: Vec3,
    squared_distance_to_projection_plane: f32,
    sample_size: f32,
    cx_start: f32,
    cy_start: f32,
}

impl Projection {
    pub fn new(camera: &Camera, canvas: &Canvas) -> Self {
        let h_width = canvas.width() as f32 * 0.5;
        let h_height = canvas.height() as f32 * 0.5;
        let sample_size = match canvas.antialias() {
            Antialias::None => 1.0,
            Antialias::Ssaa => 0.5,
        };

        let distance_to_plane = h_height * camera.focal_length;
        let cx_start = sample_size * 0.5 - h_width;
        let cy_start = h_height - sample_size * 0.5;

        let right_axis = camera.right();
        let up_axis = camera.up();
        let forward_axis = camera.forward();
        let start = right_axis * cx_start + up_axis * cy_start + forward_axis * distance_to_plane;

        Projection {
            camera_position: camera.position,
            inverse_orientation: camera.orientation.conjugate(),
            start,
            right: right_axis * sample_size,
            down: -up_axis * sample_size,
            squared_distance_to_projection_plane: distance_to_plane * distance_to_plane,
            sample_size,
            cx_start,
            cy_start,
        }
    }

    #[inline]
    pub fn direction_for(&self, x: u32, y: u32) -> Vec3 {
        self.start + self.right * (x as f32) + self.down * (y as f32)
    }

    /// `1 / sqrt(|screen-center-to-pixel-center|^2 + d^2)`, the ray-cone
    /// scaling factor the driver seeds every primary hit with (§4.G).
    #[inline]
    pub fn cone_width_scaling_factor_for(&self, x: u32, y: u32) -> f32 {
        let cx = self.cx_start + x as f32 * self.sample_size;
        let cy = self.cy_start - y as f32 * self.sample_size;
        1.0 / (cx * cx + cy * cy + self.squared_distance_to_projection_plane).sqrt()
    }

    /// Depth (the camera-space `z` of a world position), used by
    /// `RenderMode::Depth` and the depth buffer.
    #[inline]
    pub fn depth_at(&self, position: Vec3) -> f32 {
        (self.inverse_orientation * (position - self.camera_position)).z
    }
}

#[inline]
fn direction_to_color(d: Vec3) -> Color {
    (d + Vec3::ONE) * 0.5
}

/// Per-worker rendering state: one scene traversal scratch, one surface
/// shader, one light-volume shader. Never shared across threads (§5).
pub struct RayTracer {
    tracer: SceneTracer,
    surface: SurfaceShader,
    light_volumes: LightVolumeShader,
}

impl RayTracer {
    pub fn new(scene: &Scene) -> Self {
        RayTracer {
            tracer: SceneTracer::new(scene),
            surface: SurfaceShader::default(),
            light_volumes: LightVolumeShader::default(),
        }
    }

    /// How many times this worker's BVH traversal stack has overflowed so
    /// far (soft failure: the overflowing subtree is just skipped).
    pub fn stack_overflows(&self) -> u32 {
        self.tracer.stack_overflows
    }

    /// Renders the whole canvas single-threaded. `worker::render_parallel`
    /// builds on the same per-pixel logic with rayon row bands instead.
    pub fn render(&mut self, scene: &Scene, camera: &Camera, config: &RendererConfig, canvas: &mut Canvas) {
        let frame_span = tracing::info_span!("frame", width = canvas.width(), height = canvas.height());
        let _frame_guard = frame_span.enter();

        let projection = Projection::new(camera, canvas);
        let (sample_width, sample_height) = canvas.sample_dimensions();
        for y in 0..sample_height {
            let (colors, depths) = self.render_row(scene, config, &projection, sample_width, y);
            canvas.fill_sample_row(y, &colors, &depths);
        }
        canvas.resolve();

        if self.tracer.stack_overflows > 0 {
            tracing::warn!(
                overflows = self.tracer.stack_overflows,
                "BVH traversal stack overflowed at least once this frame"
            );
        }
        tracing::trace!(
            closest_hit_rays = self.tracer.closest_hit_rays,
            shadow_rays = self.tracer.shadow_rays,
            "frame ray counts"
        );
    }

    /// Renders one row of samples (used directly by `render` and by each
    /// rayon row-band in `worker.rs`).
    pub fn render_row(
        &mut self,
        scene: &Scene,
        config: &RendererConfig,
        projection: &Projection,
        sample_width: u32,
        y: u32,
    ) -> (Vec<Color>, Vec<f32>) {
        let mut colors = Vec::with_capacity(sample_width as usize);
        let mut depths = Vec::with_capacity(sample_width as usize);
        for x in 0..sample_width {
            let direction = projection.direction_for(x, y);
            let cone_scale = projection.cone_width_scaling_factor_for(x, y);
            let (color, depth) = self.render_pixel(scene, config, projection, direction, cone_scale);
            colors.push(color);
            depths.push(depth);
        }
        (colors, depths)
    }

    /// Traces one primary ray, dispatches on `config.render_mode`, and
    /// returns `(color, depth)`. Mirrors `RayTracer::renderPixel`.
    fn render_pixel(
        &mut self,
        scene: &Scene,
        config: &RendererConfig,
        projection: &Projection,
        direction: Vec3,
        cone_width_scaling_factor: f32,
    ) -> (Color, f32) {
        let mut ray = Ray::new(projection.camera_position, direction.normalize());
        let mut color = BLACK;
        let mut depth = f32::INFINITY;

        match self.tracer.find_closest_with_cone_scale(scene, &mut ray, cone_width_scaling_factor) {
            Some(SceneHit { geometry_index, mut hit }) => {
                let geometry = &scene.geometries[geometry_index as usize];
                let material = &scene.materials[geometry.material_id as usize];
                depth = projection.depth_at(hit.position);

                self.surface.prepare(ray.direction, &mut hit, material, &scene.textures);

                color = match config.render_mode {
                    RenderMode::UVs => Color::new(hit.uv.x, hit.uv.y, 1.0),
                    RenderMode::Depth => Vec3::splat(4.0 / hit.distance.max(1e-4)),
                    RenderMode::Normals => direction_to_color(hit.normal),
                    RenderMode::NormalMap => direction_to_color(if material.has_normal_map() {
                        let sample = scene.textures[material.texture_ids[1] as usize].sample(hit.uv.x, hit.uv.y, hit.uv_coverage);
                        crate::shader::decode_normal(sample)
                    } else {
                        Vec3::Y
                    }),
                    RenderMode::MipLevel => scene
                        .textures
                        .first()
                        .map(|tex| config.mip_level_colors[tex.mip_level_index(hit.uv_coverage)])
                        .unwrap_or(Color::splat(0.5)),
                    RenderMode::Beauty => {
                        if !hit.from_behind && material.is_emissive() {
                            material.emission
                        } else {
                            self.shade_surface(scene, config, &mut ray, hit, geometry_index)
                        }
                    }
                };
            }
            None => {
                if config.render_mode == RenderMode::Beauty {
                    if config.has_skybox_color() {
                        color = scene.textures[config.skybox_color_tex_id as usize].sample_cubemap(ray.direction, 0.0);
                    }
                    self.light_volumes
                        .shade(&scene.lights, projection.camera_position, ray.direction, f32::INFINITY, &mut color);
                }
            }
        }

        if config.render_mode == RenderMode::Beauty && color != BLACK {
            color = tone_map(color);
        }

        (color, depth)
    }

    /// The bounce loop: direct lighting, emissive quads, IBL, and
    /// light-volume glow at each surface, then either terminates or
    /// continues along the reflected/refracted direction with accumulated
    /// throughput. Mirrors `RayTracer::shadePixel`/`shadeSurface`.
    fn shade_surface(
        &mut self,
        scene: &Scene,
        config: &RendererConfig,
        ray: &mut Ray,
        mut hit: RayHit,
        mut geometry_index: u32,
    ) -> Color {
        let cone_scale = hit.cone_width_scaling_factor;
        let mut color = BLACK;
        let mut throughput = Color::ONE;
        let mut bounces_left = config.max_depth;

        loop {
            let geometry = &scene.geometries[geometry_index as usize];
            let material = &scene.materials[geometry.material_id as usize];
            let is_reflective_or_refractive = material.is_reflective() || material.is_refractive();

            let mut current_color = if is_reflective_or_refractive { BLACK } else { scene.ambient_light.color };

            for light in &scene.lights {
                self.surface
                    .shade_from_light(light, scene, &mut self.tracer, material, &mut current_color);
            }

            if scene.has_emissive_quads() {
                self.surface
                    .shade_from_emissive_quads(scene, material, geometry_index, &mut current_color);
            }

            if config.has_skybox_ibl() {
                self.surface.l = self.surface.n;
                self.surface.n_dot_l = 1.0;
                let irradiance = scene.textures[config.skybox_irradiance_tex_id as usize].sample_cubemap(self.surface.n, 0.0);
                let radiance = scene.textures[config.skybox_radiance_tex_id as usize].sample_cubemap(self.surface.r, 0.0);
                self.surface.radiance_fraction(material);
                current_color += irradiance * self.surface.fd + radiance * self.surface.fs;
            }

            color += current_color * throughput;
            self.light_volumes
                .shade(&scene.lights, ray.origin, ray.direction, hit.distance, &mut color);

            bounces_left -= 1;
            if !is_reflective_or_refractive || bounces_left == 0 {
                break;
            }

            let next_direction = if material.is_refractive() { self.surface.rf } else { self.surface.r };

            let next_throughput = if material.brdf == Brdf::CookTorrance {
                let f = fresnel_schlick(clamped(self.surface.n.dot(self.surface.r)), material.reflectivity);
                if self.surface.refracted {
                    Color::ONE - f
                } else {
                    f
                }
            } else if self.surface.refracted {
                material.reflectivity
            } else {
                Color::ONE - material.reflectivity
            };
            throughput *= next_throughput;

            *ray = Ray::new(self.surface.p, next_direction);
            match self.tracer.find_closest_with_cone_scale(scene, ray, cone_scale) {
                Some(SceneHit {
                    geometry_index: next_index,
                    hit: mut next_hit,
                }) => {
                    let next_geometry = &scene.geometries[next_index as usize];
                    let next_material = &scene.materials[next_geometry.material_id as usize];
                    self.surface.prepare(ray.direction, &mut next_hit, next_material, &scene.textures);

                    if next_geometry.geometry_type == GeometryType::Quad && next_material.is_emissive() {
                        color += if next_hit.from_behind { BLACK } else { next_material.emission } * throughput;
                        break;
                    }

                    geometry_index = next_index;
                    hit = next_hit;
                }
                None => {
                    if config.has_skybox_color() {
                        let sky = scene.textures[config.skybox_color_tex_id as usize].sample_cubemap(ray.direction, 0.0);
                        color += sky * throughput;
                    }
                    break;
                }
            }
        }

        color
    }
}
