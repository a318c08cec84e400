use criterion::{black_box, criterion_group, criterion_main, Criterion};

use raytracer::geometry::{Geometry, GeometryType};
use raytracer::light::{AmbientLight, Light};
use raytracer::material::{Brdf, Material};
use raytracer::math::{Quat, Vec3};
use raytracer::ray::Ray;
use raytracer::scene::{Scene, SceneTracer};
use raytracer::shader::SurfaceShader;
use raytracer::transform::Transform;

/// A grid of spheres far enough apart that the BVH has real branching to
/// do, with one directional light for shading benchmarks.
fn grid_scene(spheres_per_axis: u32) -> Scene {
    let material = Material {
        brdf: Brdf::CookTorrance,
        roughness: 0.4,
        ..Material::default()
    };

    let mut geometries = Vec::new();
    let half = spheres_per_axis as f32 / 2.0;
    for x in 0..spheres_per_axis {
        for z in 0..spheres_per_axis {
            let position = Vec3::new(x as f32 - half, 0.0, z as f32 - half) * 3.0;
            geometries.push(Geometry::new(
                GeometryType::Sphere,
                Transform::new(Quat::IDENTITY, position, Vec3::ONE),
                0,
            ));
        }
    }

    let light = Light::directional(Vec3::new(-0.4, -1.0, 0.3), Vec3::ONE, 4.0);
    Scene::build(geometries, vec![light], AmbientLight::default(), vec![material], vec![], vec![]).unwrap()
}

fn bvh_traversal_benchmark(c: &mut Criterion) {
    let scene = grid_scene(8);
    let mut tracer = SceneTracer::new(&scene);

    c.bench_function("scene_bvh_closest_hit_64_spheres", |b| {
        b.iter(|| {
            let mut ray = Ray::new(Vec3::new(0.0, 20.0, 0.0), Vec3::new(0.05, -1.0, 0.05).normalize());
            black_box(tracer.find_closest(&scene, &mut ray))
        })
    });
}

fn shading_loop_benchmark(c: &mut Criterion) {
    let scene = grid_scene(4);
    let mut tracer = SceneTracer::new(&scene);
    let mut surface = SurfaceShader::default();

    c.bench_function("per_pixel_shading_cook_torrance", |b| {
        b.iter(|| {
            let mut ray = Ray::new(Vec3::new(0.0, 20.0, 0.0), Vec3::new(0.02, -1.0, 0.0).normalize());
            if let Some(scene_hit) = tracer.find_closest(&scene, &mut ray) {
                let mut hit = scene_hit.hit;
                let geometry = &scene.geometries[scene_hit.geometry_index as usize];
                let material = &scene.materials[geometry.material_id as usize];
                surface.prepare(ray.direction, &mut hit, material, &scene.textures);
                let mut color = Vec3::ZERO;
                for light in &scene.lights {
                    surface.shade_from_light(light, &scene, &mut tracer, material, &mut color);
                }
                black_box(color);
            }
        })
    });
}

criterion_group!(benches, bvh_traversal_benchmark, shading_loop_benchmark);
criterion_main!(benches);
