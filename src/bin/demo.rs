//! Demo CLI: renders a small built-in scene (a floor quad under a shaded
//! sphere, lit by one point light) and writes it out as a PNG.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use raytracer::canvas::Antialias;
use raytracer::config::{RenderMode, RendererConfig};
use raytracer::geometry::{Geometry, GeometryType};
use raytracer::light::{AmbientLight, Light};
use raytracer::material::{Brdf, Material};
use raytracer::math::{Quat, Vec3};
use raytracer::transform::Transform;
use raytracer::{Camera, Canvas, Scene};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliRenderMode {
    Beauty,
    Depth,
    Normals,
    NormalMap,
    MipLevel,
    Uvs,
}

impl From<CliRenderMode> for RenderMode {
    fn from(mode: CliRenderMode) -> Self {
        match mode {
            CliRenderMode::Beauty => RenderMode::Beauty,
            CliRenderMode::Depth => RenderMode::Depth,
            CliRenderMode::Normals => RenderMode::Normals,
            CliRenderMode::NormalMap => RenderMode::NormalMap,
            CliRenderMode::MipLevel => RenderMode::MipLevel,
            CliRenderMode::Uvs => RenderMode::UVs,
        }
    }
}

#[derive(Parser)]
#[command(name = "raytracer-demo")]
#[command(about = "Renders the built-in demo scene to a PNG")]
struct Cli {
    /// Output image width, in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Output image height, in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Maximum reflection/refraction bounce depth.
    #[arg(long, default_value_t = 3)]
    max_depth: u8,

    /// Enables 2x2 supersampling.
    #[arg(long)]
    ssaa: bool,

    /// What to visualize.
    #[arg(long, value_enum, default_value_t = CliRenderMode::Beauty)]
    render_mode: CliRenderMode,

    /// Where to write the rendered PNG.
    #[arg(long, default_value = "demo.png")]
    output: String,
}

fn build_demo_scene() -> Result<Scene> {
    let floor_material = Material {
        albedo: Vec3::new(0.6, 0.6, 0.65),
        roughness: 1.0,
        brdf: Brdf::Lambert,
        ..Material::default()
    };
    let sphere_material = Material {
        albedo: Vec3::new(0.85, 0.2, 0.2),
        reflectivity: Vec3::splat(0.08),
        roughness: 0.35,
        metalness: 0.0,
        brdf: Brdf::CookTorrance,
        ..Material::default()
    };

    let floor = Geometry::new(
        GeometryType::Quad,
        Transform::new(Quat::IDENTITY, Vec3::new(0.0, -1.0, 0.0), Vec3::splat(20.0)),
        0,
    );
    let sphere = Geometry::new(
        GeometryType::Sphere,
        Transform::new(Quat::IDENTITY, Vec3::new(0.0, 0.0, 0.0), Vec3::ONE),
        1,
    );

    let light = Light::point(Vec3::new(4.0, 6.0, -3.0), Vec3::ONE, 80.0);
    let ambient = AmbientLight {
        color: Vec3::splat(0.03),
    };

    Scene::build(
        vec![floor, sphere],
        vec![light],
        ambient,
        vec![floor_material, sphere_material],
        vec![],
        vec![],
    )
    .context("failed to build demo scene")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let scene = build_demo_scene()?;
    let camera = Camera::look_at(Vec3::new(0.0, 1.5, -5.0), Vec3::ZERO, Vec3::Y, 1.0);
    let config = RendererConfig::default()
        .with_max_depth(cli.max_depth)
        .with_render_mode(cli.render_mode.into());

    let antialias = if cli.ssaa { Antialias::Ssaa } else { Antialias::None };
    let mut canvas = Canvas::new(cli.width, cli.height, antialias);

    let start = std::time::Instant::now();
    raytracer::worker::render_parallel(&scene, &camera, &config, &mut canvas);
    tracing::info!(elapsed_ms = start.elapsed().as_secs_f32() * 1000.0, "rendered demo scene");

    let buffer = canvas.to_rgb8(2.2);
    image::save_buffer(
        &cli.output,
        &buffer,
        canvas.width(),
        canvas.height(),
        image::ColorType::Rgb8,
    )
    .with_context(|| format!("failed to write {}", cli.output))?;

    println!("Wrote {}", cli.output);
    Ok(())
}
