//! A CPU ray tracer: BVH-accelerated scene traversal, a handful of analytic
//! primitives (quad, box, sphere, tetrahedron, triangle mesh), Lambert/
//! Phong/Blinn/Cook-Torrance shading, emissive-quad area lights, image-based
//! lighting, and a rayon-parallel row-band renderer.
//!
//! The entry points most callers want are [`Scene`] (build a scene once),
//! [`Camera`] + [`RendererConfig`] (how to look at it), and either
//! [`raytracer::RayTracer`] (single-threaded) or [`worker::render_parallel`]
//! (rayon row bands) to produce a [`Canvas`].

pub mod bvh;
pub mod camera;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod light;
pub mod material;
pub mod math;
pub mod mesh;
pub mod primitives;
pub mod ray;
pub mod raytracer;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod transform;
pub mod worker;

pub use camera::Camera;
pub use canvas::{Antialias, Canvas};
pub use config::{RenderMode, RendererConfig};
pub use error::{AssetError, SceneBuildError};
pub use raytracer::RayTracer;
pub use scene::{Scene, SceneTracer};
