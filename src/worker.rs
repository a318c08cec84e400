//! Parallel frame dispatch (§11.5): splits the canvas into row bands and
//! hands each band to its own [`RayTracer`], so every worker owns
//! independent traversal/shading scratch state and nothing crosses threads
//! except shared, read-only `Scene` data.

use rayon::prelude::*;

use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::config::RendererConfig;
use crate::raytracer::{Projection, RayTracer};
use crate::scene::Scene;

/// Rows per band handed to a single rayon task. Small enough that work
/// steals keep all threads busy even when some rows (e.g. a mirror ball)
/// cost far more than others.
const ROWS_PER_BAND: u32 = 8;

/// Renders `scene` through `camera` into `canvas`, fanning the sample rows
/// out across rayon's thread pool in bands of [`ROWS_PER_BAND`] rows. Each
/// band builds its own [`RayTracer`] (and therefore its own [`SceneTracer`]
/// traversal stacks and [`SurfaceShader`](crate::shader::SurfaceShader)
/// scratch), so no mutable state is shared between bands.
pub fn render_parallel(scene: &Scene, camera: &Camera, config: &RendererConfig, canvas: &mut Canvas) {
    let frame_span = tracing::info_span!("frame", width = canvas.width(), height = canvas.height());
    let _frame_guard = frame_span.enter();

    let projection = Projection::new(camera, canvas);
    let (sample_width, sample_height) = canvas.sample_dimensions();

    let bands: Vec<(u32, u32)> = (0..sample_height)
        .step_by(ROWS_PER_BAND as usize)
        .map(|y0| (y0, (y0 + ROWS_PER_BAND).min(sample_height)))
        .collect();

    let rendered: Vec<(u32, Vec<crate::color::Color>, Vec<f32>)> = bands
        .into_par_iter()
        .map(|(y0, y1)| {
            let tile_span = tracing::debug_span!("tile", y0, y1);
            let _tile_guard = tile_span.enter();

            let mut worker = RayTracer::new(scene);
            let mut colors = Vec::with_capacity((sample_width * (y1 - y0)) as usize);
            let mut depths = Vec::with_capacity((sample_width * (y1 - y0)) as usize);
            for y in y0..y1 {
                let (row_colors, row_depths) = worker.render_row(scene, config, &projection, sample_width, y);
                colors.extend(row_colors);
                depths.extend(row_depths);
            }

            if worker.stack_overflows() > 0 {
                tracing::warn!(
                    overflows = worker.stack_overflows(),
                    y0,
                    y1,
                    "BVH traversal stack overflowed in this tile"
                );
            }

            (y0, colors, depths)
        })
        .collect();

    for (y0, colors, depths) in &rendered {
        let rows = (depths.len() / sample_width as usize) as u32;
        for row in 0..rows {
            let start = (row * sample_width) as usize;
            let end = start + sample_width as usize;
            canvas.fill_sample_row(y0 + row, &colors[start..end], &depths[start..end]);
        }
    }

    canvas.resolve();
    tracing::trace!(bands = rendered.len(), "frame rendered across row bands");
}
