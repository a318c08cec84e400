//! Local-space ray/primitive intersection kernels. Every function here
//! assumes the ray has already been localized into the primitive's unit
//! space (§4.B): a quad is the square `|x|,|z| <= 1` at `y = 0`, a box is
//! the cube `[-1, 1]^3`, a sphere is the unit sphere, a tetrahedron has
//! corners at `+-TET_MAX`.

pub mod cuboid;
pub mod quad;
pub mod sphere;
pub mod tetrahedron;
pub mod triangle;

pub use cuboid::{hits_default_box, BoxSide};
pub use quad::hits_default_quad;
pub use sphere::hits_default_sphere;
pub use tetrahedron::hits_default_tetrahedron;
pub use triangle::hits_triangle;

/// Splits a `[0, 1]` UV coordinate pair into a 2x2 checkerboard and reports
/// whether the cell is "on" (opaque) or "off" (treated as a miss when the
/// surface is flagged transparent).
#[inline]
pub fn on_checkerboard(u: f32, v: f32) -> bool {
    let cu = (u * 2.0).floor() as i64;
    let cv = (v * 2.0).floor() as i64;
    (cu + cv) % 2 != 0
}

/// Maps a coordinate in `[-1, 1]` to `[0, 1]`.
#[inline]
pub fn shift_to_normalized(x: f32) -> f32 {
    (x + 1.0) * 0.5
}
