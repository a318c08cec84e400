use crate::color::Color;
use crate::error::AssetError;
use crate::math::{Vec2, Vec3};

/// One level of a mip chain: a `width x height` grid of texels covering
/// `[0, 1]^2` in UV space.
#[derive(Clone, Debug)]
pub struct Mip {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<Color>,
}

impl Mip {
    fn texel_area(&self) -> f32 {
        1.0 / (self.width.max(1) as f32 * self.height.max(1) as f32)
    }

    fn texel(&self, x: i64, y: i64) -> Color {
        let w = self.width as i64;
        let h = self.height as i64;
        let cx = x.rem_euclid(w.max(1)) as usize;
        let cy = y.rem_euclid(h.max(1)) as usize;
        self.texels[cy * self.width as usize + cx]
    }

    fn bilinear(&self, u: f32, v: f32) -> Color {
        let fx = u * self.width as f32 - 0.5;
        let fy = v * self.height as f32 - 0.5;
        let x0 = fx.floor() as i64;
        let y0 = fy.floor() as i64;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let top = c00 * (1.0 - tx) + c10 * tx;
        let bottom = c01 * (1.0 - tx) + c11 * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

/// A 2D texture with a precomputed mip chain, or the six faces of a
/// cube map (each face itself carrying its own mip chain).
#[derive(Clone, Debug)]
pub struct Texture {
    faces: Vec<Vec<Mip>>,
    is_cubemap: bool,
}

/// Face order for cube maps: +X, -X, +Y, -Y, +Z, -Z.
const CUBE_FACE_COUNT: usize = 6;

impl Texture {
    pub fn from_mips(mips: Vec<Mip>) -> Result<Texture, AssetError> {
        validate_mip_chain(&mips)?;
        Ok(Texture {
            faces: vec![mips],
            is_cubemap: false,
        })
    }

    pub fn from_cubemap_mips(faces: [Vec<Mip>; CUBE_FACE_COUNT]) -> Result<Texture, AssetError> {
        for face in &faces {
            validate_mip_chain(face)?;
        }
        Ok(Texture {
            faces: faces.into_iter().collect(),
            is_cubemap: true,
        })
    }

    pub fn is_cubemap(&self) -> bool {
        self.is_cubemap
    }

    /// Picks the coarsest mip whose texel footprint is still no larger than
    /// `uv_coverage`, i.e. the least-detailed mip that doesn't lose detail
    /// the ray cone says is actually resolvable (§4.G).
    fn mip_level(mips: &[Mip], uv_coverage: f32) -> usize {
        for level in (0..mips.len()).rev() {
            if mips[level].texel_area() <= uv_coverage {
                return level;
            }
        }
        0
    }

    /// Samples a plain 2D texture (face 0) at `(u, v)` with ray-cone-driven
    /// mip selection.
    pub fn sample(&self, u: f32, v: f32, uv_coverage: f32) -> Color {
        let mips = &self.faces[0];
        let level = Self::mip_level(mips, uv_coverage.max(0.0));
        mips[level].bilinear(u, v)
    }

    /// The mip index `sample` would pick for face 0, exposed for
    /// `RenderMode::MipLevel` debug visualization (§6).
    pub fn mip_level_index(&self, uv_coverage: f32) -> usize {
        Self::mip_level(&self.faces[0], uv_coverage.max(0.0))
    }

    /// Samples a cube map in world direction `d`: picks the face by the
    /// largest-magnitude component, then samples that face's 2D texture.
    pub fn sample_cubemap(&self, d: Vec3, uv_coverage: f32) -> Color {
        debug_assert!(self.is_cubemap);
        let (face, u, v) = cube_face_uv(d);
        let mips = &self.faces[face];
        let level = Self::mip_level(mips, uv_coverage.max(0.0));
        mips[level].bilinear(u, v)
    }
}

fn validate_mip_chain(mips: &[Mip]) -> Result<(), AssetError> {
    if let Some(first) = mips.first() {
        if first.width == 0 || first.height == 0 {
            return Err(AssetError::EmptyTexture {
                width: first.width,
                height: first.height,
            });
        }
    }
    for mip in mips {
        if mip.texels.len() != (mip.width as usize) * (mip.height as usize) {
            return Err(AssetError::ArrayLengthMismatch {
                what: "mip texels",
                expected: (mip.width as usize) * (mip.height as usize),
                got: mip.texels.len(),
            });
        }
    }
    Ok(())
}

/// Face index (0=+X,1=-X,2=+Y,3=-Y,4=+Z,5=-Z) and the UV within that face.
fn cube_face_uv(d: Vec3) -> (usize, f32, f32) {
    let (ax, ay, az) = (d.x.abs(), d.y.abs(), d.z.abs());
    let (face, u, v, ma) = if ax >= ay && ax >= az {
        if d.x > 0.0 {
            (0, -d.z, -d.y, ax)
        } else {
            (1, d.z, -d.y, ax)
        }
    } else if ay >= az {
        if d.y > 0.0 {
            (2, d.x, d.z, ay)
        } else {
            (3, d.x, -d.z, ay)
        }
    } else if d.z > 0.0 {
        (4, d.x, -d.y, az)
    } else {
        (5, -d.x, -d.y, az)
    };
    (face, (u / ma + 1.0) * 0.5, (v / ma + 1.0) * 0.5)
}

#[inline]
pub fn uv_repeat(uv: Vec2, repeat: Vec2) -> Vec2 {
    uv * repeat
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_mip(size: u32, color: Color) -> Mip {
        Mip {
            width: size,
            height: size,
            texels: vec![color; (size * size) as usize],
        }
    }

    #[test]
    fn sample_returns_uniform_color() {
        let tex = Texture::from_mips(vec![flat_mip(4, Color::new(1.0, 0.5, 0.25))]).unwrap();
        let c = tex.sample(0.3, 0.7, 0.01);
        assert!((c.x - 1.0).abs() < 1e-5);
        assert!((c.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn opposite_directions_land_on_opposite_faces() {
        let faces = std::array::from_fn(|i| vec![flat_mip(2, Color::splat(i as f32))]);
        let tex = Texture::from_cubemap_mips(faces).unwrap();
        let (face_pos, _, _) = cube_face_uv(Vec3::X);
        let (face_neg, _, _) = cube_face_uv(-Vec3::X);
        assert_ne!(face_pos, face_neg);
        let _ = tex;
    }

    #[test]
    fn rejects_mismatched_texel_array_length() {
        let bad = Mip {
            width: 4,
            height: 4,
            texels: vec![Color::ZERO; 3],
        };
        assert!(Texture::from_mips(vec![bad]).is_err());
    }
}
