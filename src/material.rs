use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::Color;

pub const MAX_MATERIAL_TEXTURES: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Brdf {
    Lambert,
    Phong,
    Blinn,
    CookTorrance,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MaterialFlags: u16 {
        const EMISSIVE            = 1 << 0;
        const REFLECTIVE          = 1 << 1;
        const REFRACTIVE          = 1 << 2;
        const HAS_ALBEDO_MAP      = 1 << 3;
        const HAS_NORMAL_MAP      = 1 << 4;
        const HAS_TRANSPARENT_UV  = 1 << 5;
    }
}

/// Index of air divided by the world's default IOR (1.0); kept as a named
/// constant so IOR ratios read the same way the original's `IOR_AIR` does.
pub const IOR_AIR: f32 = 1.0;

#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub albedo: Color,
    pub reflectivity: Color,
    pub emission: Color,
    pub uv_repeat: crate::math::Vec2,
    pub roughness: f32,
    pub metalness: f32,
    pub normal_magnitude: f32,
    /// `ior1/ior2` (air -> material), precomputed so refraction doesn't
    /// divide per hit.
    pub ior1_over_ior2: f32,
    /// `ior2/ior1` (material -> air).
    pub ior2_over_ior1: f32,
    pub brdf: Brdf,
    pub flags: MaterialFlags,
    pub texture_ids: [u32; MAX_MATERIAL_TEXTURES],
    pub texture_count: u8,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            albedo: Color::splat(1.0),
            reflectivity: Color::splat(0.04),
            emission: Color::ZERO,
            uv_repeat: crate::math::Vec2::ONE,
            roughness: 1.0,
            metalness: 0.0,
            normal_magnitude: 1.0,
            ior1_over_ior2: 1.0,
            ior2_over_ior1: 1.0,
            brdf: Brdf::Lambert,
            flags: MaterialFlags::empty(),
            texture_ids: [0; MAX_MATERIAL_TEXTURES],
            texture_count: 0,
        }
    }
}

impl Material {
    /// Sets both IOR ratio fields from a single index-of-refraction,
    /// matching the source's `IOR_AIR / material.IOR` / inverse pattern.
    pub fn with_ior(mut self, ior: f32) -> Self {
        self.ior1_over_ior2 = IOR_AIR / ior;
        self.ior2_over_ior1 = ior / IOR_AIR;
        self
    }

    #[inline]
    pub fn is_emissive(&self) -> bool {
        self.flags.contains(MaterialFlags::EMISSIVE)
    }

    #[inline]
    pub fn is_reflective(&self) -> bool {
        self.flags.contains(MaterialFlags::REFLECTIVE)
    }

    #[inline]
    pub fn is_refractive(&self) -> bool {
        self.flags.contains(MaterialFlags::REFRACTIVE)
    }

    #[inline]
    pub fn has_albedo_map(&self) -> bool {
        self.flags.contains(MaterialFlags::HAS_ALBEDO_MAP)
    }

    #[inline]
    pub fn has_normal_map(&self) -> bool {
        self.flags.contains(MaterialFlags::HAS_NORMAL_MAP)
    }

    #[inline]
    pub fn has_transparent_uv(&self) -> bool {
        self.flags.contains(MaterialFlags::HAS_TRANSPARENT_UV)
    }
}

/// GGX (Trowbridge-Reitz) normal distribution function.
#[inline]
pub fn ggx_ndf(roughness: f32, n_dot_h: f32) -> f32 {
    let alpha = roughness * roughness;
    let alpha2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (alpha2 - 1.0) + 1.0;
    alpha2 / (std::f32::consts::PI * denom * denom).max(1e-8)
}

/// Smith-Schlick geometry (visibility) term.
#[inline]
pub fn ggx_smith_schlick(roughness: f32, n_dot_l: f32, n_dot_v: f32) -> f32 {
    let k = roughness / 2.0;
    let g1 = |n_dot_x: f32| n_dot_x / (n_dot_x * (1.0 - k) + k).max(1e-8);
    g1(n_dot_l) * g1(n_dot_v)
}

/// Cook-Torrance specular term `D*G*F / (4*NdotV)`, also returning the
/// Fresnel term so callers can reuse it for the diffuse energy split.
pub fn cook_torrance(
    roughness: f32,
    n_dot_l: f32,
    n_dot_v: f32,
    h_dot_l: f32,
    n_dot_h: f32,
    reflectivity: Color,
) -> (Color, Color) {
    let d = ggx_ndf(roughness, n_dot_h);
    let g = ggx_smith_schlick(roughness, n_dot_l, n_dot_v);
    let f = crate::math::fresnel_schlick(h_dot_l, reflectivity);
    let specular = f * (d * g / (4.0 * n_dot_v).max(1e-8));
    (specular, f)
}

/// Lambertian diffuse term, metalness-weighted so metals keep none of it.
/// Used only by the Cook-Torrance branch; the legacy Lambert/Phong/Blinn
/// lobes weight diffuse by `roughness` instead (see [`crate::shader`]).
#[inline]
pub fn lambert(albedo: Color, metalness: f32) -> Color {
    albedo * ((1.0 - metalness) * crate::math::ONE_OVER_PI)
}

/// Phong specular lobe around the mirror direction `R`, fixed exponent 4.
pub fn phong_specular(reflectivity: Color, r_dot_l: f32, roughness: f32) -> Color {
    if r_dot_l <= 0.0 {
        return Color::ZERO;
    }
    reflectivity * (r_dot_l.powi(4) * (1.0 - roughness))
}

/// Blinn-Phong specular lobe around the half vector `H`, fixed exponent 16.
pub fn blinn_specular(reflectivity: Color, n_dot_h: f32, roughness: f32) -> Color {
    if n_dot_h <= 0.0 {
        return Color::ZERO;
    }
    reflectivity * (n_dot_h.powi(16) * (1.0 - roughness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_is_lambert_and_not_flagged() {
        let m = Material::default();
        assert_eq!(m.brdf, Brdf::Lambert);
        assert!(!m.is_emissive());
        assert!(!m.is_reflective());
    }

    #[test]
    fn with_ior_sets_reciprocal_ratios() {
        let m = Material::default().with_ior(1.5);
        assert!((m.ior1_over_ior2 - (1.0 / 1.5)).abs() < 1e-6);
        assert!((m.ior2_over_ior1 - 1.5).abs() < 1e-6);
    }

    #[test]
    fn ggx_ndf_peaks_at_normal_incidence_for_low_roughness() {
        let peak = ggx_ndf(0.1, 1.0);
        let off_axis = ggx_ndf(0.1, 0.5);
        assert!(peak > off_axis);
    }
}
