use crate::math::Vec3;

/// Linear RGB color. A plain `Vec3` alias, matching how the teacher crate
/// treats color as "just a vector" (`cpu_tracer.rs`'s gamma-correction step
/// operates on `Vec3` directly rather than a dedicated `Color` newtype).
pub type Color = Vec3;

pub const BLACK: Color = Vec3::ZERO;
pub const WHITE: Color = Vec3::ONE;

/// Reinhard-style tone mapping, applied per channel: `c' = c / (1 + c)`.
/// A black input maps to black (§8 invariant).
#[inline]
pub fn tone_map(c: Color) -> Color {
    if c == BLACK {
        return BLACK;
    }
    c / (Vec3::ONE + c)
}

/// Display gamma correction (`c^(1/gamma)`), applied after tone mapping when
/// writing to an 8-bit output buffer.
#[inline]
pub fn gamma_correct(c: Color, gamma: f32) -> Color {
    Vec3::new(
        c.x.max(0.0).powf(1.0 / gamma),
        c.y.max(0.0).powf(1.0 / gamma),
        c.z.max(0.0).powf(1.0 / gamma),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_map_black_is_black() {
        assert_eq!(tone_map(BLACK), BLACK);
    }

    #[test]
    fn tone_map_is_monotonic_and_bounded_below_one() {
        let a = tone_map(Color::splat(1.0));
        let b = tone_map(Color::splat(100.0));
        assert!(b.x > a.x);
        assert!(b.x < 1.0);
    }
}
