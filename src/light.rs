use crate::color::Color;
use crate::math::Vec3;

#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub color: Color,
    pub position_or_direction: Vec3,
    pub intensity: f32,
    pub is_directional: bool,
}

impl Light {
    pub fn point(position: Vec3, color: Color, intensity: f32) -> Self {
        Light {
            color,
            position_or_direction: position,
            intensity,
            is_directional: false,
        }
    }

    pub fn directional(direction: Vec3, color: Color, intensity: f32) -> Self {
        Light {
            color,
            position_or_direction: direction.normalize(),
            intensity,
            is_directional: true,
        }
    }
}

/// Constant floor term added to non-reflective, non-refractive surfaces'
/// direct lighting (§3/§4.H.3). Present in every original example scene
/// even though the distilled spec never names it explicitly.
#[derive(Clone, Copy, Debug, Default)]
pub struct AmbientLight {
    pub color: Color,
}

/// Models a light as an inverse-square density ball of radius
/// `intensity / 64` and analytically integrates the density a ray travels
/// through it (§4.I). Reused per-ray as per-thread scratch state.
#[derive(Clone, Copy, Debug, Default)]
pub struct LightVolumeShader {
    b: f32,
    c: f32,
    t_near: f32,
    t_far: f32,
    t_max: f32,
}

impl LightVolumeShader {
    fn hit(&mut self, ray_origin: Vec3, ray_direction: Vec3, target: Vec3, inverse_scale: f32) -> bool {
        let rc = (target - ray_origin) * inverse_scale;
        self.b = ray_direction.dot(rc);
        self.c = rc.length_squared() - 1.0;
        let h = self.b * self.b - self.c;
        if h < 0.0 {
            return false;
        }
        let h = h.sqrt();
        self.t_near = self.b - h;
        self.t_far = self.b + h;
        self.t_far > 0.0 && self.t_near < self.t_max
    }

    fn volume_density(&self) -> f32 {
        let t1 = self.t_near.max(0.0);
        let t2 = self.t_far.min(self.t_max);
        let integral = |t: f32| self.c * t - self.b * t * t + t * t * t / 3.0;
        (integral(t1) - integral(t2)) * (3.0 / 4.0)
    }

    /// Accumulates every light's volumetric glow along `[0, max_distance]`
    /// of the ray into `color`. Returns whether anything was hit.
    pub fn shade(
        &mut self,
        lights: &[Light],
        ray_origin: Vec3,
        ray_direction: Vec3,
        max_distance: f32,
        color: &mut Color,
    ) -> bool {
        let mut hit_any = false;
        for light in lights {
            if light.is_directional {
                continue;
            }
            let scale = light.intensity / 64.0;
            if scale <= 0.0 {
                continue;
            }
            let inverse_scale = 1.0 / scale;
            self.t_max = max_distance * inverse_scale;
            if self.hit(ray_origin, ray_direction, light.position_or_direction, inverse_scale) {
                hit_any = true;
                let density = self.volume_density();
                *color += light.color * (density.max(0.0).powf(8.0) * 4.0);
            }
        }
        hit_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_light_center_adds_glow() {
        let light = Light::point(Vec3::new(0.0, 0.0, 5.0), Color::ONE, 64.0);
        let mut shader = LightVolumeShader::default();
        let mut color = Color::ZERO;
        let hit = shader.shade(&[light], Vec3::ZERO, Vec3::Z, 100.0, &mut color);
        assert!(hit);
        assert!(color.x > 0.0);
    }

    #[test]
    fn directional_lights_have_no_volume() {
        let light = Light::directional(Vec3::Z, Color::ONE, 64.0);
        let mut shader = LightVolumeShader::default();
        let mut color = Color::ZERO;
        let hit = shader.shade(&[light], Vec3::ZERO, Vec3::Z, 100.0, &mut color);
        assert!(!hit);
        assert_eq!(color, Color::ZERO);
    }
}
