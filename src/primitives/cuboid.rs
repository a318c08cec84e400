use super::{on_checkerboard, shift_to_normalized};
use crate::math::Vec2;
use crate::ray::{Ray, RayHit};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxSide {
    Left,
    Right,
    Bottom,
    Top,
    Back,
    Front,
}

impl BoxSide {
    #[inline]
    fn normal(self) -> crate::math::Vec3 {
        use crate::math::Vec3;
        match self {
            BoxSide::Left => Vec3::new(-1.0, 0.0, 0.0),
            BoxSide::Right => Vec3::new(1.0, 0.0, 0.0),
            BoxSide::Bottom => Vec3::new(0.0, -1.0, 0.0),
            BoxSide::Top => Vec3::new(0.0, 1.0, 0.0),
            BoxSide::Back => Vec3::new(0.0, 0.0, -1.0),
            BoxSide::Front => Vec3::new(0.0, 0.0, 1.0),
        }
    }

    #[inline]
    fn uv_of(self, x: f32, y: f32, z: f32) -> Vec2 {
        match self {
            BoxSide::Left | BoxSide::Right => {
                Vec2::new(shift_to_normalized(z), shift_to_normalized(y))
            }
            BoxSide::Bottom | BoxSide::Top => {
                Vec2::new(shift_to_normalized(x), shift_to_normalized(z))
            }
            BoxSide::Back | BoxSide::Front => {
                Vec2::new(shift_to_normalized(x), shift_to_normalized(y))
            }
        }
    }
}

struct AxisHit {
    t: f32,
    side_neg: BoxSide,
    side_pos: BoxSide,
    is_positive: bool,
}

/// Intersects the unit box `[-1, 1]^3` via the slab method. On a transparent
/// surface whose near-hit texel is cut out by the checkerboard mask, retries
/// against the far hit before giving up, matching the original's fallback.
pub fn hits_default_box(ray: &Ray, hit: &mut RayHit, is_transparent: bool) -> Option<BoxSide> {
    let axes: [(f32, f32, BoxSide, BoxSide); 3] = [
        (ray.origin.x, ray.direction_reciprocal.x, BoxSide::Left, BoxSide::Right),
        (ray.origin.y, ray.direction_reciprocal.y, BoxSide::Bottom, BoxSide::Top),
        (ray.origin.z, ray.direction_reciprocal.z, BoxSide::Back, BoxSide::Front),
    ];

    let mut near = AxisHit {
        t: f32::NEG_INFINITY,
        side_neg: BoxSide::Left,
        side_pos: BoxSide::Right,
        is_positive: false,
    };
    let mut far = AxisHit {
        t: f32::INFINITY,
        side_neg: BoxSide::Left,
        side_pos: BoxSide::Right,
        is_positive: false,
    };

    for (origin, rcp, side_neg, side_pos) in axes {
        let t1 = (-1.0 - origin) * rcp;
        let t2 = (1.0 - origin) * rcp;
        let (axis_near, axis_far, near_is_pos, far_is_pos) = if t1 <= t2 {
            (t1, t2, false, true)
        } else {
            (t2, t1, true, false)
        };
        if axis_near > near.t {
            near = AxisHit {
                t: axis_near,
                side_neg,
                side_pos,
                is_positive: near_is_pos,
            };
        }
        if axis_far < far.t {
            far = AxisHit {
                t: axis_far,
                side_neg,
                side_pos,
                is_positive: far_is_pos,
            };
        }
    }

    if far.t < 0.0 {
        return None;
    }
    if near.t > hit.distance || far.t < near.t.max(0.0) {
        return None;
    }

    let from_behind = near.t < 0.0;
    let (t, axis_hit) = if from_behind {
        if far.t > hit.distance {
            return None;
        }
        (far.t, &far)
    } else {
        (near.t, &near)
    };

    let mut side = if axis_hit.is_positive {
        axis_hit.side_pos
    } else {
        axis_hit.side_neg
    };
    let mut position = ray.at(t);
    let mut uv = side.uv_of(position.x, position.y, position.z);

    if is_transparent && on_checkerboard(uv.x, uv.y) {
        if from_behind || far.t > hit.distance {
            return None;
        }
        let far_side = if far.is_positive { far.side_pos } else { far.side_neg };
        position = ray.at(far.t);
        uv = far_side.uv_of(position.x, position.y, position.z);
        if on_checkerboard(uv.x, uv.y) {
            return None;
        }
        side = far_side;
        hit.distance = far.t;
        hit.position = position;
        hit.normal = side.normal();
        hit.uv = uv;
        hit.uv_coverage = 0.25;
        hit.from_behind = true;
        return Some(side);
    }

    hit.distance = t;
    hit.position = position;
    hit.normal = side.normal();
    hit.uv = uv;
    hit.uv_coverage = 0.25;
    hit.from_behind = from_behind;
    Some(side)
}
