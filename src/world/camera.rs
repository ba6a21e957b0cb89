use glam::{Vec2, Vec3, vec3};

use crate::world::polygon::Projector;

/// View-point in world space.
///
/// * Only **yaw** (heading) is simulated – no pitch or roll.
/// * World is Z-up; `pos.z` is eye height.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: Vec3,
    pub yaw: f32, // radians (0 = +X, counter-clockwise)
    pub fov: f32, // horizontal FoV (radians)
}

impl Camera {
    pub fn new(pos: Vec3, yaw: f32, fov: f32) -> Self {
        Self { pos, yaw, fov }
    }

    /// World point → camera space:
    ///  .x = lateral offset (+ right)
    ///  .y = height above the eye (+ up)
    ///  .z = depth along the forward axis
    #[inline]
    pub fn to_cam(&self, p: Vec3) -> Vec3 {
        let d = p - self.pos;
        let (s, c) = self.yaw.sin_cos();
        vec3(d.x * s - d.y * c, d.z, d.x * c + d.y * s)
    }

    #[inline(always)]
    pub fn forward(&self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(c, s)
    }

    #[inline(always)]
    pub fn right(&self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(s, -c)
    }

    /// Move by `forward` units and `side` (strafe), preserving eye-height.
    pub fn step(&mut self, forward: f32, side: f32) {
        let f = self.forward();
        let r = self.right();
        self.pos.x += f.x * forward + r.x * side;
        self.pos.y += f.y * forward + r.y * side;
    }

    /// Rotate around Z-axis (positive = turn left).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
    }

    /// Pixel-per-unit scale for viewport width `w`.
    ///
    /// ```text
    /// focal = w / (2 * tan(fov/2))
    /// ```
    #[inline]
    pub fn screen_scale(&self, w: usize) -> f32 {
        (w as f32) * 0.5 / (self.fov * 0.5).tan()
    }

    #[inline(always)]
    pub fn near(&self) -> f32 {
        0.5
    }

    /// Projector for a `w × h` frame.
    pub fn projector(&self, w: usize, h: usize, perspective: bool) -> Projector {
        Projector {
            half_w: w as f32 * 0.5,
            half_h: h as f32 * 0.5,
            focal: self.screen_scale(w),
            perspective,
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
