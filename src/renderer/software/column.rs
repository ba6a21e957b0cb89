//! Column filler.
//!
//! For one screen column: depth-test the polygon against the depth row, clip
//! the `[top, bottom]` span to the column's visible window, derive per-pixel
//! vertical steps and hand the pixels, bottom first, to a [`Shader`].
//!
//! The four shaders are zero-sized types; the polygon driver is generic over
//! them, so the variant is chosen once per polygon and the inner loops carry
//! no variant branches.

use std::iter::{Rev, StepBy, Take};
use std::slice::IterMut;

use crate::{
    config::{RasterConfig, ZDivide},
    renderer::{
        PolyFlags,
        fixed::Fixed,
        software::{Software, polygon::PolySource},
    },
    world::texture::{ColorMap, LIGHT_LEVELS, Texture},
};

/// Pixels of one column, **bottom to top**.
pub type ColumnPixels<'a> = Rev<Take<StepBy<IterMut<'a, u8>>>>;

/// Vertical interpolation state for one column, starting at the bottom of the
/// visible span.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnSpan {
    pub x: i32,
    /// Visible pixels (> 0).
    pub height: i32,

    pub i0: Fixed,
    pub di: Fixed,
    /// Checkerboard phase of the bottom pixel.
    pub dither: bool,

    pub u0: Fixed,
    pub v0: Fixed,
    pub du: Fixed,
    pub dv: Fixed,

    /// Interpolated `1/z` (perspective mode only).
    pub rz0: f32,
    pub drz: f32,
}

/// Everything a shader reads besides the column itself.
pub struct ShadeCtx<'a> {
    pub colormap: &'a ColorMap,
    pub config: &'a RasterConfig,
    pub src: &'a PolySource<'a>,
}

/// One of the four fill strategies.
pub trait Shader {
    const FLAGS: PolyFlags;
    const SHADED: bool = Self::FLAGS.contains(PolyFlags::SHADED);
    const TEXTURED: bool = Self::FLAGS.contains(PolyFlags::TEXTURED);

    fn draw_column(col: &ColumnSpan, ctx: &ShadeCtx, pixels: ColumnPixels);
}

pub struct FlatColor;
pub struct ShadedColor;
pub struct FlatTexture;
pub struct ShadedTexture;

impl Shader for FlatColor {
    const FLAGS: PolyFlags = PolyFlags::FLAT;

    fn draw_column(_col: &ColumnSpan, ctx: &ShadeCtx, pixels: ColumnPixels) {
        let color = ctx.src.color;
        for px in pixels {
            *px = color;
        }
    }
}

impl Shader for ShadedColor {
    const FLAGS: PolyFlags = PolyFlags::SHADED;

    fn draw_column(col: &ColumnSpan, ctx: &ShadeCtx, pixels: ColumnPixels) {
        let colormap = ctx.colormap;
        let color = ctx.src.color;
        let mut intensity = col.i0;
        let mut dither = col.dither;

        for px in pixels {
            let mut band = intensity.floor();
            if dither {
                let lowered = intensity - Fixed::HALF;
                if lowered >= Fixed::ZERO {
                    band = lowered.floor();
                }
            }
            *px = colormap.shade(band, color);

            intensity += col.di;
            dither = !dither;
        }
    }
}

impl Shader for FlatTexture {
    const FLAGS: PolyFlags = PolyFlags::TEXTURED;

    fn draw_column(col: &ColumnSpan, ctx: &ShadeCtx, pixels: ColumnPixels) {
        let Some(tex) = ctx.src.tex else {
            return;
        };
        // for flat textures the polygon colour selects the light row
        let row = &ctx.colormap[(ctx.src.color as usize).min(LIGHT_LEVELS - 1)];
        texture_column(col, ctx.config, tex, pixels, |texel| row[texel as usize]);
    }
}

impl Shader for ShadedTexture {
    const FLAGS: PolyFlags = PolyFlags::SHADED.union(PolyFlags::TEXTURED);

    fn draw_column(col: &ColumnSpan, ctx: &ShadeCtx, pixels: ColumnPixels) {
        let Some(tex) = ctx.src.tex else {
            return;
        };
        let colormap = ctx.colormap;
        let mut intensity = col.i0;
        texture_column(col, ctx.config, tex, pixels, |texel| {
            let c = colormap.shade(intensity.floor(), texel);
            intensity += col.di;
            c
        });
    }
}

/*──────────────────────── texture coordinate steppers ─────────────────*/

/// Yields the texture coordinate of each pixel, bottom to top.
pub trait UvSource {
    fn next_uv(&mut self) -> (Fixed, Fixed);
}

/// Plain screen-space interpolation (non-perspective mode).
pub struct AffineSteps {
    u: Fixed,
    v: Fixed,
    du: Fixed,
    dv: Fixed,
}

impl UvSource for AffineSteps {
    #[inline(always)]
    fn next_uv(&mut self) -> (Fixed, Fixed) {
        let out = (self.u, self.v);
        self.u += self.du;
        self.v += self.dv;
        out
    }
}

/// Column `1/z` accumulator: 44.20 or `f32`.
pub trait DepthAccum: Copy {
    fn from_f32(v: f32) -> Self;
    fn step(self, d: Self, n: i32) -> Self;
    /// `(u, v) / (1/z)` with a single reciprocal.
    fn divide(self, u: Fixed, v: Fixed) -> (Fixed, Fixed);
}

impl DepthAccum for Fixed {
    #[inline(always)]
    fn from_f32(v: f32) -> Self {
        Fixed::from_f32(v)
    }
    #[inline(always)]
    fn step(self, d: Self, n: i32) -> Self {
        self + d * n
    }
    #[inline(always)]
    fn divide(self, u: Fixed, v: Fixed) -> (Fixed, Fixed) {
        let z = self.recip();
        (u.mul(z), v.mul(z))
    }
}

impl DepthAccum for f32 {
    #[inline(always)]
    fn from_f32(v: f32) -> Self {
        v
    }
    #[inline(always)]
    fn step(self, d: Self, n: i32) -> Self {
        self + d * n as f32
    }
    #[inline(always)]
    fn divide(self, u: Fixed, v: Fixed) -> (Fixed, Fixed) {
        let z = 1.0 / self as f64;
        (Fixed((u.0 as f64 * z) as i64), Fixed((v.0 as f64 * z) as i64))
    }
}

/// Amortised perspective: exact `(u/z) / (1/z)` every `span` pixels, affine
/// in between.  The last span shrinks to whatever is left of the column.
pub struct PerspectiveSteps<Z> {
    /* linear u/z, v/z, 1/z at the far end of the current span */
    u: Fixed,
    v: Fixed,
    z: Z,
    du: Fixed,
    dv: Fixed,
    dz: Z,

    span: i32,
    span_left: i32,
    remaining: i32,

    s: Fixed,
    t: Fixed,
    ds: Fixed,
    dt: Fixed,
    s1: Fixed,
    t1: Fixed,
}

impl<Z: DepthAccum> PerspectiveSteps<Z> {
    pub fn new(col: &ColumnSpan, span: i32) -> Self {
        let span = span.max(1);
        let first = span.min(col.height);

        let z0 = Z::from_f32(col.rz0);
        let dz = Z::from_f32(col.drz);
        let (s0, t0) = z0.divide(col.u0, col.v0);

        let u = col.u0 + col.du * first;
        let v = col.v0 + col.dv * first;
        let z = z0.step(dz, first);
        let (s1, t1) = z.divide(u, v);

        Self {
            u,
            v,
            z,
            du: col.du,
            dv: col.dv,
            dz,
            span,
            span_left: first,
            remaining: col.height,
            s: s0,
            t: t0,
            ds: (s1 - s0) / first,
            dt: (t1 - t0) / first,
            s1,
            t1,
        }
    }

    fn next_span(&mut self) {
        let len = self.span.min(self.remaining);

        self.u += self.du * len;
        self.v += self.dv * len;
        self.z = self.z.step(self.dz, len);

        let (s0, t0) = (self.s1, self.t1);
        let (s1, t1) = self.z.divide(self.u, self.v);
        self.s = s0;
        self.t = t0;
        self.ds = (s1 - s0) / len;
        self.dt = (t1 - t0) / len;
        self.s1 = s1;
        self.t1 = t1;
        self.span_left = len;
    }
}

impl<Z: DepthAccum> UvSource for PerspectiveSteps<Z> {
    #[inline(always)]
    fn next_uv(&mut self) -> (Fixed, Fixed) {
        if self.span_left <= 0 && self.remaining > 0 {
            self.next_span();
        }
        let out = (self.s, self.t);
        self.s += self.ds;
        self.t += self.dt;
        self.span_left -= 1;
        self.remaining -= 1;
        out
    }
}

/// Shared texture loop; perspective mode and divide flavour are resolved
/// here, once per column.
fn texture_column<F>(col: &ColumnSpan, cfg: &RasterConfig, tex: &Texture, pixels: ColumnPixels, shade: F)
where
    F: FnMut(u8) -> u8,
{
    if cfg.perspective_correct {
        let span = cfg.affine_span as i32;
        match cfg.z_divide {
            ZDivide::Fixed => {
                sample_column(PerspectiveSteps::<Fixed>::new(col, span), tex, pixels, shade)
            }
            ZDivide::Float => {
                sample_column(PerspectiveSteps::<f32>::new(col, span), tex, pixels, shade)
            }
        }
    } else {
        let steps = AffineSteps {
            u: col.u0,
            v: col.v0,
            du: col.du,
            dv: col.dv,
        };
        sample_column(steps, tex, pixels, shade);
    }
}

#[inline(always)]
fn sample_column<U, F>(mut uv: U, tex: &Texture, pixels: ColumnPixels, mut shade: F)
where
    U: UvSource,
    F: FnMut(u8) -> u8,
{
    for px in pixels {
        let (s, t) = uv.next_uv();
        *px = shade(tex.texel(s.floor(), t.floor()));
    }
}

/*──────────────────────── column setup ───────────────────────────────*/

impl Software {
    /// Fill column `x` from the current top/bottom edge state.  Returns the
    /// number of pixels written.
    pub(super) fn fill_column<S: Shader>(&mut self, x: i32, src: &PolySource) -> u32 {
        let top = &self.top;
        let bot = &self.bot;
        let col = x as usize;
        let vp = self.viewport;

        /* occluded by nearer geometry, or off the vertical screen range */
        let nearest = if self.config.perspective_correct {
            1.0 / top.z.max(bot.z)
        } else {
            top.z.min(bot.z)
        };
        if !(nearest < self.depth[col]) || top.y_px > vp.max_y || bot.y_px < vp.min_y {
            return 0;
        }

        let win_top = self.clip_bands.top[col].max(vp.min_y);
        let win_bot = self.clip_bands.bot[col].min(vp.max_y);
        let y_top = top.y_px.max(win_top);
        let mut y_bot = bot.y_px;
        let mut y_off = 0;
        if y_bot > win_bot {
            y_off = y_bot - win_bot;
            y_bot = win_bot;
        }

        let height = y_bot - y_top + 1;
        if height <= 0 {
            return 0;
        }

        /* steps use the unclipped span so clipping never bends the gradient */
        let full = (bot.y_px - top.y_px + 1) as f32;
        let off = y_off as f32;
        let mut span = ColumnSpan {
            x,
            height,
            ..ColumnSpan::default()
        };
        if S::SHADED {
            let di = (top.i - bot.i) / full;
            span.di = Fixed::from_f32(di);
            span.i0 = Fixed::from_f32(bot.i + off * di);
            span.dither = ((x & 1) ^ (y_bot & 1)) == 0;
        }
        if S::TEXTURED {
            let duv = (top.uv - bot.uv) / full;
            let uv0 = bot.uv + duv * off;
            span.du = Fixed::from_f32(duv.x);
            span.dv = Fixed::from_f32(duv.y);
            span.u0 = Fixed::from_f32(uv0.x);
            span.v0 = Fixed::from_f32(uv0.y);
            if self.config.perspective_correct {
                span.drz = (top.z - bot.z) / full;
                span.rz0 = bot.z + off * span.drz;
            }
        }

        let stride = self.width;
        let start = y_top as usize * stride + col;
        let pixels = self.scratch[start..]
            .iter_mut()
            .step_by(stride)
            .take(height as usize)
            .rev();
        let ctx = ShadeCtx {
            colormap: &self.colormap,
            config: &self.config,
            src,
        };
        S::draw_column(&span, &ctx, pixels);
        height as u32
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;

    fn persp_column(height: i32) -> ColumnSpan {
        // a receding floor: 1/z falls off quickly towards the top
        ColumnSpan {
            x: 0,
            height,
            u0: Fixed::from_f32(24.0),
            v0: Fixed::from_f32(-3.0),
            du: Fixed::from_f32(-0.375),
            dv: Fixed::from_f32(0.6),
            rz0: 0.9,
            drz: -0.02,
            ..ColumnSpan::default()
        }
    }

    /// Direct per-pixel divide at pixel `k` from the bottom.
    fn exact_at(col: &ColumnSpan, k: i32) -> (Fixed, Fixed) {
        let u = col.u0 + col.du * k;
        let v = col.v0 + col.dv * k;
        let z = Fixed::from_f32(col.rz0) + Fixed::from_f32(col.drz) * k;
        let r = z.recip();
        (u.mul(r), v.mul(r))
    }

    #[test]
    fn span_boundaries_match_direct_division() {
        let col = persp_column(37);
        for n in [1, 4, 8, 16] {
            let mut steps = PerspectiveSteps::<Fixed>::new(&col, n);
            for k in 0..col.height {
                let got = steps.next_uv();
                if k % n == 0 {
                    assert_eq!(got, exact_at(&col, k), "span {n}, pixel {k}");
                }
            }
        }
    }

    #[test]
    fn span_of_one_is_exact_everywhere() {
        let col = persp_column(20);
        let mut steps = PerspectiveSteps::<Fixed>::new(&col, 1);
        for k in 0..col.height {
            assert_eq!(steps.next_uv(), exact_at(&col, k));
        }
    }

    #[test]
    fn last_partial_span_lands_on_column_end() {
        // 10 pixels with span 4: spans of 4, 4, 2
        let col = persp_column(10);
        let mut steps = PerspectiveSteps::<Fixed>::new(&col, 4);
        for _ in 0..8 {
            steps.next_uv();
        }
        assert_eq!(steps.next_uv(), exact_at(&col, 8));
        assert_eq!(steps.span_left, 1);
        // the far end of the short span is the pixel just past the column
        assert_eq!((steps.s1, steps.t1), exact_at(&col, 10));
    }

    #[test]
    fn float_divide_stays_close_to_fixed() {
        let col = persp_column(24);
        let mut fx = PerspectiveSteps::<Fixed>::new(&col, 8);
        let mut fl = PerspectiveSteps::<f32>::new(&col, 8);
        for _ in 0..col.height {
            let (a, b) = (fx.next_uv(), fl.next_uv());
            assert!((a.0.0 - b.0.0).abs() < Fixed::from_f32(0.01).0);
            assert!((a.1.0 - b.1.0).abs() < Fixed::from_f32(0.01).0);
        }
    }

    #[test]
    fn affine_steps_are_linear() {
        let mut steps = AffineSteps {
            u: Fixed::from_int(2),
            v: Fixed::from_int(5),
            du: Fixed::HALF,
            dv: -Fixed::ONE,
        };
        assert_eq!(steps.next_uv(), (Fixed::from_int(2), Fixed::from_int(5)));
        assert_eq!(steps.next_uv(), (Fixed::from_f32(2.5), Fixed::from_int(4)));
    }

    #[test]
    fn shader_flags_are_compile_time() {
        assert!(!FlatColor::SHADED && !FlatColor::TEXTURED);
        assert!(ShadedColor::SHADED && !ShadedColor::TEXTURED);
        assert!(!FlatTexture::SHADED && FlatTexture::TEXTURED);
        assert!(ShadedTexture::SHADED && ShadedTexture::TEXTURED);
    }
}
