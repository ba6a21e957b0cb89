//! ---------------------------------------------------------------------------
//! Column-walking software (CPU) polygon renderer
//!
//! * Fills an 8-bit, palette-indexed frame buffer (stride = frame width).
//! * Relies on earlier occlusion passes (walls, sprites) to narrow the
//!   per-column clip bands and depth row; polygons only read them.
//! * One `Software` per render thread.  Every fill takes `&mut self`, so a
//!   context never runs two fills at once.
//! ---------------------------------------------------------------------------

use crate::{
    config::RasterConfig,
    renderer::{DrawCall, Renderer},
    world::texture::ColorMap,
};

mod column;
mod edge;
mod polygon;

pub use column::{ColumnSpan, FlatColor, FlatTexture, Shader, ShadedColor, ShadedTexture};
pub use edge::{EdgeState, EdgeWalker, Step};
pub use polygon::PolyInput;

/*───────────────────────────────────────────────────────────────────────*/
/*                         Per-frame collaborators                       */
/*───────────────────────────────────────────────────────────────────────*/

/// Per-column visible window, inclusive rows `top[x] ..= bot[x]`.
#[derive(Default)]
pub struct ClipBands {
    pub top: Vec<i32>,
    pub bot: Vec<i32>,
}

/// Inclusive screen rectangle polygons may touch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

/// Counters reset by `begin_frame`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub polys_drawn: u32,
    pub polys_rejected: u32,
    pub columns: u32,
    pub pixels: u64,
}

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

#[derive(Default)]
pub struct Software {
    scratch: Vec<u8>,
    clip_bands: ClipBands,
    /// Nearest camera depth already drawn, one per column.  Polygons compare
    /// `1/max(z)` against it in perspective mode, `min(z)` otherwise.
    depth: Vec<f32>,
    viewport: Viewport,
    colormap: ColorMap,
    config: RasterConfig,
    stats: FrameStats,
    clear_index: u8,

    /* edge state of the polygon being filled */
    top: EdgeWalker,
    bot: EdgeWalker,

    width: usize,
    height: usize,
}

impl Software {
    pub fn new(config: RasterConfig) -> Self {
        let mut sw = Self::default();
        sw.set_config(config);
        sw
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    pub fn set_config(&mut self, mut config: RasterConfig) {
        config.sanitize();
        self.config = config;
    }

    pub fn set_colormap(&mut self, colormap: ColorMap) {
        self.colormap = colormap;
    }

    /// Palette index used to clear the frame in `begin_frame`.
    pub fn set_clear_index(&mut self, idx: u8) {
        self.clear_index = idx;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Restrict fills to `vp`, intersected with the frame.
    pub fn set_viewport(&mut self, vp: Viewport) {
        self.viewport = Viewport {
            min_x: vp.min_x.max(0),
            max_x: vp.max_x.min(self.width as i32 - 1),
            min_y: vp.min_y.max(0),
            max_y: vp.max_y.min(self.height as i32 - 1),
        };
    }

    pub fn clip_bands_mut(&mut self) -> &mut ClipBands {
        &mut self.clip_bands
    }

    pub fn depth_mut(&mut self) -> &mut [f32] {
        &mut self.depth
    }

    pub fn frame(&self) -> &[u8] {
        &self.scratch
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Convenience for tests and tools: read one pixel.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.scratch[y * self.width + x]
    }
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize) {
        // (re)allocate if resolution changed
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
            self.clip_bands.top.resize(w, 0);
            self.clip_bands.bot.resize(w, 0);
            self.depth.resize(w, f32::INFINITY);
        }

        self.scratch.fill(self.clear_index);

        /* fully open windows at start of frame */
        self.clip_bands.top.fill(0);
        self.clip_bands.bot.fill(h as i32 - 1);
        self.depth.fill(f32::INFINITY);

        self.viewport = Viewport {
            min_x: 0,
            max_x: w as i32 - 1,
            min_y: 0,
            max_y: h as i32 - 1,
        };
        self.stats = FrameStats::default();
        log::debug!("begin_frame {w}x{h}");
    }

    fn draw_poly(&mut self, call: &DrawCall) {
        match *call {
            DrawCall::FlatColor { verts, color } => {
                self.fill_flat_color(verts, color);
            }
            DrawCall::ShadedColor {
                verts,
                intensity,
                color,
            } => {
                self.fill_shaded_color(verts, intensity, color);
            }
            DrawCall::FlatTexture {
                verts,
                uv,
                tex,
                light,
            } => {
                self.fill_flat_texture(verts, uv, tex, light);
            }
            DrawCall::ShadedTexture {
                verts,
                uv,
                intensity,
                tex,
            } => {
                self.fill_shaded_texture(verts, uv, intensity, tex);
            }
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[u8], usize, usize),
    {
        log::debug!(
            "end_frame: {} polys drawn, {} rejected, {} columns, {} pixels",
            self.stats.polys_drawn,
            self.stats.polys_rejected,
            self.stats.columns,
            self.stats.pixels
        );
        submit(&self.scratch, self.width, self.height);
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{renderer::RendererExt, world::polygon::ProjVertex};

    #[test]
    fn begin_frame_resets_collaborators() {
        let mut sw = Software::default();
        sw.set_clear_index(7);
        sw.begin_frame(4, 3);
        sw.clip_bands_mut().top[1] = 2;
        sw.depth_mut()[2] = 0.5;
        sw.set_viewport(Viewport {
            min_x: 1,
            max_x: 2,
            min_y: 0,
            max_y: 1,
        });

        sw.begin_frame(4, 3);
        assert!(sw.frame().iter().all(|&p| p == 7));
        assert_eq!(sw.clip_bands.top, vec![0; 4]);
        assert_eq!(sw.clip_bands.bot, vec![2; 4]);
        assert!(sw.depth.iter().all(|d| d.is_infinite()));
        assert_eq!(
            sw.viewport(),
            Viewport {
                min_x: 0,
                max_x: 3,
                min_y: 0,
                max_y: 2
            }
        );
        assert_eq!(sw.stats(), FrameStats::default());
    }

    #[test]
    fn viewport_is_intersected_with_frame() {
        let mut sw = Software::default();
        sw.begin_frame(8, 8);
        sw.set_viewport(Viewport {
            min_x: -5,
            max_x: 100,
            min_y: 2,
            max_y: 5,
        });
        assert_eq!(
            sw.viewport(),
            Viewport {
                min_x: 0,
                max_x: 7,
                min_y: 2,
                max_y: 5
            }
        );
    }

    #[test]
    fn draw_frame_submits_filled_buffer() {
        let verts = [
            ProjVertex::new(1.0, 1.0, 1.0),
            ProjVertex::new(6.0, 1.0, 1.0),
            ProjVertex::new(6.0, 6.0, 1.0),
            ProjVertex::new(1.0, 6.0, 1.0),
        ];
        let mut sw = Software::default();
        let mut seen = 0;
        sw.draw_frame(
            8,
            8,
            &[DrawCall::FlatColor {
                verts: &verts,
                color: 9,
            }],
            |fb, w, h| {
                assert_eq!((w, h), (8, 8));
                seen = fb.iter().filter(|&&p| p == 9).count();
            },
        );
        // columns 1..=5, rows 1..=6
        assert_eq!(seen, 5 * 6);
        assert_eq!(sw.stats().polys_drawn, 1);
        assert_eq!(sw.stats().pixels, 30);
    }

    #[test]
    fn zero_affine_span_is_sanitized() {
        let sw = Software::new(RasterConfig {
            affine_span: 0,
            ..RasterConfig::default()
        });
        assert_eq!(sw.config().affine_span, 1);
    }
}
