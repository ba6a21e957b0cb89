//! Polygon driver: bounding box, extreme vertices and the column loop.
//!
//! Bad input never raises an error here.  Empty, degenerate or fully
//! off-screen polygons simply draw nothing so one bad polygon can't cost the
//! frame.

use glam::Vec2;

use crate::{
    renderer::{
        fixed::round_px,
        software::{
            Software,
            column::{FlatColor, FlatTexture, Shader, ShadedColor, ShadedTexture},
            edge::{EdgeWalker, Step},
        },
    },
    world::{polygon::ProjVertex, texture::Texture},
};

/// Rounded screen coordinates must stay within `±COORD_LIMIT`; anything
/// further out is rejected so column and run arithmetic never overflows.
pub const COORD_LIMIT: i32 = 1 << 28;

/// Caller-side description of one polygon.  Slices a variant does not use
/// may be empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolyInput<'a> {
    pub verts: &'a [ProjVertex],
    pub intensity: &'a [f32],
    pub uv: &'a [Vec2],
    pub tex: Option<&'a Texture>,
    /// Palette index (colour variants) or light row (flat texture).
    pub color: u8,
}

/// Polygon data shared by the walkers and the shaders during one fill.
#[derive(Clone, Copy, Debug)]
pub struct PolySource<'a> {
    pub verts: &'a [ProjVertex],
    pub intensity: &'a [f32],
    pub uv: &'a [Vec2],
    pub tex: Option<&'a Texture>,
    pub color: u8,
    /// First vertex with the largest rounded X; reaching it ends a walk.
    pub max_index: usize,
    /// Right edge of the viewport (boundary-alignment rule).
    pub max_screen_x: i32,
}

/// Rounded bounding box plus the extreme-X vertex indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Bounds {
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
    min_index: usize,
    max_index: usize,
}

impl Bounds {
    fn of(verts: &[ProjVertex]) -> Self {
        let mut b = Bounds {
            x_min: i32::MAX,
            x_max: i32::MIN,
            y_min: i32::MAX,
            y_max: i32::MIN,
            min_index: 0,
            max_index: 0,
        };
        for (i, v) in verts.iter().enumerate() {
            let x = round_px(v.x);
            if x < b.x_min {
                b.x_min = x;
                b.min_index = i;
            }
            if x > b.x_max {
                b.x_max = x;
                b.max_index = i;
            }
            let y = round_px(v.y);
            b.y_min = b.y_min.min(y);
            b.y_max = b.y_max.max(y);
        }
        b
    }
}

impl Software {
    pub fn fill_flat_color(&mut self, verts: &[ProjVertex], color: u8) -> bool {
        self.fill_polygon::<FlatColor>(&PolyInput {
            verts,
            color,
            ..PolyInput::default()
        })
    }

    /// `intensity` per vertex, `0..=MAX_INTENSITY`.
    pub fn fill_shaded_color(&mut self, verts: &[ProjVertex], intensity: &[f32], color: u8) -> bool {
        self.fill_polygon::<ShadedColor>(&PolyInput {
            verts,
            intensity,
            color,
            ..PolyInput::default()
        })
    }

    /// `light` picks the colormap row for the whole polygon.
    pub fn fill_flat_texture(
        &mut self,
        verts: &[ProjVertex],
        uv: &[Vec2],
        tex: &Texture,
        light: u8,
    ) -> bool {
        self.fill_polygon::<FlatTexture>(&PolyInput {
            verts,
            uv,
            tex: Some(tex),
            color: light,
            ..PolyInput::default()
        })
    }

    pub fn fill_shaded_texture(
        &mut self,
        verts: &[ProjVertex],
        uv: &[Vec2],
        intensity: &[f32],
        tex: &Texture,
    ) -> bool {
        self.fill_polygon::<ShadedTexture>(&PolyInput {
            verts,
            intensity,
            uv,
            tex: Some(tex),
            color: 0,
        })
    }

    /// Fill one polygon with shader `S`.  Returns `false` when it was
    /// rejected before any column was visited.
    pub fn fill_polygon<S: Shader>(&mut self, input: &PolyInput) -> bool {
        let verts = input.verts;
        let count = verts.len();
        if self.width == 0 || self.height == 0 {
            return self.reject("no frame, begin_frame not called");
        }
        if count == 0 {
            return self.reject("no vertices");
        }
        if (S::SHADED && input.intensity.len() < count)
            || (S::TEXTURED && (input.uv.len() < count || input.tex.is_none()))
        {
            return self.reject("missing attributes");
        }

        let b = Bounds::of(verts);
        let vp = self.viewport;
        if b.x_min < -COORD_LIMIT
            || b.x_max > COORD_LIMIT
            || b.y_min < -COORD_LIMIT
            || b.y_max > COORD_LIMIT
        {
            return self.reject("coordinates out of range");
        }
        if b.x_min >= b.x_max {
            return self.reject("no horizontal extent");
        }
        if b.y_min > vp.max_y || b.y_max < vp.min_y {
            return self.reject("outside vertical window");
        }

        let src = PolySource {
            verts,
            intensity: input.intensity,
            uv: input.uv,
            tex: input.tex,
            color: input.color,
            max_index: b.max_index,
            max_screen_x: vp.max_x,
        };

        self.top = EdgeWalker::new(Step::Forward);
        self.bot = EdgeWalker::new(Step::Backward);
        if !self.top.search::<S>(b.min_index, &src) || !self.bot.search::<S>(b.min_index, &src) {
            return self.reject("no silhouette edge");
        }

        self.stats.polys_drawn += 1;

        // columns left of the viewport only move the edges along
        let first = b.x_min.max(vp.min_x);
        let hidden = first - b.x_min;
        if hidden > 0 && (!self.top.skip::<S>(hidden, &src) || !self.bot.skip::<S>(hidden, &src)) {
            return true;
        }

        for x in first..=vp.max_x {
            let written = self.fill_column::<S>(x, &src);
            self.stats.columns += 1;
            self.stats.pixels += written as u64;

            if !self.top.advance::<S>(&src) || !self.bot.advance::<S>(&src) {
                break;
            }
        }
        true
    }

    fn reject(&mut self, why: &str) -> bool {
        log::trace!("polygon rejected: {why}");
        self.stats.polys_rejected += 1;
        false
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
