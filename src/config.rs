//! Rasterizer tunables.
//!
//! The binaries fill this from CLI flags; library users build it directly or
//! take [`RasterConfig::default`].

/// How the texture column loops recover `u, v` from `u/z, v/z` at every
/// affine span boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ZDivide {
    /// Column `1/z` kept in 44.20, reciprocal via [`Fixed::recip`](crate::renderer::fixed::Fixed::recip).
    #[default]
    Fixed,
    /// Column `1/z` kept in `f32`, one float reciprocal per boundary.
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterConfig {
    /// Vertices carry `1/z` and `u/z, v/z`; textures are divided back per span.
    pub perspective_correct: bool,
    /// Max pixels between two exact perspective divides (≥ 1).
    pub affine_span: u32,
    pub z_divide: ZDivide,
}

pub const DEFAULT_AFFINE_SPAN: u32 = 16;

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            perspective_correct: true,
            affine_span: DEFAULT_AFFINE_SPAN,
            z_divide: ZDivide::Fixed,
        }
    }
}

impl RasterConfig {
    /// Clamp out-of-range values in place; returns `true` if anything changed.
    pub fn sanitize(&mut self) -> bool {
        if self.affine_span == 0 {
            log::warn!("affine_span 0 is invalid, using 1");
            self.affine_span = 1;
            return true;
        }
        false
    }

    /// Non-perspective setup: plain depth, plain texel coordinates.
    pub fn affine() -> Self {
        Self {
            perspective_correct: false,
            ..Self::default()
        }
    }
}
