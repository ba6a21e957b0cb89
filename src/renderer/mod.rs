//! Rendering abstraction layer.
//!
//! The application never touches the frame buffer directly.  It produces
//! projected polygons (see [`crate::world::polygon`]), wraps each one in a
//! [`DrawCall`] and hands them to a type that implements [`Renderer`].
//!
//! * Occlusion passes (walls, sprites) fill the renderer's per-column clip
//!   bands and depth row *before* the polygons are submitted.
//! * A helper blanket-impl [`RendererExt`] adds `draw_frame` so call-sites
//!   stay short.

use bitflags::bitflags;
use glam::Vec2;

use crate::world::{polygon::ProjVertex, texture::Texture};

pub mod fixed;
pub mod software;

pub use software::{FrameStats, Software};

bitflags! {
    /// Which attributes a polygon carries.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PolyFlags: u8 {
        const FLAT     = 0x00;
        const SHADED   = 0x01;
        const TEXTURED = 0x02;
    }
}

/// One polygon to fill.  Attribute slices are indexed like `verts`.
#[derive(Clone, Copy, Debug)]
pub enum DrawCall<'a> {
    /// Every pixel gets `color`.
    FlatColor { verts: &'a [ProjVertex], color: u8 },
    /// `colormap[intensity][color]`, dithered between bands.
    ShadedColor {
        verts: &'a [ProjVertex],
        intensity: &'a [f32],
        color: u8,
    },
    /// `colormap[light][texel]`.
    FlatTexture {
        verts: &'a [ProjVertex],
        uv: &'a [Vec2],
        tex: &'a Texture,
        light: u8,
    },
    /// `colormap[intensity][texel]`.
    ShadedTexture {
        verts: &'a [ProjVertex],
        uv: &'a [Vec2],
        intensity: &'a [f32],
        tex: &'a Texture,
    },
}

impl DrawCall<'_> {
    pub fn flags(&self) -> PolyFlags {
        match self {
            DrawCall::FlatColor { .. } => PolyFlags::FLAT,
            DrawCall::ShadedColor { .. } => PolyFlags::SHADED,
            DrawCall::FlatTexture { .. } => PolyFlags::TEXTURED,
            DrawCall::ShadedTexture { .. } => PolyFlags::SHADED | PolyFlags::TEXTURED,
        }
    }

    pub fn verts(&self) -> &[ProjVertex] {
        match *self {
            DrawCall::FlatColor { verts, .. }
            | DrawCall::ShadedColor { verts, .. }
            | DrawCall::FlatTexture { verts, .. }
            | DrawCall::ShadedTexture { verts, .. } => verts,
        }
    }
}

/// A renderer that owns an internal 8-bit frame for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
pub trait Renderer {
    /// (Re)allocate internal scratch for the requested resolution and clear it.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Fill one polygon into the internal buffer.
    fn draw_poly(&mut self, call: &DrawCall);

    /// Finish the frame and **loan** the palette-indexed buffer to `submit`.
    ///
    /// * `submit(&[u8], w, h)` is run exactly once per frame.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[u8], usize, usize);
}

/// Convenience blanket-impl with a one-liner `draw_frame` adaptor.
pub trait RendererExt: Renderer {
    fn draw_frame<F>(&mut self, width: usize, height: usize, calls: &[DrawCall], submit: F)
    where
        F: FnOnce(&[u8], usize, usize),
    {
        self.begin_frame(width, height);
        for c in calls {
            self.draw_poly(c);
        }
        self.end_frame(submit);
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_match_variant() {
        let verts = [ProjVertex::default(); 3];
        let uv = [Vec2::ZERO; 3];
        let int = [0.0; 3];
        let tex = Texture::default();
        let calls = [
            DrawCall::FlatColor {
                verts: &verts,
                color: 1,
            },
            DrawCall::ShadedColor {
                verts: &verts,
                intensity: &int,
                color: 1,
            },
            DrawCall::FlatTexture {
                verts: &verts,
                uv: &uv,
                tex: &tex,
                light: 31,
            },
            DrawCall::ShadedTexture {
                verts: &verts,
                uv: &uv,
                intensity: &int,
                tex: &tex,
            },
        ];
        let flags: Vec<_> = calls.iter().map(|c| c.flags()).collect();
        assert_eq!(flags[0], PolyFlags::empty());
        assert!(flags[1].contains(PolyFlags::SHADED) && !flags[1].contains(PolyFlags::TEXTURED));
        assert!(flags[2].contains(PolyFlags::TEXTURED) && !flags[2].contains(PolyFlags::SHADED));
        assert!(flags[3].contains(PolyFlags::SHADED | PolyFlags::TEXTURED));
        assert!(calls.iter().all(|c| c.verts().len() == 3));
    }
}
