// Palette-indexed surface data read by the rasterizer.
// The loader that produces it lives outside this crate; the renderer only
// ever reads `Texture`, `ColorMap` and `Palette` during a fill.

use std::ops::{Index, IndexMut};

use once_cell::sync::Lazy;

/// Number of light rows in a [`ColorMap`] (intensity bands).
pub const LIGHT_LEVELS: usize = 32;

/// Highest intensity a vertex may carry; the walker clamps to `0..=MAX`.
pub const MAX_INTENSITY: f32 = (LIGHT_LEVELS - 1) as f32;

/// CPU-side texture: 8-bit palette indices in **column-major** order,
/// `pixels[x * h + y]`.  Both sides are powers of two so the column loops can
/// wrap coordinates with a mask instead of clamping.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<u8>,
}

/// Convenience checkerboard 8×8 (dark/light grey).
impl Default for Texture {
    fn default() -> Self {
        const LIGHT_IDX: u8 = 8;
        const DARK_IDX: u8 = 16;
        let mut pix = vec![0u8; 8 * 8];
        for x in 0..8 {
            for y in 0..8 {
                pix[x * 8 + y] = if (x ^ y) & 1 == 0 {
                    LIGHT_IDX
                } else {
                    DARK_IDX
                };
            }
        }
        Texture {
            name: "CHECKER".to_string(),
            w: 8,
            h: 8,
            pixels: pix,
        }
    }
}

/// Things that can go wrong when building surface data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Width or height is zero or not a power of two.
    #[error("texture `{name}` is {w}x{h}; both sides must be non-zero powers of two")]
    NotPowerOfTwo { name: String, w: usize, h: usize },

    /// Pixel buffer does not hold exactly `w * h` entries.
    #[error("texture `{name}` expects {expected} pixels, got {got}")]
    BadLength {
        name: String,
        expected: usize,
        got: usize,
    },

    /// A raw colormap blob is not `LIGHT_LEVELS * 256` bytes.
    #[error("colormap expects {expected} bytes, got {got}")]
    BadColormap { expected: usize, got: usize },
}

impl Texture {
    /// Validate and wrap column-major pixel data.
    pub fn new<S: Into<String>>(
        name: S,
        w: usize,
        h: usize,
        pixels: Vec<u8>,
    ) -> Result<Self, TextureError> {
        let name = name.into();
        if !w.is_power_of_two() || !h.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo { name, w, h });
        }
        if pixels.len() != w * h {
            return Err(TextureError::BadLength {
                name,
                expected: w * h,
                got: pixels.len(),
            });
        }
        Ok(Self { name, w, h, pixels })
    }

    /// Build from a generator called as `f(x, y)`.
    pub fn from_fn<S, F>(name: S, w: usize, h: usize, mut f: F) -> Result<Self, TextureError>
    where
        S: Into<String>,
        F: FnMut(usize, usize) -> u8,
    {
        let mut pixels = Vec::with_capacity(w * h);
        for x in 0..w {
            for y in 0..h {
                pixels.push(f(x, y));
            }
        }
        Self::new(name, w, h, pixels)
    }

    #[inline(always)]
    pub fn w_mask(&self) -> i32 {
        self.w as i32 - 1
    }

    #[inline(always)]
    pub fn h_mask(&self) -> i32 {
        self.h as i32 - 1
    }

    /// Wrapped texel lookup with integer texel coordinates.
    #[inline(always)]
    pub fn texel(&self, u: i32, v: i32) -> u8 {
        self.pixels[(u & self.w_mask()) as usize * self.h + (v & self.h_mask()) as usize]
    }
}

/// Palette index → 0xAARRGGBB, used only when presenting a frame.
pub struct Palette(pub [u32; 256]);
impl Default for Palette {
    fn default() -> Self {
        Palette([0u32; 256])
    }
}
impl Index<usize> for Palette {
    type Output = u32;
    fn index(&self, idx: usize) -> &u32 {
        &self.0[idx]
    }
}
impl IndexMut<usize> for Palette {
    fn index_mut(&mut self, idx: usize) -> &mut u32 {
        &mut self.0[idx]
    }
}

impl Palette {
    /// Sixteen hues × sixteen brightness steps.
    pub fn hue_ramps() -> Self {
        const HUES: [(u32, u32, u32); 16] = [
            (255, 255, 255),
            (255, 64, 64),
            (64, 255, 64),
            (64, 64, 255),
            (255, 255, 64),
            (64, 255, 255),
            (255, 64, 255),
            (255, 160, 64),
            (160, 96, 48),
            (128, 128, 160),
            (96, 160, 96),
            (200, 120, 160),
            (120, 200, 255),
            (255, 200, 150),
            (90, 90, 90),
            (180, 220, 120),
        ];
        let mut pal = Palette::default();
        for (h, &(r, g, b)) in HUES.iter().enumerate() {
            for step in 0..16u32 {
                let k = step + 1;
                let rgb = ((r * k / 16) << 16) | ((g * k / 16) << 8) | (b * k / 16);
                pal[h * 16 + step as usize] = 0xFF00_0000 | rgb;
            }
        }
        pal
    }

    /// Index of the nearest entry (squared RGB distance).
    pub fn nearest(&self, argb: u32) -> u8 {
        let (r, g, b) = split_rgb(argb);
        let mut best = 0usize;
        let mut best_d = i32::MAX;
        for (i, &c) in self.0.iter().enumerate() {
            let (cr, cg, cb) = split_rgb(c);
            let d = (r - cr).pow(2) + (g - cg).pow(2) + (b - cb).pow(2);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best as u8
    }
}

#[inline(always)]
fn split_rgb(c: u32) -> (i32, i32, i32) {
    (
        ((c >> 16) & 0xFF) as i32,
        ((c >> 8) & 0xFF) as i32,
        (c & 0xFF) as i32,
    )
}

/// Light table: `self[band][index]` → final palette index.
/// Band `0` is darkest, band `LIGHT_LEVELS - 1` is full bright.
#[derive(Clone)]
pub struct ColorMap(pub [[u8; 256]; LIGHT_LEVELS]);
impl Default for ColorMap {
    /// Identity in every band.
    fn default() -> Self {
        let mut row = [0u8; 256];
        for (i, v) in row.iter_mut().enumerate() {
            *v = i as u8;
        }
        ColorMap([row; LIGHT_LEVELS])
    }
}
impl Index<usize> for ColorMap {
    type Output = [u8; 256];
    fn index(&self, idx: usize) -> &Self::Output {
        &self.0[idx]
    }
}
impl IndexMut<usize> for ColorMap {
    fn index_mut(&mut self, idx: usize) -> &mut [u8; 256] {
        &mut self.0[idx]
    }
}

impl ColorMap {
    /// Parse a raw `LIGHT_LEVELS × 256` blob (band-major).
    pub fn from_bytes(raw: &[u8]) -> Result<Self, TextureError> {
        let expected = LIGHT_LEVELS * 256;
        if raw.len() != expected {
            return Err(TextureError::BadColormap {
                expected,
                got: raw.len(),
            });
        }
        let mut map = ColorMap::default();
        for (band, chunk) in raw.chunks_exact(256).enumerate() {
            map[band].copy_from_slice(chunk);
        }
        Ok(map)
    }

    /// Darkening ramp: each band scales the palette colour by
    /// `(band + 1) / LIGHT_LEVELS` and snaps back to the nearest entry.
    pub fn fade(pal: &Palette) -> Self {
        let mut map = ColorMap::default();
        for band in 0..LIGHT_LEVELS {
            let k = band as u32 + 1;
            for idx in 0..256 {
                let (r, g, b) = split_rgb(pal[idx]);
                let scale = |c: i32| (c as u32 * k / LIGHT_LEVELS as u32) & 0xFF;
                let argb = (scale(r) << 16) | (scale(g) << 8) | scale(b);
                map[band][idx] = pal.nearest(argb);
            }
        }
        map
    }

    /// Palette entry for `texel` lit at `band` (band is wrapped to the table).
    #[inline(always)]
    pub fn shade(&self, band: i32, texel: u8) -> u8 {
        self.0[(band as usize) & (LIGHT_LEVELS - 1)][texel as usize]
    }
}

/// Fade table over [`Palette::hue_ramps`], built on first use.
pub static DEFAULT_COLORMAP: Lazy<ColorMap> = Lazy::new(|| ColorMap::fade(&Palette::hue_ramps()));

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_power_of_two() {
        let err = Texture::new("ODD", 3, 4, vec![0; 12]).unwrap_err();
        assert_eq!(
            err,
            TextureError::NotPowerOfTwo {
                name: "ODD".into(),
                w: 3,
                h: 4
            }
        );
        assert!(Texture::new("ZERO", 0, 4, vec![]).is_err());
    }

    #[test]
    fn new_validates_length() {
        let err = Texture::new("SHORT", 4, 4, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            TextureError::BadLength {
                name: "SHORT".into(),
                expected: 16,
                got: 15
            }
        );
    }

    #[test]
    fn texel_lookup_is_column_major_and_wraps() {
        let tex = Texture::from_fn("GRAD", 4, 2, |x, y| (x * 10 + y) as u8).unwrap();
        assert_eq!(tex.pixels[3 * 2 + 1], 31);
        assert_eq!(tex.texel(3, 1), 31);
        assert_eq!(tex.texel(7, 3), 31);
        assert_eq!(tex.texel(-1, -1), 31);
    }

    #[test]
    fn checker_default_alternates() {
        let tex = Texture::default();
        assert_ne!(tex.texel(0, 0), tex.texel(1, 0));
        assert_eq!(tex.texel(0, 0), tex.texel(1, 1));
    }

    #[test]
    fn colormap_from_bytes() {
        let mut raw = vec![0u8; LIGHT_LEVELS * 256];
        raw[256 * 3 + 7] = 42;
        let map = ColorMap::from_bytes(&raw).unwrap();
        assert_eq!(map[3][7], 42);
        assert_eq!(map.shade(3 + LIGHT_LEVELS as i32, 7), 42);

        let err = ColorMap::from_bytes(&raw[1..]).err().unwrap();
        assert_eq!(
            err,
            TextureError::BadColormap {
                expected: LIGHT_LEVELS * 256,
                got: LIGHT_LEVELS * 256 - 1
            }
        );
    }

    #[test]
    fn fade_gets_darker_with_lower_bands() {
        let pal = Palette::hue_ramps();
        let map = ColorMap::fade(&pal);
        let white = 15usize; // brightest step of the white ramp
        let lum = |i: u8| {
            let (r, g, b) = split_rgb(pal[i as usize]);
            r + g + b
        };
        assert!(lum(map[0][white]) < lum(map[LIGHT_LEVELS - 1][white]));
        assert_eq!(map[LIGHT_LEVELS - 1][white], white as u8);
    }
}
