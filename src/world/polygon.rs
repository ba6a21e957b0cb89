//! Projected polygons as the rasterizer consumes them.
//!
//! Screen winding is **clockwise** (y grows downwards): walking forward from
//! the leftmost vertex must trace the *top* of the silhouette.  Polygons wound
//! the other way produce empty columns and draw nothing.

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::{
    renderer::DrawCall,
    world::texture::{MAX_INTENSITY, Texture},
};

/// One screen-space vertex.
///
/// `z` is depth-like, not necessarily camera depth: in perspective mode the
/// projector stores `1/z`, otherwise plain camera `z`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProjVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ProjVertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Camera-space vertex with its surface attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CamVertex {
    pub pos: Vec3, // x = right, y = up, z = depth
    pub uv: Vec2,
    pub intensity: f32,
}

impl CamVertex {
    #[inline]
    fn lerp(self, other: CamVertex, t: f32) -> CamVertex {
        CamVertex {
            pos: self.pos.lerp(other.pos, t),
            uv: self.uv.lerp(other.uv, t),
            intensity: self.intensity + (other.intensity - self.intensity) * t,
        }
    }
}

/// Camera-space → screen-space transform.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    pub half_w: f32,
    pub half_h: f32,
    pub focal: f32,
    /// Emit `1/z` and `uv/z` (must match the rasterizer's mode).
    pub perspective: bool,
}

/// Vertex + attribute buffers; most polygons fit inline.
#[derive(Clone, Debug, Default)]
pub struct Polygon {
    pub verts: SmallVec<[ProjVertex; 8]>,
    pub uv: SmallVec<[Vec2; 8]>,
    pub intensity: SmallVec<[f32; 8]>,
}

impl Polygon {
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// Clip against the near plane, then project.  Returns an empty polygon
    /// when nothing survives.
    pub fn project(cam_verts: &[CamVertex], near: f32, proj: &Projector) -> Polygon {
        let clipped = clip_near(cam_verts, near);
        let mut out = Polygon::default();
        for v in &clipped {
            let inv_z = 1.0 / v.pos.z;
            let x = proj.half_w + v.pos.x * proj.focal * inv_z;
            let y = proj.half_h - v.pos.y * proj.focal * inv_z;
            let (z, uv) = if proj.perspective {
                (inv_z, v.uv * inv_z)
            } else {
                (v.pos.z, v.uv)
            };
            out.verts.push(ProjVertex { x, y, z });
            out.uv.push(uv);
            out.intensity.push(v.intensity.clamp(0.0, MAX_INTENSITY));
        }
        out
    }

    /// Twice the signed screen area; positive for the winding the
    /// rasterizer fills.
    pub fn signed_area2(&self) -> f32 {
        let n = self.verts.len();
        (0..n)
            .map(|i| {
                let a = self.verts[i];
                let b = self.verts[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum()
    }

    /// Reverse the vertex order (attributes included) if the polygon faces
    /// away.  Returns `true` when it was flipped.
    pub fn wind_clockwise(&mut self) -> bool {
        if self.signed_area2() >= 0.0 {
            return false;
        }
        self.verts.reverse();
        self.uv.reverse();
        self.intensity.reverse();
        true
    }

    pub fn flat_color(&self, color: u8) -> DrawCall<'_> {
        DrawCall::FlatColor {
            verts: &self.verts,
            color,
        }
    }

    pub fn shaded_color(&self, color: u8) -> DrawCall<'_> {
        DrawCall::ShadedColor {
            verts: &self.verts,
            intensity: &self.intensity,
            color,
        }
    }

    pub fn flat_texture<'a>(&'a self, tex: &'a Texture, light: u8) -> DrawCall<'a> {
        DrawCall::FlatTexture {
            verts: &self.verts,
            uv: &self.uv,
            tex,
            light,
        }
    }

    pub fn shaded_texture<'a>(&'a self, tex: &'a Texture) -> DrawCall<'a> {
        DrawCall::ShadedTexture {
            verts: &self.verts,
            uv: &self.uv,
            intensity: &self.intensity,
            tex,
        }
    }
}

/// Sutherland–Hodgman against `z = near`, attributes interpolated linearly in
/// camera space.
pub fn clip_near(input: &[CamVertex], near: f32) -> SmallVec<[CamVertex; 8]> {
    let mut out = SmallVec::new();
    let Some(&last) = input.last() else {
        return out;
    };
    let mut prev = last;
    for &cur in input {
        let prev_in = prev.pos.z >= near;
        let cur_in = cur.pos.z >= near;
        if prev_in != cur_in {
            let t = (near - prev.pos.z) / (cur.pos.z - prev.pos.z);
            let mut v = prev.lerp(cur, t);
            v.pos.z = near;
            out.push(v);
        }
        if cur_in {
            out.push(cur);
        }
        prev = cur;
    }
    out
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::{vec2, vec3};

    fn cv(x: f32, y: f32, z: f32) -> CamVertex {
        CamVertex {
            pos: vec3(x, y, z),
            uv: vec2(x, z),
            intensity: 10.0,
        }
    }

    #[test]
    fn fully_visible_polygon_is_untouched() {
        let tri = [cv(0.0, 0.0, 2.0), cv(1.0, 0.0, 2.0), cv(0.0, 1.0, 3.0)];
        let out = clip_near(&tri, 1.0);
        assert_eq!(out.as_slice(), &tri);
    }

    #[test]
    fn straddling_polygon_gains_a_vertex() {
        let quad = [
            cv(-1.0, 0.0, 0.0),
            cv(1.0, 0.0, 0.0),
            cv(1.0, 0.0, 4.0),
            cv(-1.0, 0.0, 4.0),
        ];
        let out = clip_near(&quad, 1.0);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|v| v.pos.z >= 1.0));
        // u follows x, v follows z
        assert!(out.iter().any(|v| (v.uv.y - 1.0).abs() < 1e-6));
    }

    #[test]
    fn polygon_behind_near_plane_vanishes() {
        let tri = [cv(0.0, 0.0, 0.1), cv(1.0, 0.0, 0.2), cv(0.0, 1.0, 0.3)];
        assert!(clip_near(&tri, 1.0).is_empty());
        let proj = Projector {
            half_w: 160.0,
            half_h: 100.0,
            focal: 160.0,
            perspective: true,
        };
        assert!(Polygon::project(&tri, 1.0, &proj).is_empty());
    }

    #[test]
    fn perspective_projection_divides_attributes() {
        let proj = Projector {
            half_w: 160.0,
            half_h: 100.0,
            focal: 160.0,
            perspective: true,
        };
        let v = CamVertex {
            pos: vec3(2.0, 1.0, 4.0),
            uv: vec2(8.0, 16.0),
            intensity: 40.0,
        };
        let poly = Polygon::project(&[v], 1.0, &proj);
        assert_eq!(poly.verts[0], ProjVertex::new(240.0, 60.0, 0.25));
        assert_eq!(poly.uv[0], vec2(2.0, 4.0));
        assert_eq!(poly.intensity[0], MAX_INTENSITY);

        let affine = Projector {
            perspective: false,
            ..proj
        };
        let poly = Polygon::project(&[v], 1.0, &affine);
        assert_eq!(poly.verts[0].z, 4.0);
        assert_eq!(poly.uv[0], vec2(8.0, 16.0));
    }

    #[test]
    fn counter_clockwise_polygon_is_flipped() {
        let mut poly = Polygon::default();
        for (x, y) in [(0.0, 0.0), (0.0, 10.0), (10.0, 0.0)] {
            poly.verts.push(ProjVertex::new(x, y, 1.0));
            poly.uv.push(vec2(x, y));
            poly.intensity.push(x);
        }
        assert!(poly.signed_area2() < 0.0);
        assert!(poly.wind_clockwise());
        assert_eq!(poly.verts[0], ProjVertex::new(10.0, 0.0, 1.0));
        assert_eq!(poly.uv[0], vec2(10.0, 0.0));
        assert_eq!(poly.intensity[0], 10.0);
        assert_eq!(poly.signed_area2(), 100.0);
        assert!(!poly.wind_clockwise());
    }
}
