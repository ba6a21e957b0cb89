//! Silhouette edge walker.
//!
//! A polygon is filled column by column from its leftmost vertex.  Two
//! walkers track the silhouette: the *top* one follows the vertex list
//! forwards, the *bottom* one backwards.  Each walker covers one polygon edge
//! (a *run* of columns) at a time and searches for the next edge when the run
//! is used up.  Reaching the rightmost vertex ends the walk.

use glam::Vec2;

use crate::{
    renderer::{
        fixed::round_px,
        software::{column::Shader, polygon::PolySource},
    },
    world::texture::MAX_INTENSITY,
};

/// Direction through the vertex list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Step {
    #[default]
    Forward,
    Backward,
}

impl Step {
    #[inline(always)]
    fn next(self, idx: usize, count: usize) -> usize {
        match self {
            Step::Forward => {
                if idx + 1 >= count {
                    0
                } else {
                    idx + 1
                }
            }
            Step::Backward => {
                if idx == 0 {
                    count - 1
                } else {
                    idx - 1
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeState {
    #[default]
    Searching,
    InRun,
    Exhausted,
}

/// One silhouette boundary.  Values are those of the current column.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeWalker {
    pub step: Step,
    pub state: EdgeState,

    /// Columns left in the current run.
    pub len: i32,
    /// Vertex index the current run ends at.
    pub end: usize,

    pub y: f32,
    pub y_px: i32,
    pub dy: f32,

    pub z: f32,
    pub dz: f32,

    pub i: f32,
    pub di: f32,

    pub uv: Vec2,
    pub duv: Vec2,
}

impl EdgeWalker {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// Walk from `start` until an edge with a positive column run is found.
    ///
    /// Edges that stay in one column, or head left, are skipped.  Returns
    /// `false` (and becomes `Exhausted`) once the rightmost vertex is reached
    /// without finding one.
    pub fn search<S: Shader>(&mut self, start: usize, src: &PolySource) -> bool {
        self.state = EdgeState::Searching;
        if start == src.max_index {
            self.state = EdgeState::Exhausted;
            return false;
        }

        let count = src.verts.len();
        let mut cur = start;
        loop {
            let next = self.step.next(cur, count);
            let a = &src.verts[cur];
            let b = &src.verts[next];
            let x0 = round_px(a.x);
            let x1 = round_px(b.x);

            let mut dx = x1 - x0;
            // an edge landing on the last viewport column owns that column too
            if x1 == src.max_screen_x {
                dx += 1;
            }

            if dx > 0 {
                self.begin_run::<S>(cur, next, dx, src);
                return true;
            }
            if next == src.max_index {
                self.state = EdgeState::Exhausted;
                return false;
            }
            cur = next;
        }
    }

    fn begin_run<S: Shader>(&mut self, cur: usize, next: usize, dx: i32, src: &PolySource) {
        let a = &src.verts[cur];
        let b = &src.verts[next];
        let y0 = round_px(a.y);
        let y1 = round_px(b.y);
        let step = 1.0 / dx as f32;

        self.len = dx;
        self.end = next;

        self.y_px = y0;
        self.y = y0 as f32;
        self.dy = (y1 - y0) as f32 * step;

        self.z = a.z;
        self.dz = (b.z - a.z) * step;

        if S::SHADED {
            self.i = src.intensity[cur].clamp(0.0, MAX_INTENSITY);
            self.di = (src.intensity[next] - self.i) * step;
        }
        if S::TEXTURED {
            self.uv = src.uv[cur];
            self.duv = (src.uv[next] - self.uv) * step;
        }
        self.state = EdgeState::InRun;
    }

    /// Move to the next column.  Returns `false` when the silhouette on this
    /// side is complete.
    pub fn advance<S: Shader>(&mut self, src: &PolySource) -> bool {
        self.len -= 1;
        if self.len <= 0 {
            return self.search::<S>(self.end, src);
        }

        if S::SHADED {
            self.i = (self.i + self.di).clamp(0.0, MAX_INTENSITY);
        }
        if S::TEXTURED {
            self.uv += self.duv;
        }
        self.y += self.dy;
        self.z += self.dz;
        self.y_px = round_px(self.y);
        true
    }

    /// Same as calling [`advance`](Self::advance) `cols` times, but whole
    /// runs are skipped with one search and the partial run is stepped in
    /// one go.  Used for columns left of the viewport.
    pub fn skip<S: Shader>(&mut self, mut cols: i32, src: &PolySource) -> bool {
        while cols > 0 {
            if cols >= self.len {
                cols -= self.len;
                if !self.search::<S>(self.end, src) {
                    return false;
                }
                continue;
            }

            self.len -= cols;
            let k = cols as f32;
            if S::SHADED {
                self.i = (self.i + self.di * k).clamp(0.0, MAX_INTENSITY);
            }
            if S::TEXTURED {
                self.uv += self.duv * k;
            }
            self.y += self.dy * k;
            self.z += self.dz * k;
            self.y_px = round_px(self.y);
            break;
        }
        true
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
