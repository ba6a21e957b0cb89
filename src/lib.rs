//! Column-walking software polygon rasterizer.
//!
//! Polygons are filled one screen column at a time: two edge walkers track
//! the top and bottom of the silhouette, each column is clipped against a
//! per-column visible window and then filled bottom-up by one of four
//! shaders (flat / shaded × color / texture).

pub mod config;
pub mod renderer;
pub mod world;

pub use config::{RasterConfig, ZDivide};
pub use renderer::{DrawCall, PolyFlags, Renderer, RendererExt, Software};
