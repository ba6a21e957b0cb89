pub mod camera;
pub mod polygon;
pub mod texture;

pub use camera::Camera;
pub use polygon::{CamVertex, Polygon, ProjVertex, Projector};
pub use texture::{ColorMap, LIGHT_LEVELS, MAX_INTENSITY, Palette, Texture, TextureError};
