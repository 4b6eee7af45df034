//! Inkboard Render Library
//!
//! CPU rasterizer implementing the engine's [`Surface`](inkboard_core::Surface)
//! collaborator, plus PNG encoding for exported images.

mod config;
mod export;
mod raster;

pub use config::{RenderConfig, parse_color};
pub use export::encode_png;
pub use raster::RasterSurface;
