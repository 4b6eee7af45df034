//! Output settings for the raster surface.

use inkboard_core::Rgba;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Pixel size, scale and background of rendered images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Device pixels per view unit (e.g. 2.0 for retina).
    pub scale: f64,
    pub background: Rgba,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            scale: 1.0,
            background: Rgba::WHITE,
        }
    }
}

impl RenderConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        self
    }

    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Parse a hex color string like `"#ff0000"` or `"#ff000080"`.
pub fn parse_color(s: &str) -> Option<Rgba> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let color = match hex.len() {
        6 => Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, 255),
        8 => Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, channel(6)?),
        _ => return None,
    };
    Some(color.into())
}
