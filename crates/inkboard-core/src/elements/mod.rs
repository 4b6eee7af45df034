//! Drawable element definitions.

mod stamp;
mod stroke;

pub use stamp::{MIN_STAMP_SIZE, Stamp, StampKind, StampStyle};
pub use stroke::{MIN_LINE_WIDTH, PenStyle, Stroke};

use kurbo::{BezPath, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Normalized RGBA color, each component in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const RED: Rgba = Rgba::opaque(1.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::opaque(0.0, 0.0, 0.0);
    pub const WHITE: Rgba = Rgba::opaque(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    /// Create a color, clamping every component into `0.0..=1.0`.
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
            a: clamp_unit(a),
        }
    }

    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: a as f64 / 255.0,
        }
    }

    /// Return this color with its alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: clamp_unit(self.a * opacity),
            ..self
        }
    }

    /// Convert to 8-bit channels.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f64| (clamp_unit(c) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Rgba::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

/// Clamp into `0.0..=1.0`, mapping NaN to zero.
pub(crate) fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// A single drawable primitive on the canvas.
///
/// Every consumer matches exhaustively, so a new element kind has to be
/// handled at each hit-test, outline and persistence site.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Stroke(Stroke),
    Stamp(Stamp),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::Stroke(s) => s.id,
            Element::Stamp(s) => s.id,
        }
    }

    /// Whether an eraser of `radius` centered at `center` touches this element.
    pub fn hit_by_eraser(&self, center: Point, radius: f64) -> bool {
        match self {
            Element::Stroke(s) => s.hit_by_eraser(center, radius),
            Element::Stamp(s) => s.hit_by_eraser(center, radius),
        }
    }

    /// Bounding box including the painted line width.
    pub fn bounds(&self) -> Rect {
        match self {
            Element::Stroke(s) => s.bounds(),
            Element::Stamp(s) => s.bounds(),
        }
    }

    /// Centerline geometry to be stroked by a renderer.
    pub fn to_path(&self) -> BezPath {
        match self {
            Element::Stroke(s) => s.to_path(),
            Element::Stamp(s) => s.to_path(),
        }
    }

    /// Width of the painted line along [`Element::to_path`].
    pub fn paint_width(&self) -> f64 {
        match self {
            Element::Stroke(s) => s.style.line_width,
            Element::Stamp(s) => s.glyph_line_width(),
        }
    }

    /// Final paint color with opacity folded into alpha.
    pub fn paint_color(&self) -> Rgba {
        match self {
            Element::Stroke(s) => s.style.color.with_opacity(s.style.opacity),
            Element::Stamp(s) => s.style.color.with_opacity(s.style.opacity),
        }
    }

    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            Element::Stroke(s) => Some(s),
            Element::Stamp(_) => None,
        }
    }

    pub fn as_stamp(&self) -> Option<&Stamp> {
        match self {
            Element::Stamp(s) => Some(s),
            Element::Stroke(_) => None,
        }
    }
}

impl From<Stroke> for Element {
    fn from(stroke: Stroke) -> Self {
        Element::Stroke(stroke)
    }
}

impl From<Stamp> for Element {
    fn from(stamp: Stamp) -> Self {
        Element::Stamp(stamp)
    }
}
