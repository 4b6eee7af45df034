//! Stamp glyphs placed with a single tap.

use super::{ElementId, Rgba, clamp_unit};
use kurbo::{BezPath, Circle, Point, Rect, Shape as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Smallest stamp size accepted from configuration.
pub const MIN_STAMP_SIZE: f64 = 1.0;

/// Glyph drawn by a stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampKind {
    #[default]
    Check,
    Cross,
    Circle,
}

impl StampKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StampKind::Check => "check",
            StampKind::Cross => "cross",
            StampKind::Circle => "circle",
        }
    }
}

impl fmt::Display for StampKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Style applied to stamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampStyle {
    pub color: Rgba,
    /// Diameter of the stamp's hit circle.
    pub size: f64,
    pub opacity: f64,
}

impl StampStyle {
    pub fn new(color: Rgba, size: f64, opacity: f64) -> Self {
        Self {
            color,
            size,
            opacity,
        }
        .sanitized()
    }

    pub fn sanitized(self) -> Self {
        let size = if self.size.is_finite() {
            self.size.max(MIN_STAMP_SIZE)
        } else {
            MIN_STAMP_SIZE
        };
        Self {
            color: self.color,
            size,
            opacity: clamp_unit(self.opacity),
        }
    }
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            color: Rgba::RED,
            size: 36.0,
            opacity: 1.0,
        }
    }
}

/// A stamp centered at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub id: ElementId,
    pub kind: StampKind,
    pub center: Point,
    pub style: StampStyle,
}

impl Stamp {
    pub fn new(kind: StampKind, center: Point, style: StampStyle) -> Self {
        Self::with_id(Uuid::new_v4(), kind, center, style)
    }

    pub fn with_id(id: ElementId, kind: StampKind, center: Point, style: StampStyle) -> Self {
        Self {
            id,
            kind,
            center,
            style,
        }
    }

    pub fn radius(&self) -> f64 {
        self.style.size * 0.5
    }

    /// Circular hit approximation, inclusive at the boundary.
    ///
    /// Compared squared so that exact boundary distances are not lost to
    /// rounding in a square root.
    pub fn hit_by_eraser(&self, center: Point, radius: f64) -> bool {
        let reach = self.radius() + radius;
        (self.center - center).hypot2() <= reach * reach
    }

    pub fn bounds(&self) -> Rect {
        let r = self.radius();
        Rect::new(
            self.center.x - r,
            self.center.y - r,
            self.center.x + r,
            self.center.y + r,
        )
    }

    /// Line width used when stroking the glyph outline.
    pub fn glyph_line_width(&self) -> f64 {
        (self.style.size * 0.12).max(2.0)
    }

    /// Glyph centerline, scaled by `style.size`.
    pub fn to_path(&self) -> BezPath {
        let s = self.style.size;
        let c = self.center;
        let at = |dx: f64, dy: f64| Point::new(c.x + s * dx, c.y + s * dy);
        let mut path = BezPath::new();
        match self.kind {
            StampKind::Check => {
                path.move_to(at(-0.30, 0.05));
                path.line_to(at(-0.10, 0.25));
                path.line_to(at(0.35, -0.20));
            }
            StampKind::Cross => {
                path.move_to(at(-0.30, -0.30));
                path.line_to(at(0.30, 0.30));
                path.move_to(at(0.30, -0.30));
                path.line_to(at(-0.30, 0.30));
            }
            StampKind::Circle => {
                path.extend(Circle::new(c, s * 0.35).path_elements(0.1));
            }
        }
        path
    }
}
