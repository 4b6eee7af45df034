//! Freehand pen stroke.

use super::{ElementId, Rgba, clamp_unit};
use crate::geometry::distance_point_to_segment;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest line width accepted from configuration.
pub const MIN_LINE_WIDTH: f64 = 0.1;

/// Style applied to pen strokes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenStyle {
    pub color: Rgba,
    pub line_width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    pub opacity: f64,
}

impl PenStyle {
    pub fn new(color: Rgba, line_width: f64, opacity: f64) -> Self {
        Self {
            color,
            line_width,
            opacity,
        }
        .sanitized()
    }

    /// Force width positive and opacity into `0.0..=1.0`.
    pub fn sanitized(self) -> Self {
        let line_width = if self.line_width.is_finite() {
            self.line_width.max(MIN_LINE_WIDTH)
        } else {
            MIN_LINE_WIDTH
        };
        Self {
            color: self.color,
            line_width,
            opacity: clamp_unit(self.opacity),
        }
    }
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            color: Rgba::RED,
            line_width: 4.0,
            opacity: 1.0,
        }
    }
}

/// A freehand drawing (series of points).
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub id: ElementId,
    /// Points in drawing order.
    pub points: Vec<Point>,
    pub style: PenStyle,
}

impl Stroke {
    /// Create a stroke with a fresh identity.
    pub fn new(points: Vec<Point>, style: PenStyle) -> Self {
        Self::with_id(Uuid::new_v4(), points, style)
    }

    pub fn with_id(id: ElementId, points: Vec<Point>, style: PenStyle) -> Self {
        Self { id, points, style }
    }

    /// Eraser hit-test: any segment strictly closer than `radius + line_width / 2`.
    ///
    /// Strokes with fewer than two points have no segments and are never hit.
    pub fn hit_by_eraser(&self, center: Point, radius: f64) -> bool {
        if self.points.len() < 2 {
            return false;
        }
        let reach = radius + self.style.line_width * 0.5;
        self.points
            .windows(2)
            .any(|w| distance_point_to_segment(center, w[0], w[1]) < reach)
    }

    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        let rect = self
            .points
            .iter()
            .skip(1)
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
        let half = self.style.line_width * 0.5;
        rect.inflate(half, half)
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.points.first() else {
            return path;
        };
        path.move_to(*first);
        for point in self.points.iter().skip(1) {
            path.line_to(*point);
        }
        path
    }
}
