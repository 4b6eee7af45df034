//! Plain-data transfer representations of elements.
//!
//! The persisted format never encodes [`Element`] directly. Each element is
//! flattened into one of these DTOs, serialized to JSON, and wrapped in an
//! envelope by the parent module.

use crate::elements::{PenStyle, Rgba, Stamp, StampKind, StampStyle, Stroke};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointDto {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for PointDto {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<PointDto> for Point {
    fn from(p: PointDto) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenStyleDto {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
    pub line_width: f64,
    pub opacity: f64,
}

impl From<&PenStyle> for PenStyleDto {
    fn from(style: &PenStyle) -> Self {
        let Rgba { r, g, b, a } = style.color;
        Self {
            r,
            g,
            b,
            a,
            line_width: style.line_width,
            opacity: style.opacity,
        }
    }
}

/// Out-of-range values are clamped on the way in.
impl From<PenStyleDto> for PenStyle {
    fn from(dto: PenStyleDto) -> Self {
        PenStyle::new(
            Rgba::new(dto.r, dto.g, dto.b, dto.a),
            dto.line_width,
            dto.opacity,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampStyleDto {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
    pub size: f64,
    pub opacity: f64,
}

impl From<&StampStyle> for StampStyleDto {
    fn from(style: &StampStyle) -> Self {
        let Rgba { r, g, b, a } = style.color;
        Self {
            r,
            g,
            b,
            a,
            size: style.size,
            opacity: style.opacity,
        }
    }
}

impl From<StampStyleDto> for StampStyle {
    fn from(dto: StampStyleDto) -> Self {
        StampStyle::new(Rgba::new(dto.r, dto.g, dto.b, dto.a), dto.size, dto.opacity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeDto {
    pub id: String,
    pub points: Vec<PointDto>,
    pub style: PenStyleDto,
}

impl From<&Stroke> for StrokeDto {
    fn from(stroke: &Stroke) -> Self {
        Self {
            id: stroke.id.to_string(),
            points: stroke.points.iter().copied().map(PointDto::from).collect(),
            style: PenStyleDto::from(&stroke.style),
        }
    }
}

impl StrokeDto {
    pub fn into_model(self) -> Stroke {
        Stroke::with_id(
            parse_id(&self.id),
            self.points.into_iter().map(Point::from).collect(),
            self.style.into(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampDto {
    pub id: String,
    pub kind: StampKind,
    pub center: PointDto,
    pub style: StampStyleDto,
}

impl From<&Stamp> for StampDto {
    fn from(stamp: &Stamp) -> Self {
        Self {
            id: stamp.id.to_string(),
            kind: stamp.kind,
            center: stamp.center.into(),
            style: StampStyleDto::from(&stamp.style),
        }
    }
}

impl StampDto {
    pub fn into_model(self) -> Stamp {
        Stamp::with_id(
            parse_id(&self.id),
            self.kind,
            self.center.into(),
            self.style.into(),
        )
    }
}

/// Parse a persisted id, minting a fresh one if it is not a valid UUID.
fn parse_id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_else(|_| {
        log::warn!("Invalid element id {:?}, assigning a new one", raw);
        Uuid::new_v4()
    })
}
