//! Engine configuration: active mode and styling for new elements.

use crate::elements::{PenStyle, StampKind, StampStyle};
use serde::{Deserialize, Serialize};

/// Default eraser radius in view units.
pub const DEFAULT_ERASER_RADIUS: f64 = 18.0;

/// Smallest eraser radius accepted.
pub const MIN_ERASER_RADIUS: f64 = 0.5;

/// How pointer input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// Drag to draw a stroke.
    #[default]
    Pen,
    /// Tap to place a stamp.
    Stamp,
    /// Drag to erase whole elements.
    Eraser,
    /// Ignore input.
    None,
}

/// Host-controlled settings read by the engine when it creates elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: DrawMode,
    pub pen_style: PenStyle,
    pub stamp_style: StampStyle,
    pub stamp_kind: StampKind,
    pub eraser_radius: f64,
    /// Keep envelopes that could not be decoded and write them back on export.
    pub retain_unknown_elements: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: DrawMode::default(),
            pen_style: PenStyle::default(),
            stamp_style: StampStyle::default(),
            stamp_kind: StampKind::default(),
            eraser_radius: DEFAULT_ERASER_RADIUS,
            retain_unknown_elements: true,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp styles and radius into their valid ranges.
    pub fn sanitized(self) -> Self {
        Self {
            pen_style: self.pen_style.sanitized(),
            stamp_style: self.stamp_style.sanitized(),
            eraser_radius: sanitize_radius(self.eraser_radius),
            ..self
        }
    }
}

pub(crate) fn sanitize_radius(radius: f64) -> f64 {
    if radius.is_finite() {
        radius.max(MIN_ERASER_RADIUS)
    } else {
        DEFAULT_ERASER_RADIUS
    }
}
