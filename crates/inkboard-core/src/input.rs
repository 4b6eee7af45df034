//! Pointer input vocabulary delivered by the host.
//!
//! Positions are in view-local coordinates. Events arrive one at a time on the
//! engine's thread; a gesture is everything from `PointerDown` up to the
//! matching `PointerUp` or `PointerCancel`.

use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// A drag gesture began at this position.
    PointerDown { position: Point },
    /// The pointer moved during a drag gesture.
    PointerMove { position: Point },
    /// The drag gesture ended normally.
    PointerUp,
    /// The drag gesture was cancelled by the host.
    PointerCancel,
    /// A discrete tap (no drag).
    Tap { position: Point },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        InputEvent::PointerDown {
            position: Point::new(x, y),
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        InputEvent::PointerMove {
            position: Point::new(x, y),
        }
    }

    pub fn tap(x: f64, y: f64) -> Self {
        InputEvent::Tap {
            position: Point::new(x, y),
        }
    }

    /// Position carried by the event, if any.
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::PointerDown { position }
            | InputEvent::PointerMove { position }
            | InputEvent::Tap { position } => Some(*position),
            InputEvent::PointerUp | InputEvent::PointerCancel => None,
        }
    }
}
