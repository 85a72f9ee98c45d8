//! Input abstraction layer.
//!
//! Normalizes mouse, touch and pen events into a unified `InputEvent`
//! carrying surface-local logical coordinates and a millisecond timestamp.

use sign_core::model::Point;

/// A normalized input event from any pointing device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown { x: f64, y: f64, time_ms: f64 },

    /// Pointer moved (mouse move, touch move, pen move).
    PointerMove { x: f64, y: f64, time_ms: f64 },

    /// Pointer released.
    PointerUp { x: f64, y: f64, time_ms: f64 },

    /// The platform took the pointer away (touch cancel, palm rejection).
    PointerCancel { time_ms: f64 },

    /// Pointer left the surface.
    PointerLeave { x: f64, y: f64, time_ms: f64 },
}

impl InputEvent {
    pub fn down(x: f64, y: f64, time_ms: f64) -> Self {
        Self::PointerDown { x, y, time_ms }
    }

    pub fn moved(x: f64, y: f64, time_ms: f64) -> Self {
        Self::PointerMove { x, y, time_ms }
    }

    pub fn up(x: f64, y: f64, time_ms: f64) -> Self {
        Self::PointerUp { x, y, time_ms }
    }

    /// Extract position if the event carries one.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::PointerLeave { x, y, .. } => Some(Point::new(*x, *y)),
            Self::PointerCancel { .. } => None,
        }
    }

    pub fn time_ms(&self) -> f64 {
        match self {
            Self::PointerDown { time_ms, .. }
            | Self::PointerMove { time_ms, .. }
            | Self::PointerUp { time_ms, .. }
            | Self::PointerCancel { time_ms }
            | Self::PointerLeave { time_ms, .. } => *time_ms,
        }
    }

    /// Up, cancel and leave all end the current stroke.
    pub fn ends_stroke(&self) -> bool {
        matches!(
            self,
            Self::PointerUp { .. } | Self::PointerCancel { .. } | Self::PointerLeave { .. }
        )
    }
}
