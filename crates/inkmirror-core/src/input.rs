//! Pointer events for unified mouse/touch handling.

use kurbo::Point;

/// Which device produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

/// Pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { id: PointerId, position: Point },
    Move { id: PointerId, position: Point },
    Up { id: PointerId, position: Point },
    /// The platform cancelled the gesture (touch interrupted).
    Cancel { id: PointerId },
}

impl PointerEvent {
    pub fn id(&self) -> PointerId {
        match self {
            PointerEvent::Down { id, .. }
            | PointerEvent::Move { id, .. }
            | PointerEvent::Up { id, .. }
            | PointerEvent::Cancel { id } => *id,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => Some(*position),
            PointerEvent::Cancel { .. } => None,
        }
    }
}
