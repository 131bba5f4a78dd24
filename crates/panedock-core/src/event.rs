#![forbid(unsafe_code)]

//! Pointer events delivered by the host event loop.
//!
//! The host translates its native input into [`PointerEvent`] values and
//! hands them to the window manager one at a time on the UI thread.

use crate::geometry::Point;

/// Mouse/pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Kinds of pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    /// Button pressed down.
    Down(PointerButton),
    /// Pointer moved, with or without a held button.
    Move,
    /// Button released.
    Up(PointerButton),
    /// The host aborted the gesture (focus loss, escape key, capture lost).
    Cancel,
}

/// One pointer event in layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Point,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Primary-button press at `(x, y)`.
    #[must_use]
    pub const fn down(x: f32, y: f32) -> Self {
        Self::new(
            PointerEventKind::Down(PointerButton::Primary),
            Point::new(x, y),
        )
    }

    /// Pointer motion to `(x, y)`.
    #[must_use]
    pub const fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Move, Point::new(x, y))
    }

    /// Primary-button release at `(x, y)`.
    #[must_use]
    pub const fn up(x: f32, y: f32) -> Self {
        Self::new(
            PointerEventKind::Up(PointerButton::Primary),
            Point::new(x, y),
        )
    }

    /// Gesture cancellation at `(x, y)`.
    #[must_use]
    pub const fn cancel(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Cancel, Point::new(x, y))
    }

    /// Whether this event involves the primary button.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        matches!(
            self.kind,
            PointerEventKind::Down(PointerButton::Primary)
                | PointerEventKind::Up(PointerButton::Primary)
        )
    }
}
