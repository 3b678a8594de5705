#![forbid(unsafe_code)]

//! Canonical pointer events.
//!
//! Hosts translate their native input (browser pointer events, terminal mouse
//! reports, test scripts) into [`PointerEvent`] values. All events derive
//! `Clone`, `PartialEq`, and `Eq` for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Coordinates are board coordinates (see [`crate::geometry`]).
//! - Interruptions that are not pointer-related (focus loss, visibility
//!   change, lost capture) are all reported as [`PointerEventKind::Cancel`].

use crate::geometry::Point;

/// Identifier of the physical pointer (mouse, pen, or touch contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PointerId(pub u32);

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Primary button pressed.
    Down,
    /// Pointer moved while pressed.
    Move,
    /// Primary button released.
    Up,
    /// The interaction was interrupted by the host.
    Cancel,
}

/// A single pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,
    /// Which pointer produced the event.
    pub pointer_id: PointerId,
    /// Position in board coordinates.
    pub position: Point,
}

impl PointerEvent {
    /// Create a new pointer event for the default pointer.
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            pointer_id: PointerId(0),
            position: Point::new(x, y),
        }
    }

    /// Pointer pressed at `(x, y)`.
    #[must_use]
    pub const fn down(x: i32, y: i32) -> Self {
        Self::new(PointerEventKind::Down, x, y)
    }

    /// Pointer moved to `(x, y)`.
    #[must_use]
    pub const fn moved(x: i32, y: i32) -> Self {
        Self::new(PointerEventKind::Move, x, y)
    }

    /// Pointer released at `(x, y)`.
    #[must_use]
    pub const fn up(x: i32, y: i32) -> Self {
        Self::new(PointerEventKind::Up, x, y)
    }

    /// Interaction cancelled by the host.
    #[must_use]
    pub const fn cancel() -> Self {
        Self::new(PointerEventKind::Cancel, 0, 0)
    }

    /// Attribute the event to a specific pointer.
    #[must_use]
    pub const fn with_pointer(mut self, pointer_id: PointerId) -> Self {
        self.pointer_id = pointer_id;
        self
    }
}
