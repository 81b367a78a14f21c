//! Touch and key input model.
//!
//! The host translates platform events into these types before handing them
//! to [`UiCore`](crate::UiCore). Positions are always in stage coordinates.

use tessel_core::math::Vec2;

/// Stable identity of one physical touch (or the mouse pointer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TouchId(pub i32);

/// Phase of a touch within its gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
}

/// A snapshot of a touch, used to start a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: TouchId,
    pub position: Vec2,
}

impl Touch {
    pub fn new(id: i32, x: f32, y: f32) -> Self {
        Self {
            id: TouchId(id),
            position: Vec2::new(x, y),
        }
    }
}

/// A phase-tagged touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub id: TouchId,
    pub phase: TouchPhase,
    pub position: Vec2,
}

impl TouchEvent {
    pub fn began(id: i32, x: f32, y: f32) -> Self {
        Self::new(id, TouchPhase::Began, x, y)
    }

    pub fn moved(id: i32, x: f32, y: f32) -> Self {
        Self::new(id, TouchPhase::Moved, x, y)
    }

    pub fn ended(id: i32, x: f32, y: f32) -> Self {
        Self::new(id, TouchPhase::Ended, x, y)
    }

    pub fn new(id: i32, phase: TouchPhase, x: f32, y: f32) -> Self {
        Self {
            id: TouchId(id),
            phase,
            position: Vec2::new(x, y),
        }
    }

    pub fn touch(&self) -> Touch {
        Touch {
            id: self.id,
            position: self.position,
        }
    }
}

/// Keys the toolkit reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    /// Platform back button (Android).
    Back,
    Tab,
    ShiftTab,
    Other(u32),
}

impl Key {
    /// Whether this key cancels an in-progress drag.
    pub fn is_cancel(&self) -> bool {
        matches!(self, Key::Escape | Key::Back)
    }
}
