//! Display object capability traits.
//!
//! Objects stored in the [`SceneGraph`](super::SceneGraph) advertise what they
//! can do through query methods instead of being inspected at runtime. A
//! drop target, for example, is any object whose
//! [`DisplayObject::as_drop_target_mut`] returns `Some`.
//!
//! ```rust,ignore
//! fn validate_if_possible(object: &mut dyn DisplayObject, frame: &mut Rect<f32>) {
//!     if let Some(validating) = object.as_validatable_mut() {
//!         validating.validate(frame);
//!     }
//! }
//! ```

use tessel_core::geometry::Rect;

use crate::drag_drop::DragDropEvent;

/// Base trait for everything that can live in the scene graph.
pub trait DisplayObject {
    /// Name used in logs and debug output.
    fn debug_name(&self) -> &str {
        "DisplayObject"
    }

    /// Whether the object may own children.
    fn is_container(&self) -> bool {
        false
    }

    /// Whether keyboard focus may land on this object.
    fn is_focusable(&self) -> bool {
        false
    }

    // Capability query methods (immutable)

    /// Query if this object receives drag-and-drop notifications.
    fn as_drop_target(&self) -> Option<&dyn DropTarget> {
        None
    }

    // Capability query methods (mutable)

    /// Query if this object resolves deferred measurement on demand.
    fn as_validatable_mut(&mut self) -> Option<&mut dyn Validatable> {
        None
    }

    /// Query if this object receives drag-and-drop notifications (mutable).
    fn as_drop_target_mut(&mut self) -> Option<&mut dyn DropTarget> {
        None
    }

    /// Query if this object wants to hear about drags it started.
    fn as_drag_source_mut(&mut self) -> Option<&mut dyn DragSource> {
        None
    }
}

/// Capability: deferred layout or measurement that can be forced.
///
/// `frame` is the node's current frame relative to its parent. The object may
/// change any part of it; the scene graph applies the result and fires resize
/// notifications when the size changed.
pub trait Validatable {
    fn validate(&mut self, frame: &mut Rect<f32>);
}

/// Capability: an object that can receive a drop.
///
/// `enter` and `move` receive a mutable event so the target can call
/// [`DragDropEvent::accept_drag`]. Accepting is only meaningful between the
/// target's `enter` and its `exit`.
pub trait DropTarget {
    fn on_drag_enter(&mut self, event: &mut DragDropEvent<'_>);

    fn on_drag_move(&mut self, _event: &mut DragDropEvent<'_>) {}

    fn on_drag_exit(&mut self, _event: &DragDropEvent<'_>) {}

    fn on_drag_drop(&mut self, event: &DragDropEvent<'_>);
}

/// Capability: an object that starts drags and wants to know how they ended.
pub trait DragSource {
    fn on_drag_start(&mut self, _event: &DragDropEvent<'_>) {}

    /// Called after the session is torn down. `event.dropped` tells whether a
    /// target accepted the drop.
    fn on_drag_complete(&mut self, event: &DragDropEvent<'_>);
}
