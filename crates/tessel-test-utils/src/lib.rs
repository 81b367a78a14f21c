//! Test utilities for the Tessel UI toolkit.
//!
//! Recording display objects that log every drag-and-drop callback they
//! receive into a shared [`EventLog`], plus small widgets for exercising
//! validation and focus.
//!
//! # Example
//!
//! ```rust
//! use tessel_core::geometry::Size;
//! use tessel_test_utils::{EventLog, RecordingTarget};
//! use tessel_ui::scene::SceneGraph;
//!
//! let log = EventLog::new();
//! let mut scene = SceneGraph::new(Size::new(800.0, 600.0));
//! let target = scene.create(RecordingTarget::accepting("bin", &log));
//!
//! assert!(log.is_empty());
//! # let _ = target;
//! ```
//!
//! The log uses `parking_lot::Mutex` so clones can be handed to any number
//! of recorders and inspected from the test afterwards.

use std::sync::Arc;

use parking_lot::Mutex;
use tessel_core::geometry::{Rect, Size};
use tessel_core::math::Vec2;
use tessel_ui::drag_drop::{DragDropEvent, DragDropEventKind};
use tessel_ui::scene::{DisplayObject, DragSource, DropTarget, Validatable};

/// One callback received by a recording object.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub receiver: String,
    pub kind: DragDropEventKind,
    pub local: Vec2,
    pub dropped: bool,
}

impl RecordedCall {
    /// Short form such as `enter(a)`, handy for order assertions.
    pub fn label(&self) -> String {
        let kind = match self.kind {
            DragDropEventKind::Start => "start",
            DragDropEventKind::Enter => "enter",
            DragDropEventKind::Move => "move",
            DragDropEventKind::Exit => "exit",
            DragDropEventKind::Drop => "drop",
            DragDropEventKind::Complete => "complete",
        };
        format!("{}({})", kind, self.receiver)
    }
}

/// Shared, ordered log of recorded callbacks.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, receiver: &str, event: &DragDropEvent<'_>) {
        self.calls.lock().push(RecordedCall {
            receiver: receiver.to_string(),
            kind: event.kind,
            local: event.local,
            dropped: event.dropped,
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Labels of every call in order, see [`RecordedCall::label`].
    pub fn labels(&self) -> Vec<String> {
        self.calls.lock().iter().map(RecordedCall::label).collect()
    }

    pub fn count(&self, kind: DragDropEventKind) -> usize {
        self.calls.lock().iter().filter(|c| c.kind == kind).count()
    }

    pub fn last(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// When a [`RecordingTarget`] accepts a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptPolicy {
    Never,
    Always,
    /// Accept when the drag carries this format.
    Format(String),
}

/// Leaf drop target that records its callbacks.
#[derive(Debug)]
pub struct RecordingTarget {
    name: String,
    log: EventLog,
    policy: AcceptPolicy,
}

impl RecordingTarget {
    pub fn new(name: impl Into<String>, log: &EventLog, policy: AcceptPolicy) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            policy,
        }
    }

    pub fn accepting(name: impl Into<String>, log: &EventLog) -> Self {
        Self::new(name, log, AcceptPolicy::Always)
    }

    pub fn rejecting(name: impl Into<String>, log: &EventLog) -> Self {
        Self::new(name, log, AcceptPolicy::Never)
    }

    fn wants(&self, event: &DragDropEvent<'_>) -> bool {
        match &self.policy {
            AcceptPolicy::Never => false,
            AcceptPolicy::Always => true,
            AcceptPolicy::Format(format) => event.data.has_data_for_format(format),
        }
    }
}

impl DisplayObject for RecordingTarget {
    fn debug_name(&self) -> &str {
        &self.name
    }

    fn as_drop_target(&self) -> Option<&dyn DropTarget> {
        Some(self)
    }

    fn as_drop_target_mut(&mut self) -> Option<&mut dyn DropTarget> {
        Some(self)
    }
}

impl DropTarget for RecordingTarget {
    fn on_drag_enter(&mut self, event: &mut DragDropEvent<'_>) {
        self.log.record(&self.name, event);
        if self.wants(event) {
            event.accept_drag();
        }
    }

    fn on_drag_move(&mut self, event: &mut DragDropEvent<'_>) {
        self.log.record(&self.name, event);
    }

    fn on_drag_exit(&mut self, event: &DragDropEvent<'_>) {
        self.log.record(&self.name, event);
    }

    fn on_drag_drop(&mut self, event: &DragDropEvent<'_>) {
        self.log.record(&self.name, event);
    }
}

/// Leaf drag source that records start and completion.
#[derive(Debug)]
pub struct RecordingSource {
    name: String,
    log: EventLog,
}

impl RecordingSource {
    pub fn new(name: impl Into<String>, log: &EventLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
        }
    }
}

impl DisplayObject for RecordingSource {
    fn debug_name(&self) -> &str {
        &self.name
    }

    fn as_drag_source_mut(&mut self) -> Option<&mut dyn DragSource> {
        Some(self)
    }
}

impl DragSource for RecordingSource {
    fn on_drag_start(&mut self, event: &DragDropEvent<'_>) {
        self.log.record(&self.name, event);
    }

    fn on_drag_complete(&mut self, event: &DragDropEvent<'_>) {
        self.log.record(&self.name, event);
    }
}

/// Leaf whose size is only known after validation, like measured text.
#[derive(Debug, Clone)]
pub struct SizedWidget {
    measured: Size<f32>,
    validations: Arc<Mutex<usize>>,
}

impl SizedWidget {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            measured: Size::new(width, height),
            validations: Arc::new(Mutex::new(0)),
        }
    }

    /// Shared counter of `validate` calls, readable after the widget moved
    /// into the scene.
    pub fn validations(&self) -> Arc<Mutex<usize>> {
        self.validations.clone()
    }
}

impl DisplayObject for SizedWidget {
    fn debug_name(&self) -> &str {
        "SizedWidget"
    }

    fn as_validatable_mut(&mut self) -> Option<&mut dyn Validatable> {
        Some(self)
    }
}

impl Validatable for SizedWidget {
    fn validate(&mut self, frame: &mut Rect<f32>) {
        *self.validations.lock() += 1;
        frame.width = self.measured.width;
        frame.height = self.measured.height;
    }
}

/// Focusable leaf.
#[derive(Debug, Clone, Default)]
pub struct FocusableBox {
    name: String,
}

impl FocusableBox {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DisplayObject for FocusableBox {
    fn debug_name(&self) -> &str {
        &self.name
    }

    fn is_focusable(&self) -> bool {
        true
    }
}
