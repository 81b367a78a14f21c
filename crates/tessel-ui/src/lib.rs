//! Tessel UI - retained scene graph with viewports, pop-ups and drag-and-drop
//!
//! This crate provides the interaction core of a retained-mode UI toolkit:
//! - Scene graph with synchronous removal and resize notifications
//! - Viewport bounds resolution with min/max/explicit constraints
//! - Pluggable layouts, including a virtualized vertical list
//! - Pop-up stacking with modal overlays and focus trapping
//! - A single-session drag-and-drop state machine
//!
//! ## Quick Start
//!
//! ```
//! use tessel_core::math::Vec2;
//! use tessel_ui::UiCore;
//! use tessel_ui::drag_drop::DragData;
//! use tessel_ui::input::{Touch, TouchEvent};
//! use tessel_ui::scene::{Container, Quad};
//! use tessel_core::math::Vec4;
//!
//! let mut ui = UiCore::new();
//!
//! let dialog = ui.scene_mut().create(Container::new());
//! ui.scene_mut().set_size(dialog, 200.0, 100.0).unwrap();
//! ui.add_pop_up(dialog, true, true).unwrap();
//!
//! let item = ui.scene_mut().create(Quad::new(Vec4::ONE));
//! ui.start_drag(item, Touch::new(0, 10.0, 10.0), DragData::new(), None, Vec2::ZERO)
//!     .unwrap();
//! ui.dispatch_touch(&TouchEvent::ended(0, 10.0, 10.0)).unwrap();
//! assert!(!ui.drag_drop().is_dragging());
//! ```

pub mod drag_drop;
pub mod focus;
pub mod input;
pub mod layout;
pub mod popup;
pub mod scene;
pub mod viewport;

use std::cell::RefCell;
use std::rc::Rc;

use tessel_core::config::UiConfig;
use tessel_core::math::Vec2;

pub use drag_drop::{
    DragData, DragDropError, DragDropEvent, DragDropEventKind, DragDropManager,
    DragDropNotification, DragDropResult,
};
pub use focus::{FocusDirection, FocusEvent, FocusManager, FocusScopeId, FocusStack};
pub use input::{Key, Touch, TouchEvent, TouchId, TouchPhase};
pub use layout::{Layout, VerticalLayout};
pub use popup::{OverlayFactory, PopUpError, PopUpEvent, PopUpManager, PopUpResult};
pub use scene::{
    Container, DisplayObject, DragSource, DropTarget, NodeId, Quad, SceneError, SceneGraph,
    SceneResult, Validatable,
};
pub use viewport::{
    Invalidation, LayoutBoundsResult, LayoutViewPort, ViewPortBounds, ViewPortError,
    ViewPortResult, resolve_bounds,
};

/// Host-facing UI core: one stage, its pop-up layer, focus and the drag
/// session.
///
/// Input is fed in through [`dispatch_touch`](Self::dispatch_touch) and
/// [`dispatch_key`](Self::dispatch_key); stage size changes through
/// [`resize`](Self::resize).
pub struct UiCore {
    scene: SceneGraph,
    pop_ups: PopUpManager,
    drag_drop: DragDropManager,
    focus: Option<Rc<RefCell<FocusStack>>>,
    config: UiConfig,
}

impl UiCore {
    /// Create a UI core with the default configuration.
    pub fn new() -> Self {
        Self::with_config(UiConfig::default())
    }

    pub fn with_config(config: UiConfig) -> Self {
        let scene = SceneGraph::new(config.stage_size);
        let root = scene.root();
        let focus = config
            .focus_management
            .then(|| Rc::new(RefCell::new(FocusStack::new(root))));
        let mut pop_ups = PopUpManager::new(root).with_overlay_color(config.overlay_color);
        if let Some(stack) = &focus {
            pop_ups = pop_ups.with_focus_stack(stack.clone());
        }
        tracing::debug!(
            "ui core created: stage {}x{}, focus management {}",
            config.stage_size.width,
            config.stage_size.height,
            config.focus_management
        );

        Self {
            scene,
            pop_ups,
            drag_drop: DragDropManager::new(),
            focus,
            config,
        }
    }

    /// Install the tracing subscriber using the configured filter.
    pub fn init_logging(&self) {
        tessel_core::logging::init_with_filter(&self.config.log_filter);
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn pop_ups(&self) -> &PopUpManager {
        &self.pop_ups
    }

    pub fn pop_ups_mut(&mut self) -> &mut PopUpManager {
        &mut self.pop_ups
    }

    pub fn drag_drop(&self) -> &DragDropManager {
        &self.drag_drop
    }

    pub fn drag_drop_mut(&mut self) -> &mut DragDropManager {
        &mut self.drag_drop
    }

    /// The focus stack, when focus management is enabled.
    pub fn focus_stack(&self) -> Option<Rc<RefCell<FocusStack>>> {
        self.focus.clone()
    }

    /// The node focused by the active focus manager.
    pub fn focused(&self) -> Option<NodeId> {
        self.focus
            .as_ref()
            .and_then(|stack| stack.borrow().active().and_then(|m| m.focused()))
    }

    pub fn add_pop_up(
        &mut self,
        pop_up: NodeId,
        is_modal: bool,
        is_centered: bool,
    ) -> PopUpResult<()> {
        self.pop_ups
            .add_pop_up(&mut self.scene, pop_up, is_modal, is_centered, None)
    }

    pub fn remove_pop_up(&mut self, pop_up: NodeId, dispose: bool) -> PopUpResult<()> {
        self.pop_ups.remove_pop_up(&mut self.scene, pop_up, dispose)
    }

    pub fn start_drag(
        &mut self,
        source: NodeId,
        touch: Touch,
        data: DragData,
        avatar: Option<NodeId>,
        offset: Vec2,
    ) -> DragDropResult<()> {
        self.drag_drop.start_drag(
            &mut self.scene,
            &mut self.pop_ups,
            source,
            touch,
            data,
            avatar,
            offset,
        )
    }

    pub fn accept_drag(&mut self, target: NodeId) -> DragDropResult<()> {
        self.drag_drop.accept_drag(target)
    }

    pub fn cancel_drag(&mut self) -> DragDropResult<()> {
        self.drag_drop.cancel_drag(&mut self.scene, &mut self.pop_ups)
    }

    /// Route a touch event. Returns whether anything consumed it.
    pub fn dispatch_touch(&mut self, event: &TouchEvent) -> DragDropResult<bool> {
        self.drag_drop
            .handle_touch(&mut self.scene, &mut self.pop_ups, event)
    }

    /// Route a key press: drag cancellation first, then focus navigation.
    pub fn dispatch_key(&mut self, key: Key) -> DragDropResult<bool> {
        if self
            .drag_drop
            .handle_key(&mut self.scene, &mut self.pop_ups, key)?
        {
            return Ok(true);
        }

        let direction = match key {
            Key::Tab => FocusDirection::Next,
            Key::ShiftTab => FocusDirection::Previous,
            _ => return Ok(false),
        };
        let Some(focus) = &self.focus else {
            return Ok(false);
        };
        let mut stack = focus.borrow_mut();
        let Some(manager) = stack.active_mut() else {
            return Ok(false);
        };
        manager.navigate(&self.scene, direction);
        Ok(true)
    }

    /// Resize the stage. Overlays and centered pop-ups follow.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.scene.resize_stage(width, height);
    }
}

impl Default for UiCore {
    fn default() -> Self {
        Self::new()
    }
}
