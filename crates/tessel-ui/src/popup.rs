//! Pop-up management: modal overlays, centering and focus trapping.
//!
//! Pop-ups are display objects layered on top of a root container. A modal
//! pop-up gets an overlay (a stage-sized scrim) inserted directly beneath it
//! and, when focus management is enabled, its own focus manager so keyboard
//! navigation stays inside it. Centered pop-ups are re-centered whenever they
//! or the stage change size.
//!
//! A pop-up stops being tracked when it leaves the scene graph, whatever
//! detached it: [`PopUpManager::remove_pop_up`], disposing it, or
//! reparenting it elsewhere. All cleanup runs from the scene graph's removal
//! notification, on the same call stack as the detach.
//!
//! # Example
//!
//! ```
//! use tessel_core::geometry::Size;
//! use tessel_ui::popup::PopUpManager;
//! use tessel_ui::scene::{Container, SceneGraph};
//!
//! let mut scene = SceneGraph::new(Size::new(800.0, 600.0));
//! let mut pop_ups = PopUpManager::new(scene.root());
//!
//! let dialog = scene.create(Container::new());
//! scene.set_size(dialog, 200.0, 100.0).unwrap();
//! pop_ups.add_pop_up(&mut scene, dialog, true, true, None).unwrap();
//!
//! assert!(pop_ups.is_top_level_pop_up(dialog));
//! assert_eq!(scene.position(dialog).unwrap().x, 300.0);
//!
//! // Detaching by any means untracks it.
//! scene.remove_from_parent(dialog).unwrap();
//! assert!(!pop_ups.is_pop_up(dialog));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tessel_core::alloc::HashMap;
use tessel_core::geometry::Size;
use tessel_core::math::Vec4;
use tessel_core::profiling::profile_function;

use crate::focus::{FocusScopeId, FocusStack};
use crate::scene::{ListenerId, NodeId, Quad, SceneError, SceneGraph, SceneResult};

/// Creates the overlay placed under a modal pop-up.
pub type OverlayFactory = Rc<dyn Fn(&mut SceneGraph) -> NodeId>;

/// Errors raised by pop-up operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopUpError {
    #[error("{0:?} is not a pop-up")]
    NotAPopUp(NodeId),
    #[error("{0:?} is already a pop-up")]
    AlreadyPopUp(NodeId),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Result type for pop-up operations.
pub type PopUpResult<T> = Result<T, PopUpError>;

/// Pop-up lifecycle notifications, drained with [`PopUpManager::pop_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopUpEvent {
    Added { pop_up: NodeId, modal: bool },
    Removed(NodeId),
}

struct PopUpState {
    root: NodeId,
    /// Bottom to top.
    pop_ups: Vec<NodeId>,
    overlays: HashMap<NodeId, NodeId>,
    focus_scopes: HashMap<NodeId, FocusScopeId>,
    /// Centered pop-ups and their resize subscriptions.
    centered: HashMap<NodeId, ListenerId>,
    removal_listeners: HashMap<NodeId, ListenerId>,
    stage_listener: Option<ListenerId>,
    /// Set while migrating to a new root.
    ignore_removals: bool,
    focus: Option<Rc<RefCell<FocusStack>>>,
    events: Vec<PopUpEvent>,
}

/// Tracks pop-ups layered on one root container.
pub struct PopUpManager {
    state: Rc<RefCell<PopUpState>>,
    overlay_factory: Option<OverlayFactory>,
    overlay_color: Vec4,
}

impl PopUpManager {
    /// Create a manager attaching pop-ups to `root`, without focus management.
    pub fn new(root: NodeId) -> Self {
        let state = PopUpState {
            root,
            pop_ups: Vec::new(),
            overlays: HashMap::default(),
            focus_scopes: HashMap::default(),
            centered: HashMap::default(),
            removal_listeners: HashMap::default(),
            stage_listener: None,
            ignore_removals: false,
            focus: None,
            events: Vec::new(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            overlay_factory: None,
            overlay_color: Vec4::new(0.0, 0.0, 0.0, 0.5),
        }
    }

    /// Enable focus management: modal container pop-ups push a manager here.
    pub fn with_focus_stack(self, focus: Rc<RefCell<FocusStack>>) -> Self {
        self.state.borrow_mut().focus = Some(focus);
        self
    }

    pub fn with_overlay_color(mut self, color: Vec4) -> Self {
        self.overlay_color = color;
        self
    }

    /// Instance-level overlay factory, used when `add_pop_up` gets none.
    pub fn set_overlay_factory(&mut self, factory: Option<OverlayFactory>) {
        self.overlay_factory = factory;
    }

    pub fn focus_stack(&self) -> Option<Rc<RefCell<FocusStack>>> {
        self.state.borrow().focus.clone()
    }

    /// The container pop-ups are attached to.
    pub fn root(&self) -> NodeId {
        self.state.borrow().root
    }

    pub fn is_pop_up(&self, node: NodeId) -> bool {
        self.state.borrow().pop_ups.contains(&node)
    }

    pub fn pop_up_count(&self) -> usize {
        self.state.borrow().pop_ups.len()
    }

    /// Tracked pop-ups, bottom to top.
    pub fn pop_ups(&self) -> Vec<NodeId> {
        self.state.borrow().pop_ups.clone()
    }

    pub fn overlay_for(&self, pop_up: NodeId) -> Option<NodeId> {
        self.state.borrow().overlays.get(&pop_up).copied()
    }

    pub fn focus_scope_for(&self, pop_up: NodeId) -> Option<FocusScopeId> {
        self.state.borrow().focus_scopes.get(&pop_up).copied()
    }

    pub fn is_centered(&self, pop_up: NodeId) -> bool {
        self.state.borrow().centered.contains_key(&pop_up)
    }

    pub fn has_modal_pop_ups(&self) -> bool {
        !self.state.borrow().overlays.is_empty()
    }

    pub fn is_listening_for_stage_resize(&self) -> bool {
        self.state.borrow().stage_listener.is_some()
    }

    /// Pop all pending lifecycle events.
    pub fn pop_events(&mut self) -> Vec<PopUpEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    /// Add `pop_up` on top of every other pop-up.
    ///
    /// Modal pop-ups get an overlay from `overlay_factory`, falling back to
    /// the instance factory and then to a plain scrim. Centered pop-ups are
    /// centered immediately and again whenever they resize.
    pub fn add_pop_up(
        &mut self,
        scene: &mut SceneGraph,
        pop_up: NodeId,
        is_modal: bool,
        is_centered: bool,
        overlay_factory: Option<OverlayFactory>,
    ) -> PopUpResult<()> {
        profile_function!();
        if !scene.contains(pop_up) {
            return Err(SceneError::NodeNotFound(pop_up).into());
        }
        if self.is_pop_up(pop_up) {
            tracing::warn!("{:?} added as a pop-up twice", pop_up);
            return Err(PopUpError::AlreadyPopUp(pop_up));
        }
        let root = self.root();
        if pop_up == root || scene.is_ancestor(pop_up, root) {
            return Err(SceneError::CyclicHierarchy {
                parent: root,
                child: pop_up,
            }
            .into());
        }

        if is_modal {
            let overlay = match overlay_factory.or_else(|| self.overlay_factory.clone()) {
                Some(factory) => factory(scene),
                None => scene.create(Quad::new(self.overlay_color).named("pop_up_overlay")),
            };
            let stage = scene.stage_size();
            scene.set_position(overlay, 0.0, 0.0)?;
            scene.set_size(overlay, stage.width, stage.height)?;
            scene.add_child(root, overlay)?;
            self.state.borrow_mut().overlays.insert(pop_up, overlay);
        }

        // Appending keeps the newest pop-up topmost, directly above its overlay.
        if let Err(err) = scene.add_child(root, pop_up) {
            let overlay = self.state.borrow_mut().overlays.remove(&pop_up);
            if let Some(overlay) = overlay {
                scene.dispose(overlay)?;
            }
            return Err(err.into());
        }

        let weak = Rc::downgrade(&self.state);
        let removal = scene.on_removed(pop_up, move |scene, node| {
            if let Some(state) = weak.upgrade() {
                Self::handle_removed(&state, scene, node);
            }
        });
        let needs_stage_listener = {
            let mut state = self.state.borrow_mut();
            state.pop_ups.push(pop_up);
            state.removal_listeners.insert(pop_up, removal);
            state.stage_listener.is_none()
        };

        if needs_stage_listener {
            let weak = Rc::downgrade(&self.state);
            let listener = scene.on_stage_resized(move |scene, size| {
                if let Some(state) = weak.upgrade() {
                    Self::handle_stage_resized(&state, scene, size);
                }
            });
            self.state.borrow_mut().stage_listener = Some(listener);
        }

        let focus = self.focus_stack();
        if let Some(focus) = focus
            && is_modal
            && scene.is_container(pop_up)
        {
            let scope = focus.borrow_mut().push(pop_up);
            self.state.borrow_mut().focus_scopes.insert(pop_up, scope);
        }

        if is_centered {
            let weak = Rc::downgrade(&self.state);
            let listener = scene.on_resized(pop_up, move |scene, node| {
                if weak.upgrade().is_some()
                    && let Err(err) = center_pop_up(scene, node)
                {
                    tracing::warn!("failed to re-center {:?}: {}", node, err);
                }
            });
            self.state.borrow_mut().centered.insert(pop_up, listener);
            center_pop_up(scene, pop_up)?;
        }

        tracing::debug!(
            "added pop-up {:?} ({}) modal={} centered={}",
            pop_up,
            scene.debug_name(pop_up),
            is_modal,
            is_centered
        );
        self.state.borrow_mut().events.push(PopUpEvent::Added {
            pop_up,
            modal: is_modal,
        });
        Ok(())
    }

    /// Detach a tracked pop-up, optionally disposing it.
    ///
    /// Bookkeeping happens in the removal notification the detach triggers.
    pub fn remove_pop_up(
        &mut self,
        scene: &mut SceneGraph,
        pop_up: NodeId,
        dispose: bool,
    ) -> PopUpResult<()> {
        if !self.is_pop_up(pop_up) {
            tracing::warn!("{:?} is not a pop-up", pop_up);
            return Err(PopUpError::NotAPopUp(pop_up));
        }
        if dispose {
            scene.dispose(pop_up)?;
        } else {
            scene.remove_from_parent(pop_up)?;
        }
        Ok(())
    }

    /// Whether nothing modal sits above `pop_up`.
    ///
    /// Scans from the topmost pop-up down: reaching `pop_up` means it is
    /// top-level, meeting a modal pop-up first means it is covered.
    pub fn is_top_level_pop_up(&self, pop_up: NodeId) -> bool {
        let state = self.state.borrow();
        for other in state.pop_ups.iter().rev() {
            if *other == pop_up {
                return true;
            }
            if state.overlays.contains_key(other) {
                return false;
            }
        }
        false
    }

    /// Center `pop_up` on the stage. See [`center_pop_up`].
    pub fn center_pop_up(&self, scene: &mut SceneGraph, pop_up: NodeId) -> PopUpResult<()> {
        Ok(center_pop_up(scene, pop_up)?)
    }

    /// Move every pop-up and overlay to `root`, preserving their order.
    pub fn set_root(&mut self, scene: &mut SceneGraph, root: NodeId) -> PopUpResult<()> {
        if !scene.contains(root) {
            return Err(SceneError::NodeNotFound(root).into());
        }
        if !scene.is_container(root) {
            return Err(SceneError::NotAContainer(root).into());
        }
        let (old_root, pop_ups, overlays) = {
            let state = self.state.borrow();
            (state.root, state.pop_ups.clone(), state.overlays.clone())
        };
        if old_root == root {
            return Ok(());
        }
        if let Some(&pop_up) = pop_ups
            .iter()
            .find(|p| **p == root || scene.is_ancestor(**p, root))
        {
            return Err(SceneError::CyclicHierarchy {
                parent: root,
                child: pop_up,
            }
            .into());
        }

        self.state.borrow_mut().ignore_removals = true;
        let migrated = (|| -> SceneResult<()> {
            for pop_up in &pop_ups {
                if let Some(overlay) = overlays.get(pop_up) {
                    scene.add_child(root, *overlay)?;
                }
                scene.add_child(root, *pop_up)?;
            }
            Ok(())
        })();
        {
            let mut state = self.state.borrow_mut();
            state.ignore_removals = false;
            state.root = root;
        }
        tracing::debug!(
            "moved {} pop-ups from {:?} to {:?}",
            pop_ups.len(),
            old_root,
            root
        );
        Ok(migrated?)
    }

    fn handle_removed(state: &Rc<RefCell<PopUpState>>, scene: &mut SceneGraph, pop_up: NodeId) {
        let (removal, overlay, scope, center, stage, focus) = {
            let mut state = state.borrow_mut();
            if state.ignore_removals {
                return;
            }
            let Some(index) = state.pop_ups.iter().position(|p| *p == pop_up) else {
                return;
            };
            state.pop_ups.remove(index);
            let stage = if state.pop_ups.is_empty() {
                state.stage_listener.take()
            } else {
                None
            };
            state.events.push(PopUpEvent::Removed(pop_up));
            (
                state.removal_listeners.remove(&pop_up),
                state.overlays.remove(&pop_up),
                state.focus_scopes.remove(&pop_up),
                state.centered.remove(&pop_up),
                stage,
                state.focus.clone(),
            )
        };

        for listener in [removal, center, stage].into_iter().flatten() {
            scene.remove_listener(listener);
        }
        if let Some(overlay) = overlay
            && let Err(err) = scene.dispose(overlay)
        {
            tracing::warn!("failed to dispose overlay {:?}: {}", overlay, err);
        }
        if let (Some(scope), Some(focus)) = (scope, focus) {
            focus.borrow_mut().remove(scope);
        }
        tracing::debug!("pop-up {:?} removed", pop_up);
    }

    fn handle_stage_resized(
        state: &Rc<RefCell<PopUpState>>,
        scene: &mut SceneGraph,
        size: Size<f32>,
    ) {
        let (overlays, centered) = {
            let state = state.borrow();
            let overlays: Vec<NodeId> = state
                .pop_ups
                .iter()
                .filter_map(|p| state.overlays.get(p).copied())
                .collect();
            let centered: Vec<NodeId> = state
                .pop_ups
                .iter()
                .filter(|p| state.centered.contains_key(p))
                .copied()
                .collect();
            (overlays, centered)
        };

        for overlay in overlays {
            if let Err(err) = scene.set_size(overlay, size.width, size.height) {
                tracing::warn!("failed to resize overlay {:?}: {}", overlay, err);
            }
        }
        for pop_up in centered {
            if let Err(err) = center_pop_up(scene, pop_up) {
                tracing::warn!("failed to re-center {:?}: {}", pop_up, err);
            }
        }
    }
}

impl fmt::Debug for PopUpManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("PopUpManager")
            .field("root", &state.root)
            .field("pop_ups", &state.pop_ups)
            .field("overlays", &state.overlays.len())
            .field("focus_scopes", &state.focus_scopes.len())
            .field("centered", &state.centered.len())
            .finish()
    }
}

/// Validate `node`, then place it in the middle of the stage.
///
/// The position is rounded to whole pixels.
pub fn center_pop_up(scene: &mut SceneGraph, node: NodeId) -> SceneResult<()> {
    scene.validate(node)?;
    let free = scene.stage_size() - scene.size(node)?;
    let x = (free.width / 2.0).round();
    let y = (free.height / 2.0).round();
    scene.set_position(node, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Container;
    use tessel_core::math::Vec2;

    fn setup() -> (SceneGraph, PopUpManager) {
        let scene = SceneGraph::new(Size::new(800.0, 600.0));
        let pop_ups = PopUpManager::new(scene.root());
        (scene, pop_ups)
    }

    fn panel(scene: &mut SceneGraph, width: f32, height: f32) -> NodeId {
        let node = scene.create(Container::new());
        scene.set_size(node, width, height).unwrap();
        node
    }

    #[test]
    fn test_modal_overlay_sits_below_pop_up() {
        let (mut scene, mut pop_ups) = setup();
        let dialog = panel(&mut scene, 100.0, 100.0);
        pop_ups.add_pop_up(&mut scene, dialog, true, false, None).unwrap();

        let overlay = pop_ups.overlay_for(dialog).unwrap();
        assert_eq!(scene.children(scene.root()), &[overlay, dialog]);
        assert_eq!(scene.size(overlay).unwrap(), Size::new(800.0, 600.0));
        assert!(pop_ups.is_listening_for_stage_resize());
    }

    #[test]
    fn test_non_modal_has_no_overlay() {
        let (mut scene, mut pop_ups) = setup();
        let tip = panel(&mut scene, 10.0, 10.0);
        pop_ups.add_pop_up(&mut scene, tip, false, false, None).unwrap();

        assert!(pop_ups.overlay_for(tip).is_none());
        assert!(!pop_ups.has_modal_pop_ups());
    }

    #[test]
    fn test_remove_untracked_fails() {
        let (mut scene, mut pop_ups) = setup();
        let node = panel(&mut scene, 10.0, 10.0);
        assert_eq!(
            pop_ups.remove_pop_up(&mut scene, node, false),
            Err(PopUpError::NotAPopUp(node))
        );
    }

    #[test]
    fn test_add_twice_fails() {
        let (mut scene, mut pop_ups) = setup();
        let node = panel(&mut scene, 10.0, 10.0);
        pop_ups.add_pop_up(&mut scene, node, false, false, None).unwrap();
        assert_eq!(
            pop_ups.add_pop_up(&mut scene, node, false, false, None),
            Err(PopUpError::AlreadyPopUp(node))
        );
        assert_eq!(pop_ups.pop_up_count(), 1);
    }

    #[test]
    fn test_remove_cleans_everything() {
        let (mut scene, mut pop_ups) = setup();
        let dialog = panel(&mut scene, 100.0, 100.0);
        pop_ups.add_pop_up(&mut scene, dialog, true, true, None).unwrap();
        let overlay = pop_ups.overlay_for(dialog).unwrap();

        pop_ups.remove_pop_up(&mut scene, dialog, false).unwrap();

        assert_eq!(pop_ups.pop_up_count(), 0);
        assert!(pop_ups.overlay_for(dialog).is_none());
        assert!(!pop_ups.is_centered(dialog));
        assert!(!scene.contains(overlay));
        assert!(scene.contains(dialog));
        assert!(!pop_ups.is_listening_for_stage_resize());
    }

    #[test]
    fn test_dispose_removes_node() {
        let (mut scene, mut pop_ups) = setup();
        let dialog = panel(&mut scene, 100.0, 100.0);
        pop_ups.add_pop_up(&mut scene, dialog, false, false, None).unwrap();

        pop_ups.remove_pop_up(&mut scene, dialog, true).unwrap();

        assert!(!scene.contains(dialog));
        assert_eq!(pop_ups.pop_up_count(), 0);
    }

    #[test]
    fn test_center_rounds() {
        let (mut scene, pop_ups) = setup();
        let node = panel(&mut scene, 101.0, 51.0);
        pop_ups.center_pop_up(&mut scene, node).unwrap();
        // (800 - 101) / 2 = 349.5, (600 - 51) / 2 = 274.5
        assert_eq!(scene.position(node).unwrap(), Vec2::new(350.0, 275.0));
    }

    #[test]
    fn test_centered_pop_up_follows_own_resize() {
        let (mut scene, mut pop_ups) = setup();
        let dialog = panel(&mut scene, 100.0, 100.0);
        pop_ups.add_pop_up(&mut scene, dialog, false, true, None).unwrap();
        assert_eq!(scene.position(dialog).unwrap(), Vec2::new(350.0, 250.0));

        scene.set_size(dialog, 200.0, 300.0).unwrap();
        assert_eq!(scene.position(dialog).unwrap(), Vec2::new(300.0, 150.0));
    }

    #[test]
    fn test_custom_overlay_factory_priority() {
        let (mut scene, mut pop_ups) = setup();
        let instance_made = Rc::new(RefCell::new(0));
        let counter = instance_made.clone();
        pop_ups.set_overlay_factory(Some(Rc::new(move |scene: &mut SceneGraph| {
            *counter.borrow_mut() += 1;
            scene.create(Quad::new(Vec4::ZERO).named("instance"))
        })));

        let a = panel(&mut scene, 10.0, 10.0);
        pop_ups.add_pop_up(&mut scene, a, true, false, None).unwrap();
        assert_eq!(*instance_made.borrow(), 1);

        let b = panel(&mut scene, 10.0, 10.0);
        let explicit: OverlayFactory =
            Rc::new(|scene: &mut SceneGraph| scene.create(Quad::new(Vec4::ONE).named("explicit")));
        pop_ups.add_pop_up(&mut scene, b, true, false, Some(explicit)).unwrap();
        assert_eq!(*instance_made.borrow(), 1);
        let overlay = pop_ups.overlay_for(b).unwrap();
        assert_eq!(scene.debug_name(overlay), "explicit");
    }

    #[test]
    fn test_events_recorded() {
        let (mut scene, mut pop_ups) = setup();
        let dialog = panel(&mut scene, 10.0, 10.0);
        pop_ups.add_pop_up(&mut scene, dialog, true, false, None).unwrap();
        scene.remove_from_parent(dialog).unwrap();

        assert_eq!(
            pop_ups.pop_events(),
            vec![
                PopUpEvent::Added {
                    pop_up: dialog,
                    modal: true
                },
                PopUpEvent::Removed(dialog),
            ]
        );
    }
}
