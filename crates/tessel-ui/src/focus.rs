//! Focus management and keyboard navigation.
//!
//! A [`FocusManager`] owns keyboard focus for one container subtree. Managers
//! are kept on a [`FocusStack`]; only the topmost one is active. Pushing a
//! manager scoped to a modal pop-up therefore traps Tab navigation inside
//! that pop-up until its manager is removed again.
//!
//! # Example
//!
//! ```
//! use tessel_core::geometry::Size;
//! use tessel_ui::focus::FocusStack;
//! use tessel_ui::scene::{Container, SceneGraph};
//!
//! let mut scene = SceneGraph::new(Size::new(800.0, 600.0));
//! let mut stack = FocusStack::new(scene.root());
//!
//! let dialog = scene.create(Container::new());
//! scene.add_child(scene.root(), dialog).unwrap();
//! let scope = stack.push(dialog);
//! assert_eq!(stack.active().map(|m| m.root()), Some(dialog));
//!
//! stack.remove(scope);
//! assert_eq!(stack.active().map(|m| m.root()), Some(scene.root()));
//! ```

use crate::scene::{NodeId, SceneGraph};

/// Focus navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    /// Move focus forward (Tab)
    Next,
    /// Move focus backward (Shift+Tab)
    Previous,
}

/// Focus event indicating a change in focus state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    /// Node gained focus
    Gained(NodeId),
    /// Node lost focus
    Lost(NodeId),
}

/// Identifies one manager on the focus stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusScopeId(pub u64);

impl FocusScopeId {
    pub const ROOT: Self = Self(0);
}

/// Keyboard focus for the focusable descendants of one container.
#[derive(Debug)]
pub struct FocusManager {
    scope: FocusScopeId,
    root: NodeId,
    focused: Option<NodeId>,
    events: Vec<FocusEvent>,
}

impl FocusManager {
    pub fn new(scope: FocusScopeId, root: NodeId) -> Self {
        Self {
            scope,
            root,
            focused: None,
            events: Vec::new(),
        }
    }

    pub fn scope(&self) -> FocusScopeId {
        self.scope
    }

    /// The container this manager is scoped to.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn is_focused(&self, node: NodeId) -> bool {
        self.focused == Some(node)
    }

    /// Focusable, visible descendants of the root in tree order.
    pub fn focusable_nodes(&self, scene: &SceneGraph) -> Vec<NodeId> {
        scene
            .descendants(self.root)
            .into_iter()
            .filter(|id| {
                scene.is_visible(*id) && scene.object(*id).is_some_and(|o| o.is_focusable())
            })
            .collect()
    }

    /// Focus a specific node. Fails for nodes outside this manager's scope.
    pub fn set_focus(&mut self, scene: &SceneGraph, node: NodeId) -> bool {
        if !self.focusable_nodes(scene).contains(&node) {
            return false;
        }
        self.focus_node(node);
        true
    }

    pub fn clear_focus(&mut self) {
        if let Some(old) = self.focused.take() {
            self.events.push(FocusEvent::Lost(old));
        }
    }

    /// Move focus to the next focusable node (Tab).
    pub fn focus_next(&mut self, scene: &SceneGraph) {
        self.navigate(scene, FocusDirection::Next);
    }

    /// Move focus to the previous focusable node (Shift+Tab).
    pub fn focus_previous(&mut self, scene: &SceneGraph) {
        self.navigate(scene, FocusDirection::Previous);
    }

    /// Navigate focus, wrapping around at either end.
    pub fn navigate(&mut self, scene: &SceneGraph, direction: FocusDirection) {
        let nodes = self.focusable_nodes(scene);
        if nodes.is_empty() {
            self.clear_focus();
            return;
        }

        let count = nodes.len();
        let current = self
            .focused
            .and_then(|focused| nodes.iter().position(|n| *n == focused));
        let next = match (direction, current) {
            (FocusDirection::Next, Some(idx)) => (idx + 1) % count,
            (FocusDirection::Next, None) => 0,
            (FocusDirection::Previous, Some(idx)) => (idx + count - 1) % count,
            (FocusDirection::Previous, None) => count - 1,
        };
        self.focus_node(nodes[next]);
    }

    /// Pop all pending focus events.
    pub fn pop_events(&mut self) -> Vec<FocusEvent> {
        std::mem::take(&mut self.events)
    }

    fn focus_node(&mut self, node: NodeId) {
        if self.focused == Some(node) {
            return;
        }
        if let Some(old) = self.focused.replace(node) {
            self.events.push(FocusEvent::Lost(old));
        }
        self.events.push(FocusEvent::Gained(node));
    }
}

/// Stack of focus managers; the topmost is the active one.
#[derive(Debug)]
pub struct FocusStack {
    managers: Vec<FocusManager>,
    next_scope: u64,
}

impl FocusStack {
    /// Create a stack whose base manager covers the whole stage.
    pub fn new(stage_root: NodeId) -> Self {
        Self {
            managers: vec![FocusManager::new(FocusScopeId::ROOT, stage_root)],
            next_scope: 1,
        }
    }

    /// Push a manager scoped to `root`, making it active.
    pub fn push(&mut self, root: NodeId) -> FocusScopeId {
        let scope = FocusScopeId(self.next_scope);
        self.next_scope += 1;
        tracing::debug!("pushing focus scope {:?} for {:?}", scope, root);
        self.managers.push(FocusManager::new(scope, root));
        scope
    }

    /// Remove the manager for `scope`, wherever it sits in the stack.
    ///
    /// Removing the active manager re-activates the one beneath it. The base
    /// manager cannot be removed.
    pub fn remove(&mut self, scope: FocusScopeId) -> Option<FocusManager> {
        if scope == FocusScopeId::ROOT {
            return None;
        }
        let index = self.managers.iter().position(|m| m.scope == scope)?;
        tracing::debug!("removing focus scope {:?}", scope);
        Some(self.managers.remove(index))
    }

    pub fn active(&self) -> Option<&FocusManager> {
        self.managers.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut FocusManager> {
        self.managers.last_mut()
    }

    pub fn get(&self, scope: FocusScopeId) -> Option<&FocusManager> {
        self.managers.iter().find(|m| m.scope == scope)
    }

    pub fn contains(&self, scope: FocusScopeId) -> bool {
        self.get(scope).is_some()
    }

    /// Number of managers, including the base one.
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}
