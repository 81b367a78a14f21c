//! Retained scene graph with synchronous change notifications.
//!
//! The graph owns every display object, keyed by a stable [`NodeId`]. Frames
//! are stored relative to the parent. Listeners registered with
//! [`SceneGraph::on_removed`], [`SceneGraph::on_resized`] and
//! [`SceneGraph::on_stage_resized`] run on the same call stack as the change
//! that triggered them and receive the graph itself, so bookkeeping built on
//! top of them is consistent as soon as the mutating call returns.
//!
//! # Example
//!
//! ```
//! use tessel_core::geometry::Size;
//! use tessel_core::math::{Vec2, Vec4};
//! use tessel_ui::scene::{Container, Quad, SceneGraph};
//!
//! let mut scene = SceneGraph::new(Size::new(800.0, 600.0));
//! let panel = scene.create(Container::new());
//! let quad = scene.create(Quad::new(Vec4::ONE));
//! scene.add_child(scene.root(), panel).unwrap();
//! scene.add_child(panel, quad).unwrap();
//! scene.set_position(panel, 100.0, 50.0).unwrap();
//! scene.set_size(quad, 20.0, 20.0).unwrap();
//!
//! assert_eq!(scene.hit_test(Vec2::new(110.0, 60.0)), Some(quad));
//! ```

pub mod capability;
pub mod objects;

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tessel_core::alloc::HashSet;
use tessel_core::geometry::{Rect, Size};
use tessel_core::math::Vec2;
use tessel_core::profiling::profile_function;

pub use capability::{DisplayObject, DragSource, DropTarget, Validatable};
pub use objects::{Container, Quad};

/// Node identifier in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Handle for a registered listener, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Errors raised by scene graph mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("node {0:?} cannot hold children")]
    NotAContainer(NodeId),
    #[error("cannot add {child:?} under its own descendant {parent:?}")]
    CyclicHierarchy { parent: NodeId, child: NodeId },
    #[error("the stage root cannot be detached or disposed")]
    RootNode,
}

/// Result type for scene graph operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Callback fired for a single node.
pub type NodeCallback = Rc<dyn Fn(&mut SceneGraph, NodeId)>;

/// Callback fired when the stage changes size.
pub type StageCallback = Rc<dyn Fn(&mut SceneGraph, Size<f32>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeEvent {
    Removed,
    Resized,
}

struct NodeListener {
    node: NodeId,
    event: NodeEvent,
    callback: NodeCallback,
}

struct SceneNode {
    object: Box<dyn DisplayObject>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    frame: Rect<f32>,
    touchable: bool,
    visible: bool,
}

impl SceneNode {
    fn new(object: Box<dyn DisplayObject>) -> Self {
        Self {
            object,
            parent: None,
            children: Vec::new(),
            frame: Rect::default(),
            touchable: true,
            visible: true,
        }
    }
}

/// The stage: a tree of display objects rooted at a container sized to the
/// stage.
pub struct SceneGraph {
    nodes: IndexMap<NodeId, SceneNode>,
    root: NodeId,
    stage_size: Size<f32>,
    next_id: usize,
    next_listener: u64,
    node_listeners: IndexMap<ListenerId, NodeListener>,
    stage_listeners: IndexMap<ListenerId, StageCallback>,
}

impl SceneGraph {
    /// Create a stage of the given size with an empty root container.
    pub fn new(stage_size: Size<f32>) -> Self {
        let root = NodeId(0);
        let mut root_node = SceneNode::new(Box::new(Container::named("stage")));
        root_node.frame = Rect::new(0.0, 0.0, stage_size.width, stage_size.height);

        let mut nodes = IndexMap::new();
        nodes.insert(root, root_node);

        Self {
            nodes,
            root,
            stage_size,
            next_id: 1,
            next_listener: 0,
            node_listeners: IndexMap::new(),
            stage_listeners: IndexMap::new(),
        }
    }

    /// The stage root container.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn stage_size(&self) -> Size<f32> {
        self.stage_size
    }

    /// Number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Add a detached object to the graph and return its id.
    pub fn create(&mut self, object: impl DisplayObject + 'static) -> NodeId {
        self.create_boxed(Box::new(object))
    }

    pub fn create_boxed(&mut self, object: Box<dyn DisplayObject>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        tracing::trace!("created {:?} ({})", id, object.debug_name());
        self.nodes.insert(id, SceneNode::new(object));
        id
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn object(&self, node: NodeId) -> Option<&dyn DisplayObject> {
        self.nodes.get(&node).map(|n| &*n.object)
    }

    pub fn object_mut(&mut self, node: NodeId) -> Option<&mut dyn DisplayObject> {
        match self.nodes.get_mut(&node) {
            Some(scene_node) => Some(scene_node.object.as_mut()),
            None => None,
        }
    }

    pub fn is_container(&self, node: NodeId) -> bool {
        self.object(node).is_some_and(|o| o.is_container())
    }

    pub fn debug_name(&self, node: NodeId) -> &str {
        self.object(node).map_or("<missing>", |o| o.debug_name())
    }

    // Hierarchy

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(&node).map_or(&[], |n| n.children.as_slice())
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is attached, directly or indirectly, to the root.
    pub fn is_on_stage(&self, node: NodeId) -> bool {
        node == self.root || self.is_ancestor(self.root, node)
    }

    /// Descendants of `node` in pre-order (tree order), excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        result
    }

    /// Append `child` on top of `parent`'s children.
    ///
    /// A child that already has a different parent is detached first, which
    /// fires its removal listeners.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.add_child_at(parent, child, usize::MAX)
    }

    /// Insert `child` at `index` (clamped) among `parent`'s children.
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> SceneResult<()> {
        let parent_node = self
            .nodes
            .get(&parent)
            .ok_or(SceneError::NodeNotFound(parent))?;
        if !parent_node.object.is_container() {
            return Err(SceneError::NotAContainer(parent));
        }
        if !self.contains(child) {
            return Err(SceneError::NodeNotFound(child));
        }
        if child == self.root {
            return Err(SceneError::RootNode);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(SceneError::CyclicHierarchy { parent, child });
        }

        match self.parent(child) {
            Some(current) if current == parent => {
                // Reordering within the same parent is not a removal.
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.retain(|c| *c != child);
                    let index = index.min(node.children.len());
                    node.children.insert(index, child);
                }
                return Ok(());
            }
            Some(_) => {
                self.remove_from_parent(child)?;
            }
            None => {}
        }

        if let Some(node) = self.nodes.get_mut(&parent) {
            let index = index.min(node.children.len());
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach `node` from its parent.
    ///
    /// Returns `false` if the node had no parent. Removal listeners fire
    /// before this returns.
    pub fn remove_from_parent(&mut self, node: NodeId) -> SceneResult<bool> {
        if node == self.root {
            return Err(SceneError::RootNode);
        }
        let scene_node = self
            .nodes
            .get_mut(&node)
            .ok_or(SceneError::NodeNotFound(node))?;
        let Some(parent) = scene_node.parent.take() else {
            return Ok(false);
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|c| *c != node);
        }

        self.notify(node, NodeEvent::Removed);
        Ok(true)
    }

    /// Detach `node` and drop it together with its whole subtree.
    ///
    /// Every node in the subtree sees its removal listeners fire before it is
    /// dropped, outermost first.
    pub fn dispose(&mut self, node: NodeId) -> SceneResult<()> {
        self.remove_from_parent(node)?;
        if !self.contains(node) {
            // A removal listener already disposed it.
            return Ok(());
        }

        for descendant in self.descendants(node) {
            if self.contains(descendant) && self.is_ancestor(node, descendant) {
                self.notify(descendant, NodeEvent::Removed);
            }
        }
        if !self.contains(node) {
            return Ok(());
        }

        let mut doomed: HashSet<NodeId> = self.descendants(node).into_iter().collect();
        doomed.insert(node);
        for id in &doomed {
            self.nodes.shift_remove(id);
        }
        self.node_listeners.retain(|_, l| !doomed.contains(&l.node));
        tracing::trace!("disposed {:?} ({} nodes)", node, doomed.len());
        Ok(())
    }

    // Geometry

    pub fn frame(&self, node: NodeId) -> SceneResult<Rect<f32>> {
        self.nodes
            .get(&node)
            .map(|n| n.frame)
            .ok_or(SceneError::NodeNotFound(node))
    }

    pub fn position(&self, node: NodeId) -> SceneResult<Vec2> {
        self.frame(node).map(|f| f.position())
    }

    pub fn size(&self, node: NodeId) -> SceneResult<Size<f32>> {
        self.frame(node).map(|f| f.size())
    }

    pub fn set_position(&mut self, node: NodeId, x: f32, y: f32) -> SceneResult<()> {
        let scene_node = self
            .nodes
            .get_mut(&node)
            .ok_or(SceneError::NodeNotFound(node))?;
        scene_node.frame.x = x;
        scene_node.frame.y = y;
        Ok(())
    }

    /// Set the node's size, firing resize listeners when it changed.
    pub fn set_size(&mut self, node: NodeId, width: f32, height: f32) -> SceneResult<()> {
        let scene_node = self
            .nodes
            .get_mut(&node)
            .ok_or(SceneError::NodeNotFound(node))?;
        let changed = scene_node.frame.width != width || scene_node.frame.height != height;
        scene_node.frame.width = width;
        scene_node.frame.height = height;
        if changed {
            self.notify(node, NodeEvent::Resized);
        }
        Ok(())
    }

    pub fn set_frame(&mut self, node: NodeId, frame: Rect<f32>) -> SceneResult<()> {
        self.set_position(node, frame.x, frame.y)?;
        self.set_size(node, frame.width, frame.height)
    }

    pub fn is_touchable(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.touchable)
    }

    pub fn set_touchable(&mut self, node: NodeId, touchable: bool) -> SceneResult<()> {
        let scene_node = self
            .nodes
            .get_mut(&node)
            .ok_or(SceneError::NodeNotFound(node))?;
        scene_node.touchable = touchable;
        Ok(())
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.visible)
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) -> SceneResult<()> {
        let scene_node = self
            .nodes
            .get_mut(&node)
            .ok_or(SceneError::NodeNotFound(node))?;
        scene_node.visible = visible;
        Ok(())
    }

    /// Force the node to resolve deferred measurement if it supports it.
    ///
    /// Returns whether the node exposes [`Validatable`].
    pub fn validate(&mut self, node: NodeId) -> SceneResult<bool> {
        let scene_node = self
            .nodes
            .get_mut(&node)
            .ok_or(SceneError::NodeNotFound(node))?;
        let mut frame = scene_node.frame;
        let Some(validating) = scene_node.object.as_validatable_mut() else {
            return Ok(false);
        };
        validating.validate(&mut frame);

        let resized =
            scene_node.frame.width != frame.width || scene_node.frame.height != frame.height;
        scene_node.frame = frame;
        if resized {
            self.notify(node, NodeEvent::Resized);
        }
        Ok(true)
    }

    /// Convert a point in `node`'s local space to stage coordinates.
    pub fn local_to_global(&self, node: NodeId, point: Vec2) -> SceneResult<Vec2> {
        let mut result = point;
        let mut current = Some(node);
        while let Some(id) = current {
            let scene_node = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?;
            result += scene_node.frame.position();
            current = scene_node.parent;
        }
        Ok(result)
    }

    /// Convert a stage point into `node`'s local space.
    pub fn global_to_local(&self, node: NodeId, point: Vec2) -> SceneResult<Vec2> {
        Ok(point - self.local_to_global(node, Vec2::ZERO)?)
    }

    /// Find the deepest touchable leaf under a stage point.
    ///
    /// Children are tested topmost first. Containers are hit only through
    /// their children; an untouchable or invisible node hides its subtree.
    pub fn hit_test(&self, point: Vec2) -> Option<NodeId> {
        profile_function!();
        let root_frame = self.nodes.get(&self.root)?.frame;
        self.hit_test_node(self.root, point - root_frame.position())
    }

    fn hit_test_node(&self, node: NodeId, local: Vec2) -> Option<NodeId> {
        let scene_node = self.nodes.get(&node)?;
        if !scene_node.touchable || !scene_node.visible {
            return None;
        }
        if scene_node.object.is_container() {
            return scene_node.children.iter().rev().find_map(|child| {
                let child_frame = self.nodes.get(child)?.frame;
                self.hit_test_node(*child, local - child_frame.position())
            });
        }
        let bounds = Rect::new(0.0, 0.0, scene_node.frame.width, scene_node.frame.height);
        bounds.contains(local).then_some(node)
    }

    // Notifications

    /// Listen for `node` being detached from its parent.
    pub fn on_removed(
        &mut self,
        node: NodeId,
        callback: impl Fn(&mut SceneGraph, NodeId) + 'static,
    ) -> ListenerId {
        self.add_node_listener(node, NodeEvent::Removed, Rc::new(callback))
    }

    /// Listen for `node`'s size changing.
    pub fn on_resized(
        &mut self,
        node: NodeId,
        callback: impl Fn(&mut SceneGraph, NodeId) + 'static,
    ) -> ListenerId {
        self.add_node_listener(node, NodeEvent::Resized, Rc::new(callback))
    }

    /// Listen for the stage changing size.
    pub fn on_stage_resized(
        &mut self,
        callback: impl Fn(&mut SceneGraph, Size<f32>) + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.stage_listeners.insert(id, Rc::new(callback));
        id
    }

    /// Unsubscribe a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.node_listeners.shift_remove(&id).is_some()
            || self.stage_listeners.shift_remove(&id).is_some()
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.node_listeners.contains_key(&id) || self.stage_listeners.contains_key(&id)
    }

    /// Resize the stage and its root, then notify stage listeners.
    pub fn resize_stage(&mut self, width: f32, height: f32) {
        let size = Size::new(width, height);
        if size == self.stage_size {
            return;
        }
        tracing::debug!("stage resized to {}x{}", width, height);
        self.stage_size = size;
        if let Some(root) = self.nodes.get_mut(&self.root) {
            root.frame.width = width;
            root.frame.height = height;
        }

        let callbacks: Vec<(ListenerId, StageCallback)> = self
            .stage_listeners
            .iter()
            .map(|(id, cb)| (*id, cb.clone()))
            .collect();
        for (id, callback) in callbacks {
            if self.stage_listeners.contains_key(&id) {
                callback(self, size);
            }
        }
    }

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    fn add_node_listener(
        &mut self,
        node: NodeId,
        event: NodeEvent,
        callback: NodeCallback,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.node_listeners.insert(
            id,
            NodeListener {
                node,
                event,
                callback,
            },
        );
        id
    }

    fn notify(&mut self, node: NodeId, event: NodeEvent) {
        let callbacks: Vec<(ListenerId, NodeCallback)> = self
            .node_listeners
            .iter()
            .filter(|(_, l)| l.node == node && l.event == event)
            .map(|(id, l)| (*id, l.callback.clone()))
            .collect();
        for (id, callback) in callbacks {
            // An earlier callback may have unsubscribed this one.
            if self.node_listeners.contains_key(&id) {
                callback(self, node);
            }
        }
    }
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("root", &self.root)
            .field("stage_size", &self.stage_size)
            .field("nodes", &self.nodes.len())
            .field("listeners", &(self.node_listeners.len() + self.stage_listeners.len()))
            .finish()
    }
}
