//! Drag-and-drop coordination.
//!
//! A [`DragDropManager`] runs at most one drag session at a time. A session
//! starts with [`DragDropManager::start_drag`], claims the touch that started
//! it, and follows that touch through [`DragDropManager::handle_touch`]:
//!
//! ```text
//! Idle --start_drag--> Dragging --touch ended / cancel / escape--> Idle
//! ```
//!
//! While dragging, the drop target under the touch is re-resolved on every
//! move by hit-testing the stage and walking up to the nearest ancestor that
//! exposes [`DropTarget`](crate::scene::DropTarget). Targets always see
//! balanced `enter`/`exit` pairs, and `move` only while hovered.
//!
//! An optional avatar follows the touch as a non-modal pop-up. It is made
//! untouchable for the duration of the drag so it never hides the targets
//! underneath.

mod data;
mod event;

pub use data::DragData;
pub use event::{DragDropEvent, DragDropEventKind, DragDropNotification};

use tessel_core::math::Vec2;
use tessel_core::profiling::profile_function;

use crate::input::{Key, Touch, TouchEvent, TouchId, TouchPhase};
use crate::popup::{PopUpError, PopUpManager};
use crate::scene::{NodeId, SceneError, SceneGraph};

/// Errors raised by drag-and-drop operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragDropError {
    #[error("no drag in progress")]
    NotDragging,
    #[error("drag source {0:?} not found")]
    SourceNotFound(NodeId),
    #[error("{target:?} is not the current drop target (current: {current:?})")]
    NotCurrentDropTarget {
        target: NodeId,
        current: Option<NodeId>,
    },
    #[error(transparent)]
    PopUp(#[from] PopUpError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Result type for drag-and-drop operations.
pub type DragDropResult<T> = Result<T, DragDropError>;

#[derive(Debug)]
struct AvatarState {
    node: NodeId,
    was_touchable: bool,
    offset: Vec2,
}

#[derive(Debug)]
struct DragSession {
    source: NodeId,
    data: DragData,
    /// Released when the claimed touch ends.
    touch_id: Option<TouchId>,
    drop_target: Option<NodeId>,
    /// Last known position in the drop target's local space.
    target_local: Vec2,
    accepted: bool,
    avatar: Option<AvatarState>,
}

/// Owns the single active drag session.
#[derive(Debug, Default)]
pub struct DragDropManager {
    session: Option<DragSession>,
    events: Vec<DragDropNotification>,
}

impl DragDropManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// The node that started the current drag.
    pub fn drag_source(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.source)
    }

    pub fn drag_data(&self) -> Option<&DragData> {
        self.session.as_ref().map(|s| &s.data)
    }

    /// The drop target currently under the touch.
    pub fn drop_target(&self) -> Option<NodeId> {
        self.session.as_ref().and_then(|s| s.drop_target)
    }

    /// Whether the current drop target accepted the drag.
    pub fn is_drop_accepted(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.accepted)
    }

    /// The touch claimed by the current drag.
    pub fn touch_id(&self) -> Option<TouchId> {
        self.session.as_ref().and_then(|s| s.touch_id)
    }

    pub fn avatar(&self) -> Option<NodeId> {
        self.session
            .as_ref()
            .and_then(|s| s.avatar.as_ref().map(|a| a.node))
    }

    /// Pop all pending notifications.
    pub fn pop_events(&mut self) -> Vec<DragDropNotification> {
        std::mem::take(&mut self.events)
    }

    /// Start dragging `data` from `source` under `touch`.
    ///
    /// A drag already in progress is cancelled first. When `avatar` is given
    /// it is placed at the touch position plus `offset` and added to
    /// `pop_ups` as a non-modal, non-centered pop-up.
    #[allow(clippy::too_many_arguments)]
    pub fn start_drag(
        &mut self,
        scene: &mut SceneGraph,
        pop_ups: &mut PopUpManager,
        source: NodeId,
        touch: Touch,
        data: DragData,
        avatar: Option<NodeId>,
        offset: Vec2,
    ) -> DragDropResult<()> {
        profile_function!();
        if !scene.contains(source) {
            return Err(DragDropError::SourceNotFound(source));
        }
        if let Some(avatar) = avatar {
            if !scene.contains(avatar) {
                return Err(SceneError::NodeNotFound(avatar).into());
            }
            // The current avatar stops being a pop-up once the drag is cancelled.
            if pop_ups.is_pop_up(avatar) && self.avatar() != Some(avatar) {
                return Err(PopUpError::AlreadyPopUp(avatar).into());
            }
        }

        if self.is_dragging() {
            tracing::debug!("start_drag while dragging, cancelling previous drag");
            self.cancel_drag(scene, pop_ups)?;
        }

        let avatar = match avatar {
            Some(node) => Some(Self::attach_avatar(
                scene,
                pop_ups,
                node,
                touch.position,
                offset,
            )?),
            None => None,
        };

        tracing::debug!(
            "drag started from {:?} ({}) with touch {:?}",
            source,
            scene.debug_name(source),
            touch.id
        );
        self.session = Some(DragSession {
            source,
            data,
            touch_id: Some(touch.id),
            drop_target: None,
            target_local: Vec2::ZERO,
            accepted: false,
            avatar,
        });

        if let Some(session) = &self.session {
            self.events.push(DragDropNotification::Started { source });
            let event =
                DragDropEvent::new(DragDropEventKind::Start, source, &session.data, Vec2::ZERO);
            if let Some(drag_source) = scene
                .object_mut(source)
                .and_then(|o| o.as_drag_source_mut())
            {
                drag_source.on_drag_start(&event);
            }
        }

        self.update_drop_target(scene, touch.position)
    }

    /// Feed a touch event. Returns whether the drag consumed it.
    ///
    /// Only events for the claimed touch are considered.
    pub fn handle_touch(
        &mut self,
        scene: &mut SceneGraph,
        pop_ups: &mut PopUpManager,
        event: &TouchEvent,
    ) -> DragDropResult<bool> {
        profile_function!();
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        if session.touch_id != Some(event.id) {
            return Ok(false);
        }

        match event.phase {
            TouchPhase::Began => Ok(false),
            TouchPhase::Moved => {
                if let Some(avatar) = &session.avatar
                    && scene.contains(avatar.node)
                {
                    let local = scene.global_to_local(pop_ups.root(), event.position)?;
                    let position = local + avatar.offset;
                    scene.set_position(avatar.node, position.x, position.y)?;
                }
                self.update_drop_target(scene, event.position)?;
                Ok(true)
            }
            TouchPhase::Ended => {
                session.touch_id = None;
                let mut dropped = false;
                if session.accepted
                    && let Some(target) = session.drop_target.take()
                {
                    let local = match scene.global_to_local(target, event.position) {
                        Ok(local) => local,
                        Err(_) => session.target_local,
                    };
                    tracing::debug!("dropped on {:?} ({})", target, scene.debug_name(target));
                    self.events
                        .push(DragDropNotification::Dropped { target, local });
                    dispatch_to_target(scene, target, DragDropEventKind::Drop, session, local);
                    session.accepted = false;
                    dropped = true;
                }
                self.complete_drag(scene, pop_ups, dropped)?;
                Ok(true)
            }
        }
    }

    /// Feed a key press. Escape and Back cancel the drag.
    pub fn handle_key(
        &mut self,
        scene: &mut SceneGraph,
        pop_ups: &mut PopUpManager,
        key: Key,
    ) -> DragDropResult<bool> {
        if !self.is_dragging() || !key.is_cancel() {
            return Ok(false);
        }
        tracing::debug!("drag cancelled by {:?}", key);
        self.cancel_drag(scene, pop_ups)?;
        Ok(true)
    }

    /// Accept the drag on behalf of `target`.
    ///
    /// Only the current drop target may accept; anything else is an error
    /// and leaves the accepted flag untouched.
    pub fn accept_drag(&mut self, target: NodeId) -> DragDropResult<()> {
        let session = self.session.as_mut().ok_or(DragDropError::NotDragging)?;
        if session.drop_target != Some(target) {
            tracing::warn!(
                "{:?} tried to accept a drag while {:?} is the drop target",
                target,
                session.drop_target
            );
            return Err(DragDropError::NotCurrentDropTarget {
                target,
                current: session.drop_target,
            });
        }
        session.accepted = true;
        Ok(())
    }

    /// Cancel the drag, if any. The source sees `dropped == false`.
    pub fn cancel_drag(
        &mut self,
        scene: &mut SceneGraph,
        pop_ups: &mut PopUpManager,
    ) -> DragDropResult<()> {
        if !self.is_dragging() {
            return Ok(());
        }
        self.complete_drag(scene, pop_ups, false)
    }

    fn attach_avatar(
        scene: &mut SceneGraph,
        pop_ups: &mut PopUpManager,
        node: NodeId,
        touch: Vec2,
        offset: Vec2,
    ) -> DragDropResult<AvatarState> {
        let was_touchable = scene.is_touchable(node);
        let position = scene.global_to_local(pop_ups.root(), touch)? + offset;
        scene.set_touchable(node, false)?;
        scene.set_position(node, position.x, position.y)?;
        if let Err(err) = pop_ups.add_pop_up(scene, node, false, false, None) {
            scene.set_touchable(node, was_touchable)?;
            return Err(err.into());
        }
        Ok(AvatarState {
            node,
            was_touchable,
            offset,
        })
    }

    /// Re-resolve the drop target under `point`, dispatching exit, enter or
    /// move as needed.
    fn update_drop_target(&mut self, scene: &mut SceneGraph, point: Vec2) -> DragDropResult<()> {
        profile_function!();
        let candidate = find_drop_target(scene, point);
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        if candidate != session.drop_target {
            if let Some(old) = session.drop_target.take() {
                exit_target(scene, session, old, &mut self.events);
            }
            session.accepted = false;
            if let Some(target) = candidate {
                let local = scene.global_to_local(target, point)?;
                session.drop_target = Some(target);
                session.target_local = local;
                tracing::trace!("drag entered {:?} ({})", target, scene.debug_name(target));
                self.events
                    .push(DragDropNotification::Entered { target, local });
                if dispatch_to_target(scene, target, DragDropEventKind::Enter, session, local) {
                    session.accepted = true;
                }
            }
        } else if let Some(target) = candidate {
            let local = scene.global_to_local(target, point)?;
            session.target_local = local;
            self.events
                .push(DragDropNotification::Moved { target, local });
            if dispatch_to_target(scene, target, DragDropEventKind::Move, session, local) {
                session.accepted = true;
            }
        }
        Ok(())
    }

    /// End the session: exit the current target, tear down, then tell the
    /// source how it went.
    fn complete_drag(
        &mut self,
        scene: &mut SceneGraph,
        pop_ups: &mut PopUpManager,
        dropped: bool,
    ) -> DragDropResult<()> {
        let mut session = self.session.take().ok_or(DragDropError::NotDragging)?;
        if let Some(target) = session.drop_target.take() {
            exit_target(scene, &session, target, &mut self.events);
        }

        // Cleanup always runs to the end.
        if let Some(avatar) = session.avatar.take() {
            if pop_ups.is_pop_up(avatar.node)
                && let Err(err) = pop_ups.remove_pop_up(scene, avatar.node, false)
            {
                tracing::warn!("failed to remove drag avatar {:?}: {}", avatar.node, err);
            }
            if scene.contains(avatar.node)
                && let Err(err) = scene.set_touchable(avatar.node, avatar.was_touchable)
            {
                tracing::warn!("failed to restore avatar {:?}: {}", avatar.node, err);
            }
        }

        let DragSession { source, data, .. } = session;
        tracing::debug!("drag from {:?} completed, dropped={}", source, dropped);
        self.events
            .push(DragDropNotification::Completed { source, dropped });
        let event = DragDropEvent::completed(source, &data, dropped);
        if let Some(drag_source) = scene
            .object_mut(source)
            .and_then(|o| o.as_drag_source_mut())
        {
            drag_source.on_drag_complete(&event);
        }
        Ok(())
    }
}

/// Deepest drop target under `point`: the hit leaf or its nearest ancestor
/// exposing the capability.
fn find_drop_target(scene: &SceneGraph, point: Vec2) -> Option<NodeId> {
    let mut current = scene.hit_test(point);
    while let Some(node) = current {
        if scene
            .object(node)
            .is_some_and(|o| o.as_drop_target().is_some())
        {
            return Some(node);
        }
        current = scene.parent(node);
    }
    None
}

fn exit_target(
    scene: &mut SceneGraph,
    session: &DragSession,
    target: NodeId,
    events: &mut Vec<DragDropNotification>,
) {
    let local = session.target_local;
    tracing::trace!("drag exited {:?}", target);
    events.push(DragDropNotification::Exited { target, local });
    dispatch_to_target(scene, target, DragDropEventKind::Exit, session, local);
}

/// Deliver one event to `target`. Returns whether it accepted the drag.
fn dispatch_to_target(
    scene: &mut SceneGraph,
    target: NodeId,
    kind: DragDropEventKind,
    session: &DragSession,
    local: Vec2,
) -> bool {
    let Some(drop_target) = scene
        .object_mut(target)
        .and_then(|o| o.as_drop_target_mut())
    else {
        return false;
    };
    let mut event = DragDropEvent::new(kind, session.source, &session.data, local);
    match kind {
        DragDropEventKind::Enter => drop_target.on_drag_enter(&mut event),
        DragDropEventKind::Move => drop_target.on_drag_move(&mut event),
        DragDropEventKind::Exit => drop_target.on_drag_exit(&event),
        DragDropEventKind::Drop => drop_target.on_drag_drop(&event),
        DragDropEventKind::Start | DragDropEventKind::Complete => {}
    }
    event.is_accepted()
}
