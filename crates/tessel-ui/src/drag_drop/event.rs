//! Drag-and-drop events and notifications.

use tessel_core::math::Vec2;

use super::data::DragData;
use crate::scene::NodeId;

/// Which step of the drag an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragDropEventKind {
    Start,
    Enter,
    Move,
    Exit,
    Drop,
    Complete,
}

/// Event handed to drop targets and drag sources.
#[derive(Debug)]
pub struct DragDropEvent<'a> {
    pub kind: DragDropEventKind,
    /// The node that started the drag.
    pub source: NodeId,
    pub data: &'a DragData,
    /// Touch position in the receiver's local space. Zero for source events.
    pub local: Vec2,
    /// Whether the drag ended in an accepted drop. Only set on `Complete`.
    pub dropped: bool,
    accepted: bool,
}

impl<'a> DragDropEvent<'a> {
    pub fn new(kind: DragDropEventKind, source: NodeId, data: &'a DragData, local: Vec2) -> Self {
        Self {
            kind,
            source,
            data,
            local,
            dropped: false,
            accepted: false,
        }
    }

    pub(crate) fn completed(source: NodeId, data: &'a DragData, dropped: bool) -> Self {
        Self {
            dropped,
            ..Self::new(DragDropEventKind::Complete, source, data, Vec2::ZERO)
        }
    }

    /// Accept the drop. Only honoured for `Enter` and `Move`.
    pub fn accept_drag(&mut self) {
        if matches!(self.kind, DragDropEventKind::Enter | DragDropEventKind::Move) {
            self.accepted = true;
        } else {
            tracing::warn!("accept_drag ignored on {:?} event", self.kind);
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

/// Queued record of every drag-and-drop notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragDropNotification {
    Started { source: NodeId },
    Entered { target: NodeId, local: Vec2 },
    Moved { target: NodeId, local: Vec2 },
    Exited { target: NodeId, local: Vec2 },
    Dropped { target: NodeId, local: Vec2 },
    Completed { source: NodeId, dropped: bool },
}

impl DragDropNotification {
    pub fn kind(&self) -> DragDropEventKind {
        match self {
            Self::Started { .. } => DragDropEventKind::Start,
            Self::Entered { .. } => DragDropEventKind::Enter,
            Self::Moved { .. } => DragDropEventKind::Move,
            Self::Exited { .. } => DragDropEventKind::Exit,
            Self::Dropped { .. } => DragDropEventKind::Drop,
            Self::Completed { .. } => DragDropEventKind::Complete,
        }
    }

    /// The drop target involved, if this is a target notification.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Self::Entered { target, .. }
            | Self::Moved { target, .. }
            | Self::Exited { target, .. }
            | Self::Dropped { target, .. } => Some(*target),
            Self::Started { .. } | Self::Completed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_only_on_enter_and_move() {
        let data = DragData::new();
        let mut enter = DragDropEvent::new(DragDropEventKind::Enter, NodeId(1), &data, Vec2::ZERO);
        enter.accept_drag();
        assert!(enter.is_accepted());

        let mut drop = DragDropEvent::new(DragDropEventKind::Drop, NodeId(1), &data, Vec2::ZERO);
        drop.accept_drag();
        assert!(!drop.is_accepted());
    }

    #[test]
    fn test_notification_target() {
        let entered = DragDropNotification::Entered {
            target: NodeId(4),
            local: Vec2::ONE,
        };
        assert_eq!(entered.target(), Some(NodeId(4)));
        assert_eq!(entered.kind(), DragDropEventKind::Enter);

        let started = DragDropNotification::Started { source: NodeId(2) };
        assert_eq!(started.target(), None);
    }
}
