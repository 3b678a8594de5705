#![forbid(unsafe_code)]

//! Feedback sink and lifecycle observer.
//!
//! Both are injected into the drag controller and called synchronously at
//! lifecycle transitions. Neither can influence control flow: methods return
//! nothing and every method has an empty default.

use std::cell::RefCell;
use std::fmt;

use taskdeck_board::{BoardError, TaskStatus};

use crate::region::DropId;

/// Why a drag ended without applying a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    /// Nothing was under the dragged card at release.
    ResolutionFailure,
    /// The board refused the move (stale or unknown item).
    Rejected(BoardError),
    /// The status change could not be persisted and was rolled back.
    Persistence(BoardError),
}

impl fmt::Display for DragError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolutionFailure => f.write_str("no drop target under the pointer"),
            Self::Rejected(e) => write!(f, "drop rejected: {e}"),
            Self::Persistence(e) => write!(f, "drop rolled back: {e}"),
        }
    }
}

impl std::error::Error for DragError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ResolutionFailure => None,
            Self::Rejected(e) | Self::Persistence(e) => Some(e),
        }
    }
}

/// Fire-and-forget user feedback (haptics, sounds, flashes).
pub trait FeedbackSink {
    /// A drag became active.
    fn on_start(&self) {}
    /// The dragged card moved over a different column.
    fn on_hover_change(&self) {}
    /// A move was applied.
    fn on_success(&self) {}
    /// The card was dropped where it already was.
    fn on_noop(&self) {}
    /// The drop failed or was rolled back.
    fn on_error(&self) {}
}

/// Lifecycle notifications for the host.
pub trait DragObserver {
    fn on_drag_start(&self, _active: &DropId) {}
    fn on_drag_hover_container_change(&self, _container: TaskStatus) {}
    fn on_drag_end(&self, _mutation_applied: bool, _error: Option<&DragError>) {}
    fn on_drag_cancel(&self) {}
    /// A staged drop finished reconciling with persistence.
    fn on_drop_settled(&self, _mutation_applied: bool, _error: Option<&DragError>) {}
}

/// Feedback sink that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl FeedbackSink for NoFeedback {}

/// Observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl DragObserver for NoObserver {}

/// Kinds of feedback, as recorded by [`RecordingFeedback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Start,
    HoverChange,
    Success,
    Noop,
    Error,
}

/// Feedback sink that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    log: RefCell<Vec<FeedbackKind>>,
}

impl RecordingFeedback {
    /// Recorded calls so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<FeedbackKind> {
        self.log.borrow().clone()
    }

    fn push(&self, kind: FeedbackKind) {
        self.log.borrow_mut().push(kind);
    }
}

impl FeedbackSink for RecordingFeedback {
    fn on_start(&self) {
        self.push(FeedbackKind::Start);
    }
    fn on_hover_change(&self) {
        self.push(FeedbackKind::HoverChange);
    }
    fn on_success(&self) {
        self.push(FeedbackKind::Success);
    }
    fn on_noop(&self) {
        self.push(FeedbackKind::Noop);
    }
    fn on_error(&self) {
        self.push(FeedbackKind::Error);
    }
}

/// A lifecycle notification, as recorded by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragNotification {
    Start(DropId),
    HoverContainer(TaskStatus),
    End {
        applied: bool,
        error: Option<DragError>,
    },
    Cancel,
    Settled {
        applied: bool,
        error: Option<DragError>,
    },
}

/// Observer that records every notification in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    log: RefCell<Vec<DragNotification>>,
}

impl RecordingObserver {
    /// Recorded notifications so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<DragNotification> {
        self.log.borrow().clone()
    }
}

impl DragObserver for RecordingObserver {
    fn on_drag_start(&self, active: &DropId) {
        self.log
            .borrow_mut()
            .push(DragNotification::Start(active.clone()));
    }

    fn on_drag_hover_container_change(&self, container: TaskStatus) {
        self.log
            .borrow_mut()
            .push(DragNotification::HoverContainer(container));
    }

    fn on_drag_end(&self, mutation_applied: bool, error: Option<&DragError>) {
        self.log.borrow_mut().push(DragNotification::End {
            applied: mutation_applied,
            error: error.cloned(),
        });
    }

    fn on_drag_cancel(&self) {
        self.log.borrow_mut().push(DragNotification::Cancel);
    }

    fn on_drop_settled(&self, mutation_applied: bool, error: Option<&DragError>) {
        self.log.borrow_mut().push(DragNotification::Settled {
            applied: mutation_applied,
            error: error.cloned(),
        });
    }
}
