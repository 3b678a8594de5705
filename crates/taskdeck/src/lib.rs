#![forbid(unsafe_code)]

//! TaskDeck public facade crate.
//!
//! Re-exports the common surface of the core, board, and drag-and-drop
//! crates, a unified [`Error`], and [`Deck`], which wires a board service and
//! a drag controller to the same board state.

use std::fmt;
use std::rc::Rc;

// --- Core re-exports -------------------------------------------------------

pub use taskdeck_core::config::{BoardConfig, ConfigError, DragConfig, LogConfig, LogFormat};
pub use taskdeck_core::event::{PointerEvent, PointerEventKind, PointerId};
pub use taskdeck_core::geometry::{Point, Rect};

// --- Board re-exports ------------------------------------------------------

pub use taskdeck_board::{
    BoardError, BoardHandle, BoardService, BoardState, BoardView, ColumnView, ContainerIndex,
    MemoryPersistence, MutationCoordinator, MutationIntent, MutationOutcome, NewProject, NewTask,
    PersistenceError, Project, ProjectGroup, ProjectPatch, ProjectPersistence, ProjectStats,
    StagedMutation, Task, TaskId, TaskPatch, TaskPersistence, TaskStatus,
};

// --- Drag-and-drop re-exports ----------------------------------------------

pub use taskdeck_dnd::{
    CollisionResolver, DragController, DragError, DragObserver, DragPhase, DropId, DropOutcome,
    DropRegions, DropSettler, DroppableRegion, FeedbackSink,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for TaskDeck hosts.
#[derive(Debug)]
pub enum Error {
    /// Configuration failed to load or validate.
    Config(ConfigError),
    /// A board operation failed.
    Board(BoardError),
    /// A drag ended without applying its change.
    Drag(DragError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Board(err) => write!(f, "{err}"),
            Self::Drag(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Board(err) => Some(err),
            Self::Drag(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<BoardError> for Error {
    fn from(err: BoardError) -> Self {
        Self::Board(err)
    }
}

impl From<DragError> for Error {
    fn from(err: DragError) -> Self {
        Self::Drag(err)
    }
}

/// Standard result type for TaskDeck APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Deck -----------------------------------------------------------------

/// A board service and drag controller sharing one board.
pub struct Deck<P> {
    service: BoardService<P>,
    controller: DragController<P>,
}

impl<P: TaskPersistence> Deck<P> {
    /// Build a deck over `persistence` with the drag settings from `config`.
    ///
    /// The board starts empty; call [`BoardService::load`] through
    /// [`Deck::service`] to fill it.
    pub fn new(config: &BoardConfig, persistence: P) -> Result<Self> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Validation(problems).into());
        }
        let service = BoardService::new(persistence);
        let controller = DragController::new(config.drag.clone(), service.coordinator());
        Ok(Self {
            service,
            controller,
        })
    }

    /// Route drag feedback to `sink`.
    #[must_use]
    pub fn with_feedback(mut self, sink: Rc<dyn FeedbackSink>) -> Self {
        self.controller = self.controller.with_feedback(sink);
        self
    }

    /// Route lifecycle notifications to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Rc<dyn DragObserver>) -> Self {
        self.controller = self.controller.with_observer(observer);
        self
    }

    /// Shared board state.
    #[must_use]
    pub fn board(&self) -> &BoardHandle {
        self.service.board()
    }

    /// Board CRUD flows.
    #[must_use]
    pub fn service(&self) -> &BoardService<P> {
        &self.service
    }

    /// Drag controller.
    #[must_use]
    pub fn controller(&self) -> &DragController<P> {
        &self.controller
    }

    /// Drag controller, mutably, for feeding pointer events and regions.
    pub fn controller_mut(&mut self) -> &mut DragController<P> {
        &mut self.controller
    }
}

impl<P> fmt::Debug for Deck<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deck")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BoardConfig, BoardHandle, BoardService, Deck, DragController, DropOutcome, DropRegions,
        DroppableRegion, Error, MutationOutcome, PointerEvent, Rect, Result, Task, TaskId,
        TaskPersistence, TaskStatus,
    };

    pub use crate::{board, core, dnd};
}

pub use taskdeck_board as board;
pub use taskdeck_core as core;
pub use taskdeck_dnd as dnd;
