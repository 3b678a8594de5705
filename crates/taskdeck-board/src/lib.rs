#![forbid(unsafe_code)]

//! Board state: tasks, column membership, and optimistic mutations.
//!
//! # Role in TaskDeck
//! `taskdeck-board` owns the single source of truth for rendering: the
//! [`ContainerIndex`] (which ids sit in which column, in what order) and the
//! canonical task collection, shared through a [`BoardHandle`].
//!
//! Drops are applied by the [`MutationCoordinator`], which stages the change
//! locally and then reconciles it with a [`TaskPersistence`] service, rolling
//! back on failure. Loading, creating, editing, and deleting tasks and
//! projects go through [`BoardService`].
//!
//! # How it fits in the system
//! `taskdeck-dnd` resolves pointer gestures into [`MutationIntent`] values and
//! hands them to the coordinator. Nothing here knows about geometry.

pub mod coordinator;
pub mod error;
pub mod index;
pub mod model;
pub mod persistence;
pub mod service;
pub mod state;
pub mod view;

pub use coordinator::{MutationCoordinator, MutationIntent, MutationOutcome, StagedMutation};
pub use error::{BoardError, IndexError, Operation, PersistenceError};
pub use index::{ContainerIndex, IndexSnapshot};
pub use model::{
    NewProject, NewTask, Project, ProjectPatch, ProjectStats, StatusParseError, Task, TaskId,
    TaskPatch, TaskStatus,
};
pub use persistence::{MemoryPersistence, PersistenceCall, ProjectPersistence, TaskPersistence};
pub use service::BoardService;
pub use state::{BoardHandle, BoardState};
pub use view::{BoardView, ColumnView, ProjectGroup, filter_board, group_by_project};
