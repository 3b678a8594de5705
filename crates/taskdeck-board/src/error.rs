#![forbid(unsafe_code)]

//! Error types for the board layer.

use std::fmt;

use crate::model::{TaskId, TaskStatus};

/// Failures of the container membership index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The item is not present in any container.
    UnknownItem(TaskId),
    /// The item exists but not in the container the caller named.
    NotInContainer { item: TaskId, container: TaskStatus },
    /// The item is already present (in `container`).
    DuplicateItem { item: TaskId, container: TaskStatus },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownItem(item) => write!(f, "item {item} is not on the board"),
            Self::NotInContainer { item, container } => {
                write!(f, "item {item} is not in container {container}")
            }
            Self::DuplicateItem { item, container } => {
                write!(f, "item {item} is already in container {container}")
            }
        }
    }
}

impl std::error::Error for IndexError {}

/// Failures reported by a persistence service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The task does not exist remotely.
    NotFound(TaskId),
    /// The project does not exist remotely.
    ProjectNotFound(String),
    /// The request was malformed (missing title, bad field).
    Invalid(String),
    /// The service refused the change.
    Rejected(String),
    /// The service could not be reached.
    Unavailable(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "task {id} not found"),
            Self::ProjectNotFound(id) => write!(f, "project {id} not found"),
            Self::Invalid(msg) => write!(f, "invalid request: {msg}"),
            Self::Rejected(msg) => write!(f, "rejected: {msg}"),
            Self::Unavailable(msg) => write!(f, "service unavailable: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Remote operation that produced a [`BoardError::Persistence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListTasks,
    CreateTask,
    UpdateTask,
    UpdateTaskStatus,
    DeleteTask,
    ListProjects,
    CreateProject,
    UpdateProject,
    DeleteProject,
}

impl Operation {
    /// Short human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListTasks => "load tasks",
            Self::CreateTask => "create task",
            Self::UpdateTask => "update task",
            Self::UpdateTaskStatus => "move task",
            Self::DeleteTask => "delete task",
            Self::ListProjects => "load projects",
            Self::CreateProject => "create project",
            Self::UpdateProject => "update project",
            Self::DeleteProject => "delete project",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by board operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Membership index rejected the change.
    Index(IndexError),
    /// A remote call failed; the local change (if any) was reverted.
    Persistence {
        operation: Operation,
        source: PersistenceError,
    },
    /// No task with this id is on the board.
    UnknownTask(TaskId),
    /// Task fields failed validation before any remote call.
    InvalidTask(String),
    /// No project with this id is loaded.
    UnknownProject(String),
    /// Project fields failed validation before any remote call.
    InvalidProject(String),
    /// A mutation intent no longer matches the item's current location.
    StaleIntent {
        item: TaskId,
        expected: (TaskStatus, usize),
        actual: (TaskStatus, usize),
    },
}

impl BoardError {
    /// Wrap a persistence failure for `operation`.
    #[must_use]
    pub fn persistence(operation: Operation, source: PersistenceError) -> Self {
        Self::Persistence { operation, source }
    }
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(e) => write!(f, "index error: {e}"),
            Self::Persistence { operation, source } => {
                write!(f, "failed to {operation}: {source}")
            }
            Self::UnknownTask(id) => write!(f, "unknown task {id}"),
            Self::InvalidTask(msg) => write!(f, "invalid task: {msg}"),
            Self::UnknownProject(id) => write!(f, "unknown project {id}"),
            Self::InvalidProject(msg) => write!(f, "invalid project: {msg}"),
            Self::StaleIntent {
                item,
                expected,
                actual,
            } => write!(
                f,
                "stale intent for {item}: expected {}[{}], found {}[{}]",
                expected.0, expected.1, actual.0, actual.1
            ),
        }
    }
}

impl std::error::Error for BoardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Index(e) => Some(e),
            Self::Persistence { source, .. } => Some(source),
            Self::UnknownTask(_)
            | Self::InvalidTask(_)
            | Self::UnknownProject(_)
            | Self::InvalidProject(_)
            | Self::StaleIntent { .. } => None,
        }
    }
}

impl From<IndexError> for BoardError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn persistence_error_chains_source() {
        let err = BoardError::persistence(
            Operation::UpdateTaskStatus,
            PersistenceError::Unavailable("offline".into()),
        );
        assert_eq!(err.to_string(), "failed to move task: service unavailable: offline");
        assert!(err.source().is_some());
    }

    #[test]
    fn index_error_converts() {
        let err: BoardError = IndexError::UnknownItem(TaskId::from("x")).into();
        assert!(matches!(err, BoardError::Index(IndexError::UnknownItem(_))));
        assert_eq!(err.to_string(), "index error: item x is not on the board");
    }
}
