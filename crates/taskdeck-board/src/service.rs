#![forbid(unsafe_code)]

//! Board CRUD flows.
//!
//! Loading, creating, editing, and deleting tasks and projects go through the
//! persistence service first and update the board only with what the service
//! returned. Drag moves take the optimistic path in [`crate::coordinator`]
//! instead.

use std::rc::Rc;

use taskdeck_core::logging::TARGET_BOARD;
use tracing::{Instrument, info, info_span, warn};

use crate::coordinator::MutationCoordinator;
use crate::error::{BoardError, Operation, PersistenceError};
use crate::model::{NewProject, NewTask, Project, ProjectPatch, Task, TaskId, TaskPatch};
use crate::persistence::{ProjectPersistence, TaskPersistence};
use crate::state::BoardHandle;

/// Board plus the service it is persisted to.
#[derive(Debug)]
pub struct BoardService<P> {
    board: BoardHandle,
    persistence: Rc<P>,
}

impl<P> Clone for BoardService<P> {
    fn clone(&self) -> Self {
        Self {
            board: self.board.clone(),
            persistence: Rc::clone(&self.persistence),
        }
    }
}

impl<P: TaskPersistence> BoardService<P> {
    /// An empty board backed by `persistence`. Call [`load`](Self::load) to
    /// populate it.
    #[must_use]
    pub fn new(persistence: P) -> Self {
        Self::with_board(BoardHandle::new(), Rc::new(persistence))
    }

    /// Wrap an existing board and service.
    #[must_use]
    pub fn with_board(board: BoardHandle, persistence: Rc<P>) -> Self {
        Self { board, persistence }
    }

    /// The shared board.
    #[must_use]
    pub fn board(&self) -> &BoardHandle {
        &self.board
    }

    /// The persistence service.
    #[must_use]
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// A mutation coordinator sharing this board and service.
    #[must_use]
    pub fn coordinator(&self) -> MutationCoordinator<P> {
        MutationCoordinator::new(self.board.clone(), Rc::clone(&self.persistence))
    }

    /// Replace the board with the service's task list.
    pub async fn load(&self) -> Result<usize, BoardError> {
        let tasks = self
            .persistence
            .list_tasks()
            .instrument(info_span!(target: TARGET_BOARD, "list_tasks"))
            .await
            .map_err(|e| self.fail(Operation::ListTasks, e))?;
        let count = tasks.len();
        self.board.update(|state| state.replace_tasks(tasks))?;
        info!(target: TARGET_BOARD, count, "board loaded");
        Ok(count)
    }

    /// Create a task and append it to its column.
    pub async fn create(&self, fields: NewTask) -> Result<Task, BoardError> {
        fields.validate().map_err(BoardError::InvalidTask)?;
        let task = self
            .persistence
            .create_task(fields)
            .instrument(info_span!(target: TARGET_BOARD, "create_task"))
            .await
            .map_err(|e| self.fail(Operation::CreateTask, e))?;
        self.board.update(|state| -> Result<(), BoardError> {
            state.insert_task(task.clone())?;
            state.clear_error();
            Ok(())
        })?;
        info!(target: TARGET_BOARD, id = %task.id, status = %task.status, "task created");
        Ok(task)
    }

    /// Edit a task. A status change moves it to the end of its new column.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, BoardError> {
        self.ensure_known(id)?;
        let task = self
            .persistence
            .update_task(id, patch)
            .instrument(info_span!(target: TARGET_BOARD, "update_task", id = %id))
            .await
            .map_err(|e| self.fail(Operation::UpdateTask, e))?;
        self.board.update(|state| -> Result<(), BoardError> {
            state.supersede(id);
            state.adopt(task.clone())?;
            state.clear_error();
            Ok(())
        })?;
        info!(target: TARGET_BOARD, id = %id, "task updated");
        Ok(task)
    }

    /// Delete a task.
    pub async fn delete(&self, id: &TaskId) -> Result<Task, BoardError> {
        self.ensure_known(id)?;
        self.persistence
            .delete_task(id)
            .instrument(info_span!(target: TARGET_BOARD, "delete_task", id = %id))
            .await
            .map_err(|e| self.fail(Operation::DeleteTask, e))?;
        let removed = self.board.update(|state| {
            state.clear_error();
            state.remove_task(id)
        });
        info!(target: TARGET_BOARD, id = %id, "task deleted");
        // Another flow may have removed it while the call was in flight.
        removed.ok_or_else(|| BoardError::UnknownTask(id.clone()))
    }

    fn ensure_known(&self, id: &TaskId) -> Result<(), BoardError> {
        if self.board.read(|state| state.task(id).is_some()) {
            Ok(())
        } else {
            Err(BoardError::UnknownTask(id.clone()))
        }
    }

    /// Record a remote failure as the board's retained error.
    fn fail(&self, operation: Operation, source: PersistenceError) -> BoardError {
        let error = BoardError::persistence(operation, source);
        warn!(target: TARGET_BOARD, error = %error, "remote call failed");
        self.board.update(|state| state.set_error(error.clone()));
        error
    }
}

impl<P: TaskPersistence + ProjectPersistence> BoardService<P> {
    /// Replace the loaded projects with the service's list.
    pub async fn load_projects(&self) -> Result<usize, BoardError> {
        let projects = self
            .persistence
            .list_projects()
            .instrument(info_span!(target: TARGET_BOARD, "list_projects"))
            .await
            .map_err(|e| self.fail(Operation::ListProjects, e))?;
        let count = projects.len();
        self.board.update(|state| state.replace_projects(projects));
        info!(target: TARGET_BOARD, count, "projects loaded");
        Ok(count)
    }

    /// Create a project and append it to the project list.
    pub async fn create_project(&self, fields: NewProject) -> Result<Project, BoardError> {
        fields.validate().map_err(BoardError::InvalidProject)?;
        let project = self
            .persistence
            .create_project(fields)
            .instrument(info_span!(target: TARGET_BOARD, "create_project"))
            .await
            .map_err(|e| self.fail(Operation::CreateProject, e))?;
        self.board.update(|state| {
            state.upsert_project(project.clone());
            state.clear_error();
        });
        info!(target: TARGET_BOARD, id = %project.id, "project created");
        Ok(project)
    }

    /// Edit a project in place.
    pub async fn update_project(
        &self,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Project, BoardError> {
        self.ensure_project(id)?;
        let project = self
            .persistence
            .update_project(id, patch)
            .instrument(info_span!(target: TARGET_BOARD, "update_project", id))
            .await
            .map_err(|e| self.fail(Operation::UpdateProject, e))?;
        self.board.update(|state| {
            state.upsert_project(project.clone());
            state.clear_error();
        });
        info!(target: TARGET_BOARD, id, "project updated");
        Ok(project)
    }

    /// Delete a project. Its tasks stay on the board and are grouped under
    /// the bare project id afterwards.
    pub async fn delete_project(&self, id: &str) -> Result<Project, BoardError> {
        self.ensure_project(id)?;
        self.persistence
            .delete_project(id)
            .instrument(info_span!(target: TARGET_BOARD, "delete_project", id))
            .await
            .map_err(|e| self.fail(Operation::DeleteProject, e))?;
        let removed = self.board.update(|state| {
            state.clear_error();
            state.remove_project(id)
        });
        info!(target: TARGET_BOARD, id, "project deleted");
        removed.ok_or_else(|| BoardError::UnknownProject(id.to_owned()))
    }

    fn ensure_project(&self, id: &str) -> Result<(), BoardError> {
        if self.board.read(|state| state.project(id).is_some()) {
            Ok(())
        } else {
            Err(BoardError::UnknownProject(id.to_owned()))
        }
    }
}
