#![forbid(unsafe_code)]

//! Shared board state.
//!
//! [`BoardState`] is the single source of truth for rendering: the membership
//! index plus the canonical task collection. [`BoardHandle`] shares it between
//! the drag controller, the mutation coordinator, and the CRUD flows.
//!
//! The runtime is single-threaded, so the handle is an `Rc<RefCell<_>>`.
//! Borrows are scoped to synchronous sections; nothing in this crate holds a
//! borrow across an `.await`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use taskdeck_core::logging::TARGET_BOARD;
use tracing::warn;

use crate::error::{BoardError, IndexError};
use crate::index::ContainerIndex;
use crate::model::{Project, Task, TaskId, TaskStatus};
use crate::view::{self, BoardView, ProjectGroup};

/// Last confirmed state of an item with a remote mutation in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Baseline {
    pub(crate) task: Task,
    pub(crate) container: TaskStatus,
    pub(crate) index: usize,
}

/// Index, task collection, and mutation bookkeeping.
///
/// Only items with an unsettled remote mutation carry a generation entry; the
/// entry is dropped when the newest mutation settles or is superseded.
#[derive(Debug, Default)]
pub struct BoardState {
    index: ContainerIndex,
    tasks: im::HashMap<TaskId, Task>,
    projects: Vec<Project>,
    revision: u64,
    generation_counter: u64,
    generations: HashMap<TaskId, u64>,
    in_flight: HashMap<TaskId, Baseline>,
    error: Option<BoardError>,
}

impl BoardState {
    /// Build state from a task list, grouped by status in list order.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self, BoardError> {
        let index = ContainerIndex::from_tasks(&tasks)?;
        let tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Ok(Self {
            index,
            tasks,
            ..Self::default()
        })
    }

    /// The membership index.
    #[must_use]
    pub fn index(&self) -> &ContainerIndex {
        &self.index
    }

    /// Look up a task.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Tasks in board order (column by column, top to bottom).
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.index
            .iter()
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| self.tasks.get(id))
    }

    /// Number of tasks on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the board has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Counter bumped by every local change to the index or collection.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The user-visible error retained from the last failed operation.
    #[must_use]
    pub fn retained_error(&self) -> Option<&BoardError> {
        self.error.as_ref()
    }

    /// Whether a remote status change for `id` is awaiting its response.
    #[must_use]
    pub fn is_pending(&self, id: &TaskId) -> bool {
        self.in_flight.contains_key(id)
    }

    /// Read-only filtered view; see [`view::filter_board`].
    #[must_use]
    pub fn view(&self, query: &str) -> BoardView {
        view::filter_board(self, query)
    }

    /// Loaded projects, in server order.
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Look up a project.
    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Tasks matching `query`, grouped by project; see
    /// [`view::group_by_project`].
    #[must_use]
    pub fn project_groups(&self, query: &str) -> Vec<ProjectGroup> {
        let matching: Vec<Task> = self
            .tasks()
            .filter(|t| t.matches_query(query))
            .cloned()
            .collect();
        view::group_by_project(&self.projects, &matching)
    }

    /// Number of items with an unsettled remote mutation.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.generations.len()
    }

    // -- crate-internal mutation -------------------------------------------

    pub(crate) fn index_mut(&mut self) -> &mut ContainerIndex {
        &mut self.index
    }

    pub(crate) fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub(crate) fn bump_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Generation of the newest unsettled mutation for `id`, or 0.
    pub(crate) fn generation(&self, id: &TaskId) -> u64 {
        self.generations.get(id).copied().unwrap_or(0)
    }

    /// Issue a fresh generation for `id`. Numbers come from one board-wide
    /// counter, so a retired entry can never be matched again.
    pub(crate) fn next_generation(&mut self, id: &TaskId) -> u64 {
        self.generation_counter += 1;
        self.generations.insert(id.clone(), self.generation_counter);
        self.generation_counter
    }

    /// Drop the bookkeeping of a settled mutation, returning its baseline.
    pub(crate) fn retire(&mut self, id: &TaskId) -> Option<Baseline> {
        self.generations.remove(id);
        self.in_flight.remove(id)
    }

    pub(crate) fn in_flight_mut(&mut self) -> &mut HashMap<TaskId, Baseline> {
        &mut self.in_flight
    }

    /// Invalidate any outstanding remote mutation for `id`.
    pub(crate) fn supersede(&mut self, id: &TaskId) {
        self.retire(id);
    }

    pub(crate) fn set_error(&mut self, error: BoardError) {
        self.error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }

    /// Replace a task's content and keep the index in step with its status.
    /// A task whose status changed is appended to its new column.
    pub(crate) fn adopt(&mut self, task: Task) -> Result<(), IndexError> {
        match self.index.locate(&task.id) {
            Some((container, _)) if container != task.status => {
                self.index
                    .move_item(&task.id, container, task.status, usize::MAX)?;
            }
            Some(_) => {}
            None => {
                self.index.push(task.id.clone(), task.status)?;
            }
        }
        self.tasks.insert(task.id.clone(), task);
        self.bump_revision();
        Ok(())
    }

    pub(crate) fn insert_task(&mut self, task: Task) -> Result<(), IndexError> {
        self.index.push(task.id.clone(), task.status)?;
        self.tasks.insert(task.id.clone(), task);
        self.bump_revision();
        Ok(())
    }

    pub(crate) fn remove_task(&mut self, id: &TaskId) -> Option<Task> {
        let task = self.tasks.remove(id)?;
        if let Err(e) = self.index.remove(id) {
            warn!(target: TARGET_BOARD, item = %id, error = %e, "index out of step with task collection");
        }
        self.supersede(id);
        self.bump_revision();
        Some(task)
    }

    /// Swap in a freshly loaded task list. Outstanding remote mutations are
    /// superseded; the retained error is cleared.
    pub(crate) fn replace_tasks(&mut self, tasks: Vec<Task>) -> Result<(), BoardError> {
        let fresh = Self::from_tasks(tasks)?;
        let pending: Vec<TaskId> = self.generations.keys().cloned().collect();
        for id in &pending {
            self.supersede(id);
        }
        self.index = fresh.index;
        self.tasks = fresh.tasks;
        self.error = None;
        self.bump_revision();
        Ok(())
    }

    pub(crate) fn replace_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        self.bump_revision();
    }

    /// Insert or replace a project, keeping list position on replace.
    pub(crate) fn upsert_project(&mut self, project: Project) {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
        self.bump_revision();
    }

    pub(crate) fn remove_project(&mut self, id: &str) -> Option<Project> {
        let position = self.projects.iter().position(|p| p.id == id)?;
        let project = self.projects.remove(position);
        self.bump_revision();
        Some(project)
    }
}

/// Cheap, cloneable handle to shared [`BoardState`].
#[derive(Debug, Clone, Default)]
pub struct BoardHandle(Rc<RefCell<BoardState>>);

impl BoardHandle {
    /// An empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A board pre-populated with `tasks`.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self, BoardError> {
        Ok(Self(Rc::new(RefCell::new(BoardState::from_tasks(tasks)?))))
    }

    /// Run `f` with shared access to the state.
    pub fn read<R>(&self, f: impl FnOnce(&BoardState) -> R) -> R {
        f(&self.0.borrow())
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut BoardState) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Ordered ids in `container`.
    #[must_use]
    pub fn members(&self, container: TaskStatus) -> Vec<TaskId> {
        self.read(|s| s.index().members(container).iter().cloned().collect())
    }

    /// Column and position of `id`.
    #[must_use]
    pub fn locate(&self, id: &TaskId) -> Option<(TaskStatus, usize)> {
        self.read(|s| s.index().locate(id))
    }

    /// A clone of the task with `id`.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.read(|s| s.task(id).cloned())
    }

    /// A clone of the membership index.
    #[must_use]
    pub fn index(&self) -> ContainerIndex {
        self.read(|s| s.index().clone())
    }

    /// A clone of the retained error, if any.
    #[must_use]
    pub fn retained_error(&self) -> Option<BoardError> {
        self.read(|s| s.retained_error().cloned())
    }

    /// Clear the retained error.
    pub fn dismiss_error(&self) {
        self.update(BoardState::clear_error);
    }

    /// Current revision counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.read(BoardState::revision)
    }

    /// Filtered view of the board.
    #[must_use]
    pub fn view(&self, query: &str) -> BoardView {
        self.read(|s| s.view(query))
    }

    /// A clone of the loaded projects.
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        self.read(|s| s.projects().to_vec())
    }

    /// Filtered tasks grouped by project.
    #[must_use]
    pub fn project_groups(&self, query: &str) -> Vec<ProjectGroup> {
        self.read(|s| s.project_groups(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task::new(id, id, status, OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn tasks_iterate_in_board_order() {
        let state = BoardState::from_tasks(vec![
            task("d1", TaskStatus::Done),
            task("t1", TaskStatus::Todo),
            task("t2", TaskStatus::Todo),
        ])
        .unwrap();
        let order: Vec<_> = state.tasks().map(|t| t.id.as_str()).collect();
        assert_eq!(order, ["t1", "t2", "d1"]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = BoardState::from_tasks(vec![
            task("a", TaskStatus::Todo),
            task("a", TaskStatus::Done),
        ])
        .unwrap_err();
        assert!(matches!(err, BoardError::Index(IndexError::DuplicateItem { .. })));
    }

    #[test]
    fn adopt_moves_task_when_status_changes() {
        let mut state = BoardState::from_tasks(vec![
            task("a", TaskStatus::Todo),
            task("b", TaskStatus::Done),
        ])
        .unwrap();
        state.adopt(task("a", TaskStatus::Done)).unwrap();
        assert_eq!(state.index().locate(&"a".into()), Some((TaskStatus::Done, 1)));
        assert_eq!(state.task(&"a".into()).unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn remove_task_supersedes_pending_mutation() {
        let mut state = BoardState::from_tasks(vec![task("a", TaskStatus::Todo)]).unwrap();
        let id = TaskId::from("a");
        let generation = state.next_generation(&id);
        state.in_flight_mut().insert(
            id.clone(),
            Baseline {
                task: task("a", TaskStatus::Todo),
                container: TaskStatus::Todo,
                index: 0,
            },
        );
        assert!(state.remove_task(&id).is_some());
        assert!(!state.is_pending(&id));
        assert_ne!(state.generation(&id), generation);
        assert_eq!(state.pending_len(), 0);
        assert!(state.index().is_empty());
    }

    #[test]
    fn retired_generations_are_never_reissued() {
        let mut state = BoardState::from_tasks(vec![task("a", TaskStatus::Todo)]).unwrap();
        let id = TaskId::from("a");
        let first = state.next_generation(&id);
        state.retire(&id);
        assert_eq!(state.generation(&id), 0);
        assert_eq!(state.pending_len(), 0);
        let second = state.next_generation(&id);
        assert!(second > first);
        assert_eq!(state.generation(&id), second);
    }

    #[test]
    fn remove_task_with_index_out_of_step_still_removes() {
        let mut state = BoardState::from_tasks(vec![task("a", TaskStatus::Todo)]).unwrap();
        let id = TaskId::from("a");
        state.index_mut().remove(&id).unwrap();
        let removed = state.remove_task(&id);
        assert_eq!(removed.map(|t| t.id), Some(id.clone()));
        assert!(state.task(&id).is_none());
        assert!(state.remove_task(&id).is_none());
    }

    #[test]
    fn projects_upsert_in_place_and_remove() {
        let mut state = BoardState::default();
        let project = |id: &str, name: &str| Project {
            id: id.into(),
            name: name.into(),
            directory: format!("/srv/{id}"),
            description: String::new(),
            agent_id: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        state.replace_projects(vec![project("web", "Web"), project("ops", "Ops")]);
        state.upsert_project(project("web", "Website"));
        state.upsert_project(project("docs", "Docs"));
        let names: Vec<_> = state.projects().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Website", "Ops", "Docs"]);
        assert_eq!(state.remove_project("ops").map(|p| p.id), Some("ops".into()));
        assert!(state.remove_project("ops").is_none());
        assert_eq!(state.project("docs").map(|p| p.name.as_str()), Some("Docs"));
    }

    #[test]
    fn handle_dismisses_retained_error() {
        let handle = BoardHandle::new();
        handle.update(|s| s.set_error(BoardError::InvalidTask("x".into())));
        assert!(handle.retained_error().is_some());
        handle.dismiss_error();
        assert!(handle.retained_error().is_none());
    }
}
