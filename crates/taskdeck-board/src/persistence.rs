#![forbid(unsafe_code)]

//! Persistence service boundary.
//!
//! [`TaskPersistence`] and [`ProjectPersistence`] are the async contracts the
//! board talks to. Transport is the implementor's business (HTTP in
//! production). [`MemoryPersistence`] implements both over ordered maps with
//! failure injection, for tests and demos.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use time::OffsetDateTime;

use crate::error::PersistenceError;
use crate::model::{NewProject, NewTask, Project, ProjectPatch, Task, TaskId, TaskPatch, TaskStatus};

/// Remote task store.
///
/// Futures are polled on the UI thread; implementations need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait TaskPersistence {
    /// All tasks, in server order.
    async fn list_tasks(&self) -> Result<Vec<Task>, PersistenceError>;

    /// Create a task and return it with its assigned id and timestamps.
    async fn create_task(&self, fields: NewTask) -> Result<Task, PersistenceError>;

    /// Apply a partial update.
    async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, PersistenceError>;

    /// Set a task's status. Idempotent.
    async fn update_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<Task, PersistenceError>;

    /// Delete a task.
    async fn delete_task(&self, id: &TaskId) -> Result<(), PersistenceError>;
}

/// Remote project store.
#[allow(async_fn_in_trait)]
pub trait ProjectPersistence {
    /// All projects, in server order.
    async fn list_projects(&self) -> Result<Vec<Project>, PersistenceError>;

    /// A single project.
    async fn get_project(&self, id: &str) -> Result<Project, PersistenceError>;

    /// Create a project and return it with its assigned id and timestamps.
    async fn create_project(&self, fields: NewProject) -> Result<Project, PersistenceError>;

    /// Apply a partial update.
    async fn update_project(
        &self,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Project, PersistenceError>;

    /// Delete a project. Its tasks keep their `project_id`.
    async fn delete_project(&self, id: &str) -> Result<(), PersistenceError>;
}

/// A call recorded by [`MemoryPersistence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceCall {
    List,
    Create(String),
    Update(TaskId),
    UpdateStatus(TaskId, TaskStatus),
    Delete(TaskId),
    ListProjects,
    GetProject(String),
    CreateProject(String),
    UpdateProject(String),
    DeleteProject(String),
}

#[derive(Debug, Default)]
struct MemoryInner {
    tasks: BTreeMap<TaskId, Task>,
    order: Vec<TaskId>,
    next_id: u64,
    projects: BTreeMap<String, Project>,
    project_order: Vec<String>,
    next_project_id: u64,
    failures: VecDeque<PersistenceError>,
    offline: bool,
    calls: Vec<PersistenceCall>,
}

impl MemoryInner {
    fn begin(&mut self, call: PersistenceCall) -> Result<(), PersistenceError> {
        self.calls.push(call);
        if self.offline {
            return Err(PersistenceError::Unavailable("offline".into()));
        }
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn get_mut(&mut self, id: &TaskId) -> Result<&mut Task, PersistenceError> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))
    }

    fn project_mut(&mut self, id: &str) -> Result<&mut Project, PersistenceError> {
        self.projects
            .get_mut(id)
            .ok_or_else(|| PersistenceError::ProjectNotFound(id.to_owned()))
    }
}

/// In-memory [`TaskPersistence`] with scripted failures.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    inner: RefCell<MemoryInner>,
}

impl MemoryPersistence {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `tasks` (kept in the given order).
    #[must_use]
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.borrow_mut();
            for task in tasks {
                if !inner.tasks.contains_key(&task.id) {
                    inner.order.push(task.id.clone());
                }
                inner.tasks.insert(task.id.clone(), task);
            }
        }
        store
    }

    /// Seed projects (kept in the given order).
    #[must_use]
    pub fn with_projects(self, projects: impl IntoIterator<Item = Project>) -> Self {
        {
            let mut inner = self.inner.borrow_mut();
            for project in projects {
                if !inner.projects.contains_key(&project.id) {
                    inner.project_order.push(project.id.clone());
                }
                inner.projects.insert(project.id.clone(), project);
            }
        }
        self
    }

    /// Fail the next call with `err`. Queued failures are consumed in order.
    pub fn fail_next(&self, err: PersistenceError) {
        self.inner.borrow_mut().failures.push_back(err);
    }

    /// While offline, every call fails with [`PersistenceError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<PersistenceCall> {
        self.inner.borrow().calls.clone()
    }

    /// Stored copy of a task.
    #[must_use]
    pub fn stored(&self, id: &TaskId) -> Option<Task> {
        self.inner.borrow().tasks.get(id).cloned()
    }

    /// Stored copy of a project.
    #[must_use]
    pub fn stored_project(&self, id: &str) -> Option<Project> {
        self.inner.borrow().projects.get(id).cloned()
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

impl TaskPersistence for MemoryPersistence {
    async fn list_tasks(&self) -> Result<Vec<Task>, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::List)?;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect())
    }

    async fn create_task(&self, fields: NewTask) -> Result<Task, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::Create(fields.title.clone()))?;
        fields.validate().map_err(PersistenceError::Invalid)?;
        let id = loop {
            inner.next_id += 1;
            let candidate = TaskId::new(format!("task-{}", inner.next_id));
            if !inner.tasks.contains_key(&candidate) {
                break candidate;
            }
        };
        let task = fields.into_task(id.clone(), Self::now());
        inner.order.push(id.clone());
        inner.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::Update(id.clone()))?;
        let task = inner.get_mut(id)?;
        task.apply_patch(&patch, Self::now());
        Ok(task.clone())
    }

    async fn update_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<Task, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::UpdateStatus(id.clone(), status))?;
        let task = inner.get_mut(id)?;
        if task.status != status {
            task.status = status;
            task.updated_at = Self::now();
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::Delete(id.clone()))?;
        inner
            .tasks
            .remove(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        inner.order.retain(|existing| existing != id);
        Ok(())
    }
}

impl ProjectPersistence for MemoryPersistence {
    async fn list_projects(&self) -> Result<Vec<Project>, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::ListProjects)?;
        Ok(inner
            .project_order
            .iter()
            .filter_map(|id| inner.projects.get(id).cloned())
            .collect())
    }

    async fn get_project(&self, id: &str) -> Result<Project, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::GetProject(id.to_owned()))?;
        inner
            .projects
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::ProjectNotFound(id.to_owned()))
    }

    async fn create_project(&self, fields: NewProject) -> Result<Project, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::CreateProject(fields.name.clone()))?;
        fields.validate().map_err(PersistenceError::Invalid)?;
        let id = loop {
            inner.next_project_id += 1;
            let candidate = format!("project-{}", inner.next_project_id);
            if !inner.projects.contains_key(&candidate) {
                break candidate;
            }
        };
        let project = fields.into_project(id.clone(), Self::now());
        inner.project_order.push(id.clone());
        inner.projects.insert(id, project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Project, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::UpdateProject(id.to_owned()))?;
        let project = inner.project_mut(id)?;
        project.apply_patch(&patch, Self::now());
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &str) -> Result<(), PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        inner.begin(PersistenceCall::DeleteProject(id.to_owned()))?;
        inner
            .projects
            .remove(id)
            .ok_or_else(|| PersistenceError::ProjectNotFound(id.to_owned()))?;
        inner.project_order.retain(|existing| existing != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn seeded() -> MemoryPersistence {
        MemoryPersistence::with_tasks([
            Task::new("a", "Alpha", TaskStatus::Todo, OffsetDateTime::UNIX_EPOCH),
            Task::new("b", "Beta", TaskStatus::Done, OffsetDateTime::UNIX_EPOCH),
        ])
    }

    #[test]
    fn list_keeps_insertion_order() {
        let store = seeded();
        let tasks = block_on(store.list_tasks()).unwrap();
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn create_assigns_id_and_defaults_status() {
        let store = MemoryPersistence::new();
        let task = block_on(store.create_task(NewTask::titled("New"))).unwrap();
        assert_eq!(task.id.as_str(), "task-1");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.created_at, task.updated_at);
        assert!(store.stored(&task.id).is_some());
    }

    #[test]
    fn create_requires_title() {
        let store = MemoryPersistence::new();
        let err = block_on(store.create_task(NewTask::titled(""))).unwrap_err();
        assert!(matches!(err, PersistenceError::Invalid(_)));
    }

    #[test]
    fn status_update_is_idempotent() {
        let store = seeded();
        let first = block_on(store.update_task_status(&"a".into(), TaskStatus::Done)).unwrap();
        let second = block_on(store.update_task_status(&"a".into(), TaskStatus::Done)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = seeded();
        block_on(store.delete_task(&"a".into())).unwrap();
        assert_eq!(
            block_on(store.delete_task(&"a".into())),
            Err(PersistenceError::NotFound("a".into()))
        );
    }

    #[test]
    fn project_crud_round() {
        let store = MemoryPersistence::new();
        let web = block_on(store.create_project(NewProject::new("Web", "/srv/web"))).unwrap();
        let ops = block_on(store.create_project(NewProject::new("Ops", "/srv/ops"))).unwrap();
        assert_eq!(web.id, "project-1");
        assert_eq!(ops.id, "project-2");

        let listed = block_on(store.list_projects()).unwrap();
        let names: Vec<_> = listed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Web", "Ops"]);

        let patch = ProjectPatch {
            description: Some("Public site".into()),
            ..ProjectPatch::default()
        };
        let updated = block_on(store.update_project(&web.id, patch)).unwrap();
        assert_eq!(updated.name, "Web");
        assert_eq!(updated.description, "Public site");
        assert_eq!(block_on(store.get_project(&web.id)).unwrap(), updated);

        block_on(store.delete_project(&web.id)).unwrap();
        assert_eq!(
            block_on(store.get_project(&web.id)),
            Err(PersistenceError::ProjectNotFound(web.id.clone()))
        );
        assert_eq!(
            block_on(store.delete_project(&web.id)),
            Err(PersistenceError::ProjectNotFound(web.id))
        );
        assert_eq!(block_on(store.list_projects()).unwrap().len(), 1);
    }

    #[test]
    fn project_create_requires_directory() {
        let store = MemoryPersistence::new();
        let err = block_on(store.create_project(NewProject::new("Web", ""))).unwrap_err();
        assert_eq!(err, PersistenceError::Invalid("directory is required".into()));
        assert!(block_on(store.list_projects()).unwrap().is_empty());
    }

    #[test]
    fn scripted_failures_are_consumed_in_order() {
        let store = seeded();
        store.fail_next(PersistenceError::Rejected("first".into()));
        assert!(block_on(store.list_tasks()).is_err());
        assert!(block_on(store.list_tasks()).is_ok());

        store.set_offline(true);
        assert!(matches!(
            block_on(store.list_tasks()),
            Err(PersistenceError::Unavailable(_))
        ));
        assert_eq!(store.calls().len(), 3);
    }
}
