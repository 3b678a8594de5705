#![forbid(unsafe_code)]

//! Read-only board views: search filtering and project grouping.

use crate::model::{Project, ProjectStats, Task, TaskStatus};
use crate::state::BoardState;

/// One column of a [`BoardView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

impl ColumnView {
    /// Column title.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.status.label()
    }
}

/// Columns in board order, each holding the tasks that passed the filter.
///
/// Only built by [`filter_board`], which emits one column per status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    columns: Vec<ColumnView>,
}

impl BoardView {
    /// All columns, in board order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnView] {
        &self.columns
    }

    /// The column for `status`.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> Option<&ColumnView> {
        self.columns
            .get(status.index())
            .filter(|column| column.status == status)
            .or_else(|| self.columns.iter().find(|column| column.status == status))
    }

    /// Number of tasks visible across all columns.
    #[must_use]
    pub fn visible(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }
}

/// Filter the board by a case-insensitive query. A blank query keeps every
/// task. Column order and intra-column order follow the index.
#[must_use]
pub fn filter_board(state: &BoardState, query: &str) -> BoardView {
    let columns = state
        .index()
        .iter()
        .map(|(status, ids)| ColumnView {
            status,
            tasks: ids
                .iter()
                .filter_map(|id| state.task(id))
                .filter(|task| task.matches_query(query))
                .cloned()
                .collect(),
        })
        .collect();
    BoardView { columns }
}

/// Tasks of one project with their counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGroup {
    pub project_id: String,
    /// `None` when tasks reference a project that is not loaded.
    pub project: Option<Project>,
    pub tasks: Vec<Task>,
    pub stats: ProjectStats,
}

impl ProjectGroup {
    /// Display name: the project's name, or its id when it is not loaded.
    #[must_use]
    pub fn name(&self) -> &str {
        self.project
            .as_ref()
            .map_or(self.project_id.as_str(), |p| p.name.as_str())
    }
}

/// Partition tasks by `project_id`.
///
/// Every project in `projects` gets a group, in list order, even when it has
/// no tasks. Tasks naming an unknown project follow in first-seen order.
/// Tasks without a project are left out.
pub fn group_by_project<'a>(
    projects: &[Project],
    tasks: impl IntoIterator<Item = &'a Task>,
) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = projects
        .iter()
        .map(|project| ProjectGroup {
            project_id: project.id.clone(),
            project: Some(project.clone()),
            tasks: Vec::new(),
            stats: ProjectStats::default(),
        })
        .collect();
    for task in tasks {
        if task.project_id.is_empty() {
            continue;
        }
        match groups.iter_mut().find(|g| g.project_id == task.project_id) {
            Some(group) => group.tasks.push(task.clone()),
            None => groups.push(ProjectGroup {
                project_id: task.project_id.clone(),
                project: None,
                tasks: vec![task.clone()],
                stats: ProjectStats::default(),
            }),
        }
    }
    for group in &mut groups {
        group.stats = ProjectStats::compute(&group.project_id, &group.tasks);
    }
    groups
}
