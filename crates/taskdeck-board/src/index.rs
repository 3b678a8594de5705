#![forbid(unsafe_code)]

//! Container membership index.
//!
//! Maps each [`TaskStatus`] column to an ordered sequence of task ids.
//! Columns are persistent vectors ([`im::Vector`]), so [`ContainerIndex::snapshot`]
//! is a handful of reference-count bumps and a later [`restore`](ContainerIndex::restore)
//! shares structure with the live index.
//!
//! # Invariants
//!
//! 1. Every id appears in exactly one column, exactly once.
//! 2. All five columns exist for the lifetime of the index (possibly empty).
//! 3. Insertion positions are clamped to `[0, len]`; no operation panics on an
//!    out-of-range index.

use im::Vector;
use taskdeck_core::logging::TARGET_BOARD;
use tracing::trace;

use crate::error::IndexError;
use crate::model::{Task, TaskId, TaskStatus};

type Column = Vector<TaskId>;

/// Opaque capture of a [`ContainerIndex`] for rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSnapshot {
    columns: [Column; TaskStatus::COUNT],
}

/// Ordered membership of task ids per status column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerIndex {
    columns: [Column; TaskStatus::COUNT],
}

impl Default for ContainerIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerIndex {
    /// An index with every column present and empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: std::array::from_fn(|_| Vector::new()),
        }
    }

    /// Group tasks into columns by status, preserving list order.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Result<Self, IndexError> {
        let mut index = Self::new();
        for task in tasks {
            index.push(task.id.clone(), task.status)?;
        }
        Ok(index)
    }

    /// Move `item` out of `from` and into `to` at `to_index` (clamped).
    ///
    /// When `from == to` this is an in-place reorder: the item is removed
    /// first and reinserted, so `to_index` addresses the list without it.
    /// Returns the position the item landed at.
    pub fn move_item(
        &mut self,
        item: &TaskId,
        from: TaskStatus,
        to: TaskStatus,
        to_index: usize,
    ) -> Result<usize, IndexError> {
        let Some(from_index) = self.position_in(item, from) else {
            return Err(match self.locate(item) {
                Some(_) => IndexError::NotInContainer {
                    item: item.clone(),
                    container: from,
                },
                None => IndexError::UnknownItem(item.clone()),
            });
        };
        let id = self.column_mut(from).remove(from_index);
        let target = self.column_mut(to);
        let landed = to_index.min(target.len());
        target.insert(landed, id);
        trace!(
            target: TARGET_BOARD,
            item = %item,
            %from,
            from_index,
            %to,
            to_index = landed,
            "index move"
        );
        Ok(landed)
    }

    /// Insert a new id at `index` (clamped) in `container`.
    pub fn insert(
        &mut self,
        item: TaskId,
        container: TaskStatus,
        index: usize,
    ) -> Result<usize, IndexError> {
        if let Some((existing, _)) = self.locate(&item) {
            return Err(IndexError::DuplicateItem {
                item,
                container: existing,
            });
        }
        let column = self.column_mut(container);
        let landed = index.min(column.len());
        column.insert(landed, item);
        Ok(landed)
    }

    /// Append a new id to the end of `container`.
    pub fn push(&mut self, item: TaskId, container: TaskStatus) -> Result<usize, IndexError> {
        self.insert(item, container, usize::MAX)
    }

    /// Remove an id from whichever column holds it.
    pub fn remove(&mut self, item: &TaskId) -> Result<(TaskStatus, usize), IndexError> {
        let (container, index) = self
            .locate(item)
            .ok_or_else(|| IndexError::UnknownItem(item.clone()))?;
        self.column_mut(container).remove(index);
        Ok((container, index))
    }

    /// Column and position of `item`.
    #[must_use]
    pub fn locate(&self, item: &TaskId) -> Option<(TaskStatus, usize)> {
        TaskStatus::ALL
            .into_iter()
            .find_map(|status| self.position_in(item, status).map(|i| (status, i)))
    }

    /// Whether any column holds `item`.
    #[must_use]
    pub fn contains(&self, item: &TaskId) -> bool {
        self.locate(item).is_some()
    }

    /// Ordered ids in `container`.
    #[must_use]
    pub fn members(&self, container: TaskStatus) -> &Vector<TaskId> {
        &self.columns[container.index()]
    }

    /// Number of ids in `container`.
    #[must_use]
    pub fn len(&self, container: TaskStatus) -> usize {
        self.columns[container.index()].len()
    }

    /// Number of ids across all columns.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.columns.iter().map(Vector::len).sum()
    }

    /// Whether every column is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Vector::is_empty)
    }

    /// Iterate columns in board order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskStatus, &Vector<TaskId>)> {
        TaskStatus::ALL
            .into_iter()
            .map(|status| (status, &self.columns[status.index()]))
    }

    /// Capture the full index.
    #[must_use]
    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            columns: self.columns.clone(),
        }
    }

    /// Replace the index with a previously captured snapshot.
    pub fn restore(&mut self, snapshot: IndexSnapshot) {
        self.columns = snapshot.columns;
    }

    fn position_in(&self, item: &TaskId, container: TaskStatus) -> Option<usize> {
        self.columns[container.index()].index_of(item)
    }

    fn column_mut(&mut self, container: TaskStatus) -> &mut Column {
        &mut self.columns[container.index()]
    }
}
