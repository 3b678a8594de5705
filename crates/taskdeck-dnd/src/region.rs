#![forbid(unsafe_code)]

//! Droppable regions.
//!
//! The host lays out the board and registers one region per column and one
//! per card. Registration order matters: it breaks ties in the resolver.

use std::fmt;

use taskdeck_board::{ContainerIndex, TaskId, TaskStatus};
use taskdeck_core::geometry::{Point, Rect};

/// What a region (or a drag) refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DropId {
    /// A whole column.
    Container(TaskStatus),
    /// A single card.
    Item(TaskId),
}

impl DropId {
    /// Whether this is a column.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container(_))
    }

    /// The card id, if this is a card.
    #[must_use]
    pub fn as_item(&self) -> Option<&TaskId> {
        match self {
            Self::Item(id) => Some(id),
            Self::Container(_) => None,
        }
    }
}

impl fmt::Display for DropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container(status) => write!(f, "container:{status}"),
            Self::Item(id) => write!(f, "item:{id}"),
        }
    }
}

impl From<TaskStatus> for DropId {
    fn from(status: TaskStatus) -> Self {
        Self::Container(status)
    }
}

impl From<TaskId> for DropId {
    fn from(id: TaskId) -> Self {
        Self::Item(id)
    }
}

/// A rectangle something can be dropped on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppableRegion {
    pub id: DropId,
    /// Column the region belongs to (itself, for a column).
    pub container: TaskStatus,
    pub rect: Rect,
    /// Ordered card ids of a column; empty for cards.
    pub members: Vec<TaskId>,
}

impl DroppableRegion {
    /// A column region.
    #[must_use]
    pub fn container(status: TaskStatus, rect: Rect, members: Vec<TaskId>) -> Self {
        Self {
            id: DropId::Container(status),
            container: status,
            rect,
            members,
        }
    }

    /// A card region inside `container`.
    #[must_use]
    pub fn item(id: impl Into<TaskId>, container: TaskStatus, rect: Rect) -> Self {
        Self {
            id: DropId::Item(id.into()),
            container,
            rect,
            members: Vec::new(),
        }
    }

    /// Whether this region is a column.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.id.is_container()
    }
}

/// Registered regions in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropRegions {
    regions: Vec<DroppableRegion>,
}

impl DropRegions {
    /// No regions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region. A region with the same id replaces the old one in
    /// place, keeping its registration slot.
    pub fn register(&mut self, region: DroppableRegion) {
        match self.regions.iter_mut().find(|r| r.id == region.id) {
            Some(existing) => *existing = region,
            None => self.regions.push(region),
        }
    }

    /// Remove a region.
    pub fn unregister(&mut self, id: &DropId) -> Option<DroppableRegion> {
        let pos = self.regions.iter().position(|r| &r.id == id)?;
        Some(self.regions.remove(pos))
    }

    /// Remove every region.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Look up a region.
    #[must_use]
    pub fn get(&self, id: &DropId) -> Option<&DroppableRegion> {
        self.regions.iter().find(|r| &r.id == id)
    }

    /// Regions in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, DroppableRegion> {
        self.regions.iter()
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Copy column member lists from the index.
    pub fn sync_members(&mut self, index: &ContainerIndex) {
        for region in &mut self.regions {
            if let DropId::Container(status) = region.id {
                region.members = index.members(status).iter().cloned().collect();
            }
        }
    }

    /// The smallest card containing `point`, else the smallest column.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<&DroppableRegion> {
        let smallest = |want_container: bool| {
            self.regions
                .iter()
                .filter(|r| r.is_container() == want_container && r.rect.contains(point))
                .fold(None, |best: Option<&DroppableRegion>, r| match best {
                    Some(b) if b.rect.area() <= r.rect.area() => Some(b),
                    _ => Some(r),
                })
        };
        smallest(false).or_else(|| smallest(true))
    }
}

impl<'a> IntoIterator for &'a DropRegions {
    type Item = &'a DroppableRegion;
    type IntoIter = std::slice::Iter<'a, DroppableRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
