#![forbid(unsafe_code)]

//! Collision resolution.
//!
//! Decides which registered region a dragged card (or column) is over.
//! Pure geometry: no board access, no side effects.
//!
//! # Algorithm
//!
//! 1. **Container-locked.** When the active id is a column, only other
//!    columns are candidates; the one whose center is closest to the dragged
//!    rect's center wins.
//! 2. **Pointer containment.** Regions containing the pointer, ranked by the
//!    sum of distances from the pointer to their four corners. A card inside a
//!    column has the smaller sum, so it beats the column.
//! 3. **Rect intersection.** If the pointer is over nothing, the region with
//!    the largest overlap with the dragged rect. Ties go to the smaller
//!    region.
//!
//! A column won in tier 2 or 3 that has members is refined to the closest
//! card region among its members. If no such card region exists, the column
//! itself is the result.
//!
//! All remaining ties fall to registration order.
//!
//! # Invariants
//!
//! 1. The active id is never returned.
//! 2. An empty column is returned as-is.
//! 3. With no candidate at all, `last_over` is returned only while the
//!    session has just crossed into a new column.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;
use taskdeck_board::TaskId;
use taskdeck_core::geometry::{Point, Rect};
use taskdeck_core::logging::TARGET_DND;
use tracing::trace;

use crate::region::{DropId, DropRegions, DroppableRegion};

/// Geometry of the drag being resolved.
#[derive(Debug, Clone, Copy)]
pub struct CollisionInput<'a> {
    /// What is being dragged.
    pub active: &'a DropId,
    /// The dragged rect at its current position.
    pub dragged: Rect,
    /// Current pointer position.
    pub pointer: Point,
    /// Target resolved on a previous move, if any.
    pub last_over: Option<&'a DropId>,
    /// Set while the session has just crossed into a new column.
    pub recently_moved_to_new_container: bool,
}

/// Which rule produced a [`Collision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionTier {
    ContainerLocked,
    PointerWithin,
    RectIntersection,
    /// A column hit narrowed to its closest card.
    Refined,
    /// Nothing matched; the previous target was kept.
    LastOver,
}

/// A resolved drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub target: DropId,
    pub tier: CollisionTier,
}

/// Stateless collision resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionResolver;

impl CollisionResolver {
    /// Create a resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve the best target for `input` among `regions`.
    #[must_use]
    pub fn resolve(&self, regions: &DropRegions, input: &CollisionInput<'_>) -> Option<Collision> {
        let result = self.resolve_inner(regions, input);
        trace!(
            target: TARGET_DND,
            active = %input.active,
            pointer_x = input.pointer.x,
            pointer_y = input.pointer.y,
            target_id = ?result.as_ref().map(|c| &c.target),
            tier = ?result.as_ref().map(|c| c.tier),
            "collision resolved"
        );
        result
    }

    fn resolve_inner(&self, regions: &DropRegions, input: &CollisionInput<'_>) -> Option<Collision> {
        let candidates = move || regions.iter().filter(move |r| &r.id != input.active);

        if input.active.is_container() {
            return closest_center(candidates().filter(|r| r.is_container()), input.dragged)
                .map(|r| Collision {
                    target: r.id.clone(),
                    tier: CollisionTier::ContainerLocked,
                })
                .or_else(|| fallback(input));
        }

        let hit = pointer_within(candidates(), input.pointer)
            .map(|r| (r, CollisionTier::PointerWithin))
            .or_else(|| {
                rect_intersection(candidates(), input.dragged)
                    .map(|r| (r, CollisionTier::RectIntersection))
            });

        let Some((winner, tier)) = hit else {
            return fallback(input);
        };

        if winner.is_container() && !winner.members.is_empty() {
            let members: FxHashSet<&TaskId> = winner.members.iter().collect();
            let refined = closest_center(
                candidates().filter(|r| r.id.as_item().is_some_and(|id| members.contains(id))),
                input.dragged,
            );
            if let Some(item) = refined {
                return Some(Collision {
                    target: item.id.clone(),
                    tier: CollisionTier::Refined,
                });
            }
        }

        Some(Collision {
            target: winner.id.clone(),
            tier,
        })
    }
}

fn fallback(input: &CollisionInput<'_>) -> Option<Collision> {
    if !input.recently_moved_to_new_container {
        return None;
    }
    input
        .last_over
        .filter(|id| *id != input.active)
        .map(|id| Collision {
            target: id.clone(),
            tier: CollisionTier::LastOver,
        })
}

/// First minimum under `cmp`, so equal keys keep registration order.
fn first_min_by<'a, I, F>(iter: I, mut cmp: F) -> Option<&'a DroppableRegion>
where
    I: Iterator<Item = &'a DroppableRegion>,
    F: FnMut(&DroppableRegion, &DroppableRegion) -> Ordering,
{
    iter.fold(None, |best, r| match best {
        Some(b) if cmp(r, b) != Ordering::Less => Some(b),
        _ => Some(r),
    })
}

fn closest_center<'a>(
    regions: impl Iterator<Item = &'a DroppableRegion>,
    dragged: Rect,
) -> Option<&'a DroppableRegion> {
    first_min_by(regions, |a, b| {
        dragged
            .center_distance(&a.rect)
            .total_cmp(&dragged.center_distance(&b.rect))
    })
}

fn pointer_within<'a>(
    regions: impl Iterator<Item = &'a DroppableRegion>,
    pointer: Point,
) -> Option<&'a DroppableRegion> {
    first_min_by(regions.filter(|r| r.rect.contains(pointer)), |a, b| {
        a.rect
            .corner_distance_sum(pointer)
            .total_cmp(&b.rect.corner_distance_sum(pointer))
    })
}

fn rect_intersection<'a>(
    regions: impl Iterator<Item = &'a DroppableRegion>,
    dragged: Rect,
) -> Option<&'a DroppableRegion> {
    first_min_by(
        regions.filter(|r| r.rect.overlap_area(&dragged) > 0),
        |a, b| {
            b.rect
                .overlap_area(&dragged)
                .cmp(&a.rect.overlap_area(&dragged))
                .then_with(|| a.rect.area().cmp(&b.rect.area()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_board::TaskStatus;

    /// Two columns side by side, cards stacked 40 high with 10 gaps.
    fn board() -> DropRegions {
        let mut regions = DropRegions::new();
        regions.register(DroppableRegion::container(
            TaskStatus::Todo,
            Rect::new(0, 0, 100, 400),
            vec!["a".into(), "b".into(), "c".into()],
        ));
        regions.register(DroppableRegion::container(
            TaskStatus::Done,
            Rect::new(120, 0, 100, 400),
            Vec::new(),
        ));
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            regions.register(DroppableRegion::item(
                *id,
                TaskStatus::Todo,
                Rect::new(5, 10 + 50 * i as i32, 90, 40),
            ));
        }
        regions
    }

    fn input<'a>(active: &'a DropId, pointer: (i32, i32)) -> CollisionInput<'a> {
        CollisionInput {
            active,
            dragged: Rect::new(pointer.0 - 45, pointer.1 - 20, 90, 40),
            pointer: pointer.into(),
            last_over: None,
            recently_moved_to_new_container: false,
        }
    }

    #[test]
    fn pointer_over_card_beats_column() {
        let active = DropId::Item("a".into());
        let hit = CollisionResolver.resolve(&board(), &input(&active, (50, 130))).unwrap();
        assert_eq!(hit.target, DropId::Item("c".into()));
        assert_eq!(hit.tier, CollisionTier::PointerWithin);
    }

    #[test]
    fn column_gap_is_refined_to_closest_card() {
        let active = DropId::Item("a".into());
        // Between b (60..100) and c (110..150), nearer c.
        let hit = CollisionResolver.resolve(&board(), &input(&active, (50, 106))).unwrap();
        assert_eq!(hit.target, DropId::Item("c".into()));
        assert_eq!(hit.tier, CollisionTier::Refined);
    }

    #[test]
    fn empty_column_is_returned_unrefined() {
        let active = DropId::Item("a".into());
        let hit = CollisionResolver.resolve(&board(), &input(&active, (170, 200))).unwrap();
        assert_eq!(hit.target, DropId::Container(TaskStatus::Done));
        assert_eq!(hit.tier, CollisionTier::PointerWithin);
    }

    #[test]
    fn active_card_is_never_the_target() {
        let active = DropId::Item("b".into());
        let hit = CollisionResolver.resolve(&board(), &input(&active, (50, 80))).unwrap();
        assert_ne!(hit.target, active);
    }

    #[test]
    fn column_whose_only_member_is_active_falls_back_to_column() {
        let mut regions = DropRegions::new();
        regions.register(DroppableRegion::container(
            TaskStatus::Todo,
            Rect::new(0, 0, 100, 400),
            vec!["a".into()],
        ));
        regions.register(DroppableRegion::item("a", TaskStatus::Todo, Rect::new(5, 10, 90, 40)));
        let active = DropId::Item("a".into());
        let hit = CollisionResolver.resolve(&regions, &input(&active, (50, 300))).unwrap();
        assert_eq!(hit.target, DropId::Container(TaskStatus::Todo));
    }

    #[test]
    fn intersection_used_when_pointer_outside_everything() {
        let active = DropId::Item("a".into());
        // Pointer in the gutter between columns; rect overlaps Done more.
        let mut query = input(&active, (110, 300));
        query.dragged = Rect::new(95, 280, 90, 40);
        let hit = CollisionResolver.resolve(&board(), &query).unwrap();
        assert_eq!(hit.target, DropId::Container(TaskStatus::Done));
        assert_eq!(hit.tier, CollisionTier::RectIntersection);
    }

    #[test]
    fn intersection_tie_prefers_smaller_region() {
        let mut regions = DropRegions::new();
        regions.register(DroppableRegion::container(
            TaskStatus::Todo,
            Rect::new(0, 0, 100, 100),
            Vec::new(),
        ));
        regions.register(DroppableRegion::container(
            TaskStatus::Done,
            Rect::new(0, 100, 10, 10),
            Vec::new(),
        ));
        let active = DropId::Item("z".into());
        let query = CollisionInput {
            active: &active,
            dragged: Rect::new(0, 95, 10, 10),
            pointer: Point::new(500, 500),
            last_over: None,
            recently_moved_to_new_container: false,
        };
        let hit = CollisionResolver.resolve(&regions, &query).unwrap();
        assert_eq!(hit.target, DropId::Container(TaskStatus::Done));
    }

    #[test]
    fn container_drag_only_matches_containers() {
        let active = DropId::Container(TaskStatus::Todo);
        let mut query = input(&active, (50, 60));
        query.dragged = Rect::new(100, 0, 100, 400);
        let hit = CollisionResolver.resolve(&board(), &query).unwrap();
        assert_eq!(hit.target, DropId::Container(TaskStatus::Done));
        assert_eq!(hit.tier, CollisionTier::ContainerLocked);
    }

    #[test]
    fn last_over_kept_only_after_container_change() {
        let active = DropId::Item("a".into());
        let last = DropId::Container(TaskStatus::Done);
        let mut query = input(&active, (1000, 1000));
        query.last_over = Some(&last);
        assert!(CollisionResolver.resolve(&board(), &query).is_none());

        query.recently_moved_to_new_container = true;
        let hit = CollisionResolver.resolve(&board(), &query).unwrap();
        assert_eq!(hit.target, last);
        assert_eq!(hit.tier, CollisionTier::LastOver);
    }

    #[test]
    fn equal_candidates_resolve_by_registration_order() {
        let mut regions = DropRegions::new();
        regions.register(DroppableRegion::item("first", TaskStatus::Todo, Rect::new(0, 0, 10, 10)));
        regions.register(DroppableRegion::item("second", TaskStatus::Todo, Rect::new(0, 0, 10, 10)));
        let active = DropId::Item("x".into());
        let hit = CollisionResolver.resolve(&regions, &input(&active, (5, 5))).unwrap();
        assert_eq!(hit.target, DropId::Item("first".into()));
    }
}
