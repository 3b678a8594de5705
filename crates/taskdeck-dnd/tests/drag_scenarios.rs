//! End-to-end drag scenarios: pointer events in, board state out.
//!
//! Layout used throughout: columns are 100 wide at `x = 120 * column`,
//! 400 tall; cards are 90x40 at `y = 10 + 50 * position`, inset 5.

use std::rc::Rc;

use futures::executor::block_on;
use taskdeck_board::{
    BoardHandle, MemoryPersistence, MutationCoordinator, MutationOutcome, PersistenceCall,
    PersistenceError, Task, TaskId, TaskStatus,
};
use taskdeck_core::config::DragConfig;
use taskdeck_core::event::{PointerEvent, PointerId};
use taskdeck_core::geometry::Rect;
use taskdeck_dnd::{
    DragController, DragError, DragNotification, DragPhase, DropId, DropOutcome, DropRegions,
    DroppableRegion, FeedbackKind, RecordingFeedback, RecordingObserver,
};
use time::OffsetDateTime;

struct Fixture {
    controller: DragController<MemoryPersistence>,
    feedback: Rc<RecordingFeedback>,
    observer: Rc<RecordingObserver>,
}

fn column_x(status: TaskStatus) -> i32 {
    120 * status.index() as i32
}

/// Center of the card at `position` in `status`.
fn card_center(status: TaskStatus, position: usize) -> (i32, i32) {
    (column_x(status) + 50, 10 + 50 * position as i32 + 20)
}

fn layout(board: &BoardHandle) -> DropRegions {
    let mut regions = DropRegions::new();
    for status in TaskStatus::ALL {
        let x = column_x(status);
        let members = board.members(status);
        regions.register(DroppableRegion::container(
            status,
            Rect::new(x, 0, 100, 400),
            members.clone(),
        ));
        for (i, id) in members.into_iter().enumerate() {
            regions.register(DroppableRegion::item(
                id,
                status,
                Rect::new(x + 5, 10 + 50 * i as i32, 90, 40),
            ));
        }
    }
    regions
}

fn fixture_with(columns: &[(TaskStatus, &[&str])], config: DragConfig) -> Fixture {
    let tasks: Vec<Task> = columns
        .iter()
        .flat_map(|(status, ids)| {
            ids.iter().map(move |id| {
                Task::new(*id, id.to_uppercase(), *status, OffsetDateTime::UNIX_EPOCH)
            })
        })
        .collect();
    let board = BoardHandle::from_tasks(tasks.clone()).unwrap();
    let coordinator =
        MutationCoordinator::new(board.clone(), Rc::new(MemoryPersistence::with_tasks(tasks)));
    let feedback = Rc::new(RecordingFeedback::default());
    let observer = Rc::new(RecordingObserver::default());
    let mut controller = DragController::new(config, coordinator)
        .with_feedback(feedback.clone())
        .with_observer(observer.clone());
    controller.set_regions(layout(&board));
    Fixture {
        controller,
        feedback,
        observer,
    }
}

fn fixture(columns: &[(TaskStatus, &[&str])]) -> Fixture {
    fixture_with(columns, DragConfig::default())
}

impl Fixture {
    fn board(&self) -> &BoardHandle {
        self.controller.coordinator().board()
    }

    fn column(&self, status: TaskStatus) -> Vec<String> {
        self.board()
            .members(status)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn status_of(&self, id: &str) -> TaskStatus {
        self.board().task(&id.into()).unwrap().status
    }

    /// Press at `from`, move through `path`, release at the last point.
    fn drag(&mut self, from: (i32, i32), path: &[(i32, i32)]) -> Option<DropOutcome> {
        assert!(self.controller.handle(&PointerEvent::down(from.0, from.1)).is_none());
        for &(x, y) in path {
            assert!(self.controller.handle(&PointerEvent::moved(x, y)).is_none());
        }
        let end = path.last().copied().unwrap_or(from);
        self.controller.handle(&PointerEvent::up(end.0, end.1))
    }

    fn settle(&self, outcome: Option<DropOutcome>) -> MutationOutcome {
        match outcome {
            Some(DropOutcome::Staged(staged)) => block_on(self.controller.settle(staged)),
            other => panic!("expected a staged drop, got {other:?}"),
        }
    }
}

#[test]
fn cross_container_drop_on_column_appends_and_persists() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a", "b"])]);
    let done = (column_x(TaskStatus::Done) + 50, 300);
    let outcome = f.drag(card_center(TaskStatus::Todo, 0), &[(60, 40), done]);
    let settled = f.settle(outcome);

    assert!(matches!(settled, MutationOutcome::Persisted(_)));
    assert_eq!(f.column(TaskStatus::Todo), ["b"]);
    assert_eq!(f.column(TaskStatus::Done), ["a"]);
    assert_eq!(f.status_of("a"), TaskStatus::Done);
    assert_eq!(
        f.controller.coordinator().persistence().calls(),
        [PersistenceCall::UpdateStatus("a".into(), TaskStatus::Done)]
    );
    assert_eq!(
        f.feedback.recorded(),
        [FeedbackKind::Start, FeedbackKind::HoverChange, FeedbackKind::Success]
    );
    assert_eq!(
        f.observer.recorded(),
        [
            DragNotification::Start(DropId::Item("a".into())),
            DragNotification::HoverContainer(TaskStatus::Done),
            DragNotification::End {
                applied: true,
                error: None,
            },
            DragNotification::Settled {
                applied: true,
                error: None,
            },
        ]
    );
    assert_eq!(f.controller.phase(), DragPhase::Idle);
}

#[test]
fn failed_persistence_rolls_back_to_original_columns() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a", "b"])]);
    f.controller
        .coordinator()
        .persistence()
        .fail_next(PersistenceError::Unavailable("offline".into()));
    let done = (column_x(TaskStatus::Done) + 50, 300);
    let outcome = f.drag(card_center(TaskStatus::Todo, 0), &[done]);

    // Optimistic state is visible before settling.
    assert_eq!(f.column(TaskStatus::Done), ["a"]);

    let settled = f.settle(outcome);
    assert!(matches!(settled, MutationOutcome::RolledBack(_)));
    assert_eq!(f.column(TaskStatus::Todo), ["a", "b"]);
    assert!(f.column(TaskStatus::Done).is_empty());
    assert_eq!(f.status_of("a"), TaskStatus::Todo);
    assert!(f.board().retained_error().is_some());
    assert_eq!(f.feedback.recorded().last(), Some(&FeedbackKind::Error));
    assert!(matches!(
        f.observer.recorded().last(),
        Some(DragNotification::Settled {
            applied: false,
            error: Some(DragError::Persistence(_)),
        })
    ));
}

#[test]
fn dropping_last_card_on_first_reorders_column() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a", "b", "c"])]);
    let outcome = f.drag(
        card_center(TaskStatus::Todo, 2),
        &[(50, 100), card_center(TaskStatus::Todo, 0)],
    );
    let settled = f.settle(outcome);

    assert_eq!(settled, MutationOutcome::Reordered);
    assert_eq!(f.column(TaskStatus::Todo), ["c", "a", "b"]);
    assert!(f.controller.coordinator().persistence().calls().is_empty());
    assert!(!f.feedback.recorded().contains(&FeedbackKind::HoverChange));
}

#[test]
fn dropping_card_onto_later_sibling_takes_its_index() {
    let mut f = fixture(&[(TaskStatus::Todo, &["x", "y", "z"])]);
    let outcome = f.drag(
        card_center(TaskStatus::Todo, 0),
        &[card_center(TaskStatus::Todo, 1)],
    );
    f.settle(outcome);
    assert_eq!(f.column(TaskStatus::Todo), ["y", "x", "z"]);
}

#[test]
fn dropping_onto_card_in_other_column_inserts_before_it() {
    let mut f = fixture(&[
        (TaskStatus::Todo, &["a"]),
        (TaskStatus::InProgress, &["p", "q"]),
    ]);
    let outcome = f.drag(
        card_center(TaskStatus::Todo, 0),
        &[card_center(TaskStatus::InProgress, 1)],
    );
    f.settle(outcome);
    assert_eq!(f.column(TaskStatus::InProgress), ["p", "a", "q"]);
    assert_eq!(f.status_of("a"), TaskStatus::InProgress);
}

#[test]
fn drop_in_place_is_a_noop() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a"])]);
    let before = f.board().index();
    let outcome = f.drag(card_center(TaskStatus::Todo, 0), &[(50, 200), (50, 300)]);

    assert_eq!(outcome, Some(DropOutcome::Unchanged));
    assert_eq!(f.board().index(), before);
    assert_eq!(f.feedback.recorded(), [FeedbackKind::Start, FeedbackKind::Noop]);
    assert!(f.controller.coordinator().persistence().calls().is_empty());
    assert_eq!(
        f.observer.recorded().last(),
        Some(&DragNotification::End {
            applied: false,
            error: None,
        })
    );
}

#[test]
fn release_over_nothing_reports_resolution_failure() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a"])]);
    let before = f.board().index();
    let outcome = f.drag(card_center(TaskStatus::Todo, 0), &[(2000, 2000)]);

    assert_eq!(outcome, Some(DropOutcome::NoTarget));
    assert_eq!(f.board().index(), before);
    assert_eq!(f.feedback.recorded().last(), Some(&FeedbackKind::Error));
    assert_eq!(
        f.observer.recorded().last(),
        Some(&DragNotification::End {
            applied: false,
            error: Some(DragError::ResolutionFailure),
        })
    );
    assert_eq!(f.controller.phase(), DragPhase::Idle);
}

#[test]
fn last_target_is_kept_right_after_crossing_columns() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a"])]);
    let done = (column_x(TaskStatus::Done) + 50, 300);
    f.controller.handle(&PointerEvent::down(50, 30));
    f.controller.handle(&PointerEvent::moved(done.0, done.1));
    let session = f.controller.session().unwrap();
    assert!(session.recently_moved_to_new_container());
    assert_eq!(session.last_over(), Some(&DropId::Container(TaskStatus::Done)));

    // Released off-board in the same frame: the last target still counts.
    let outcome = f.controller.handle(&PointerEvent::up(2000, 2000));
    assert!(matches!(outcome, Some(DropOutcome::Staged(_))));
    assert_eq!(f.column(TaskStatus::Done), ["a"]);
}

#[test]
fn frame_boundary_clears_recently_moved() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a"])]);
    let done = (column_x(TaskStatus::Done) + 50, 300);
    f.controller.handle(&PointerEvent::down(50, 30));
    f.controller.handle(&PointerEvent::moved(done.0, done.1));
    f.controller.frame_boundary();
    assert!(!f.controller.session().unwrap().recently_moved_to_new_container());

    let outcome = f.controller.handle(&PointerEvent::up(2000, 2000));
    assert_eq!(outcome, Some(DropOutcome::NoTarget));
    assert_eq!(f.column(TaskStatus::Todo), ["a"]);
}

#[test]
fn cancel_discards_session_without_mutation() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a", "b"])]);
    let before = f.board().index();
    let rev = f.board().revision();
    f.controller.handle(&PointerEvent::down(50, 30));
    f.controller
        .handle(&PointerEvent::moved(column_x(TaskStatus::Done) + 50, 300));
    assert!(f.controller.is_dragging());

    assert!(f.controller.handle(&PointerEvent::cancel()).is_none());
    assert_eq!(f.controller.phase(), DragPhase::Idle);
    assert_eq!(f.board().index(), before);
    assert_eq!(f.board().revision(), rev);
    assert_eq!(f.observer.recorded().last(), Some(&DragNotification::Cancel));
    assert!(!f.feedback.recorded().contains(&FeedbackKind::Success));
}

#[test]
fn activation_requires_strictly_exceeding_distance() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a"])]);
    f.controller.handle(&PointerEvent::down(50, 30));
    assert_eq!(f.controller.phase(), DragPhase::Pending);

    f.controller.handle(&PointerEvent::moved(53, 30));
    assert_eq!(f.controller.phase(), DragPhase::Pending);
    assert!(f.observer.recorded().is_empty());

    f.controller.handle(&PointerEvent::moved(53, 31));
    assert_eq!(f.controller.phase(), DragPhase::Active);
    assert_eq!(
        f.observer.recorded(),
        [DragNotification::Start(DropId::Item("a".into()))]
    );
}

#[test]
fn release_before_activation_is_a_click() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a"])]);
    f.controller.handle(&PointerEvent::down(50, 30));
    f.controller.handle(&PointerEvent::moved(51, 31));
    assert!(f.controller.handle(&PointerEvent::up(51, 31)).is_none());
    assert_eq!(f.controller.phase(), DragPhase::Idle);
    assert!(f.observer.recorded().is_empty());
    assert!(f.feedback.recorded().is_empty());
}

#[test]
fn configured_activation_distance_is_respected() {
    let mut f = fixture_with(
        &[(TaskStatus::Todo, &["a"])],
        DragConfig::default().with_activation_distance(10.0),
    );
    f.controller.handle(&PointerEvent::down(50, 30));
    f.controller.handle(&PointerEvent::moved(56, 30));
    assert_eq!(f.controller.phase(), DragPhase::Pending);
    f.controller.handle(&PointerEvent::moved(61, 30));
    assert_eq!(f.controller.phase(), DragPhase::Active);
}

#[test]
fn second_pointer_is_ignored_during_drag() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a", "b"])]);
    let other = PointerId(7);
    f.controller.handle(&PointerEvent::down(50, 30));
    f.controller.handle(&PointerEvent::moved(50, 40));
    assert!(f.controller.is_dragging());

    f.controller
        .handle(&PointerEvent::down(50, 80).with_pointer(other));
    f.controller
        .handle(&PointerEvent::moved(700, 300).with_pointer(other));
    assert!(
        f.controller
            .handle(&PointerEvent::up(700, 300).with_pointer(other))
            .is_none()
    );
    assert!(f.controller.is_dragging());
    assert_eq!(
        f.controller.session().unwrap().active_id(),
        &DropId::Item("a".into())
    );
    assert_eq!(f.controller.session().unwrap().over_container(), TaskStatus::Todo);
}

#[test]
fn press_on_empty_column_needs_container_drag_enabled() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a"])]);
    f.controller.handle(&PointerEvent::down(50, 300));
    assert_eq!(f.controller.phase(), DragPhase::Idle);

    let mut f = fixture_with(
        &[(TaskStatus::Todo, &["a"])],
        DragConfig::default().with_container_drag(),
    );
    let outcome = f.drag((50, 300), &[(120, 300), (170, 300)]);
    assert_eq!(outcome, Some(DropOutcome::Unchanged));
    assert_eq!(
        f.observer.recorded().first(),
        Some(&DragNotification::Start(DropId::Container(TaskStatus::Todo)))
    );
    assert_eq!(f.column(TaskStatus::Todo), ["a"]);
}

#[test]
fn dragged_rect_follows_pointer() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a"])]);
    f.controller.handle(&PointerEvent::down(50, 30));
    f.controller.handle(&PointerEvent::moved(70, 60));
    let session = f.controller.session().unwrap();
    assert_eq!(session.dragged_rect(), Rect::new(25, 40, 90, 40));
    assert_eq!(session.origin_container(), TaskStatus::Todo);
}

#[test]
fn card_removed_mid_drag_reports_no_target() {
    let mut f = fixture(&[(TaskStatus::Todo, &["a", "b"])]);
    f.controller.handle(&PointerEvent::down(50, 30));
    f.controller
        .handle(&PointerEvent::moved(column_x(TaskStatus::Done) + 50, 300));

    let service = taskdeck_board::BoardService::with_board(
        f.board().clone(),
        Rc::new(MemoryPersistence::with_tasks([Task::new(
            "a",
            "A",
            TaskStatus::Todo,
            OffsetDateTime::UNIX_EPOCH,
        )])),
    );
    block_on(service.delete(&TaskId::from("a"))).unwrap();

    let outcome = f
        .controller
        .handle(&PointerEvent::up(column_x(TaskStatus::Done) + 50, 300));
    assert_eq!(outcome, Some(DropOutcome::NoTarget));
    assert_eq!(f.column(TaskStatus::Todo), ["b"]);
    assert!(f.column(TaskStatus::Done).is_empty());
}
