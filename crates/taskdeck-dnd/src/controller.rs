#![forbid(unsafe_code)]

//! Drag session controller.
//!
//! [`DragController`] turns pointer events into drag sessions and, on
//! release, into a staged board mutation.
//!
//! # State Machine
//!
//! ```text
//!            press on card            displacement > activation distance
//!   Idle ───────────────────▶ Pending ───────────────────────────────▶ Active
//!    ▲                          │ release / cancel                      │
//!    │                          ▼                                       │
//!    └──────────────────────── Idle ◀────────── release / cancel ──────┘
//! ```
//!
//! A pending press is part of `Idle` from the host's point of view: nothing
//! has been announced yet and releasing it is an ordinary click.
//!
//! # Invariants
//!
//! 1. At most one pointer drives the controller; events from other pointers
//!    are ignored until the session ends. Cancel is honored from any source.
//! 2. Moving never mutates the board. Only release stages a mutation.
//! 3. Every started drag ends with exactly one `on_drag_end` or
//!    `on_drag_cancel`.
//! 4. The controller is back in `Idle` after every release or cancel,
//!    whatever the outcome.

use std::rc::Rc;

use taskdeck_board::{
    BoardError, MutationCoordinator, MutationIntent, MutationOutcome, StagedMutation, TaskId,
    TaskPersistence, TaskStatus,
};
use taskdeck_core::config::DragConfig;
use taskdeck_core::event::{PointerEvent, PointerEventKind, PointerId};
use taskdeck_core::geometry::{Point, Rect};
use taskdeck_core::logging::TARGET_DND;
use tracing::{debug, trace, warn};
use web_time::{Duration, Instant};

use crate::collision::{Collision, CollisionInput, CollisionResolver};
use crate::feedback::{DragError, DragObserver, FeedbackSink, NoFeedback, NoObserver};
use crate::region::{DropId, DropRegions};

/// Coarse controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Pressed on a draggable, threshold not yet crossed.
    Pending,
    Active,
}

/// Result of releasing an active drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing under the pointer; no intent was built.
    NoTarget,
    /// Dropped where it started.
    Unchanged,
    /// Applied locally; pass to [`DragController::settle`] or a
    /// [`DropSettler`] to persist.
    Staged(StagedMutation),
    /// The board refused the intent.
    Rejected(BoardError),
}

#[derive(Debug, Clone)]
struct PendingPress {
    pointer_id: PointerId,
    origin: Point,
    active: DropId,
    rect: Rect,
}

/// An active drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    active_id: DropId,
    origin_container: TaskStatus,
    pointer_id: PointerId,
    press_point: Point,
    pointer: Point,
    origin_rect: Rect,
    last_over: Option<DropId>,
    over_container: TaskStatus,
    recently_moved_to_new_container: bool,
    started_at: Instant,
}

impl DragSession {
    /// What is being dragged.
    #[must_use]
    pub fn active_id(&self) -> &DropId {
        &self.active_id
    }

    /// Column the drag started in.
    #[must_use]
    pub fn origin_container(&self) -> TaskStatus {
        self.origin_container
    }

    /// Most recently resolved target.
    #[must_use]
    pub fn last_over(&self) -> Option<&DropId> {
        self.last_over.as_ref()
    }

    /// Column of the most recently resolved target.
    #[must_use]
    pub fn over_container(&self) -> TaskStatus {
        self.over_container
    }

    /// Set after crossing into a new column, until the next frame boundary.
    #[must_use]
    pub fn recently_moved_to_new_container(&self) -> bool {
        self.recently_moved_to_new_container
    }

    /// Current pointer position.
    #[must_use]
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// The dragged rect: the origin rect shifted by the pointer's travel.
    #[must_use]
    pub fn dragged_rect(&self) -> Rect {
        let (dx, dy) = self.pointer.delta_from(self.press_point);
        self.origin_rect.translate(dx, dy)
    }

    /// Time since activation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Pointer-driven drag state machine.
pub struct DragController<P> {
    config: DragConfig,
    coordinator: MutationCoordinator<P>,
    regions: DropRegions,
    resolver: CollisionResolver,
    feedback: Rc<dyn FeedbackSink>,
    observer: Rc<dyn DragObserver>,
    pending: Option<PendingPress>,
    session: Option<DragSession>,
}

impl<P> std::fmt::Debug for DragController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragController")
            .field("phase", &self.phase())
            .field("regions", &self.regions.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<P> DragController<P> {
    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        if self.session.is_some() {
            DragPhase::Active
        } else if self.pending.is_some() {
            DragPhase::Pending
        } else {
            DragPhase::Idle
        }
    }

    /// Whether a drag is active.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// The active session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Registered drop regions.
    #[must_use]
    pub fn regions(&self) -> &DropRegions {
        &self.regions
    }

    /// Mutable access for the host's layout pass.
    pub fn regions_mut(&mut self) -> &mut DropRegions {
        &mut self.regions
    }

    /// Replace all drop regions.
    pub fn set_regions(&mut self, regions: DropRegions) {
        self.regions = regions;
    }

    /// Gesture configuration.
    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    /// End of a render frame: clears the recently-moved flag.
    pub fn frame_boundary(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.recently_moved_to_new_container = false;
        }
    }

    /// Abort any press or drag without staging anything (focus loss,
    /// Escape, lost capture).
    pub fn cancel(&mut self) {
        self.pending = None;
        if let Some(session) = self.session.take() {
            debug!(
                target: TARGET_DND,
                active = %session.active_id,
                elapsed_ms = session.elapsed().as_millis() as u64,
                "drag cancelled"
            );
            self.observer.on_drag_cancel();
        }
    }
}

impl<P: TaskPersistence> DragController<P> {
    /// A controller with no feedback and no observer.
    #[must_use]
    pub fn new(config: DragConfig, coordinator: MutationCoordinator<P>) -> Self {
        Self {
            config,
            coordinator,
            regions: DropRegions::new(),
            resolver: CollisionResolver::new(),
            feedback: Rc::new(NoFeedback),
            observer: Rc::new(NoObserver),
            pending: None,
            session: None,
        }
    }

    /// Attach a feedback sink.
    #[must_use]
    pub fn with_feedback(mut self, feedback: Rc<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    /// Attach a lifecycle observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Rc<dyn DragObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The mutation coordinator drops are staged on.
    #[must_use]
    pub fn coordinator(&self) -> &MutationCoordinator<P> {
        &self.coordinator
    }

    /// Feed one pointer event. Returns an outcome only when an active drag
    /// is released.
    pub fn handle(&mut self, event: &PointerEvent) -> Option<DropOutcome> {
        match event.kind {
            PointerEventKind::Down => {
                self.on_press(event);
                None
            }
            PointerEventKind::Move => {
                self.on_move(event);
                None
            }
            PointerEventKind::Up => self.on_release(event),
            PointerEventKind::Cancel => {
                self.cancel();
                None
            }
        }
    }

    /// A settler sharing this controller's coordinator and sinks.
    #[must_use]
    pub fn settler(&self) -> DropSettler<P> {
        DropSettler {
            coordinator: self.coordinator.clone(),
            feedback: Rc::clone(&self.feedback),
            observer: Rc::clone(&self.observer),
        }
    }

    /// Persist a staged drop; see [`DropSettler::settle`].
    pub async fn settle(&self, staged: StagedMutation) -> MutationOutcome {
        self.settler().settle(staged).await
    }

    fn on_press(&mut self, event: &PointerEvent) {
        if self.pending.is_some() || self.session.is_some() {
            trace!(target: TARGET_DND, pointer = event.pointer_id.0, "press ignored: pointer busy");
            return;
        }
        let board = self.coordinator.board().clone();
        board.read(|state| self.regions.sync_members(state.index()));

        let Some(region) = self.regions.hit_test(event.position) else {
            return;
        };
        if region.is_container() && !self.config.allow_container_drag {
            return;
        }
        self.pending = Some(PendingPress {
            pointer_id: event.pointer_id,
            origin: event.position,
            active: region.id.clone(),
            rect: region.rect,
        });
    }

    fn on_move(&mut self, event: &PointerEvent) {
        if let Some(mut session) = self.session.take() {
            if session.pointer_id == event.pointer_id {
                session.pointer = event.position;
                self.track(&mut session);
            }
            self.session = Some(session);
            return;
        }

        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        if pending.pointer_id != event.pointer_id
            || pending.origin.distance(event.position) <= self.config.activation_distance
        {
            return;
        }
        if let Some(pending) = self.pending.take()
            && let Some(mut session) = self.activate(pending, event.position)
        {
            self.track(&mut session);
            self.session = Some(session);
        }
    }

    fn activate(&self, pending: PendingPress, pointer: Point) -> Option<DragSession> {
        let origin_container = match &pending.active {
            DropId::Item(id) => match self.coordinator.board().locate(id) {
                Some((container, _)) => container,
                None => {
                    warn!(target: TARGET_DND, item = %id, "press on a card that is no longer on the board");
                    return None;
                }
            },
            DropId::Container(status) => *status,
        };
        debug!(
            target: TARGET_DND,
            active = %pending.active,
            container = %origin_container,
            "drag started"
        );
        self.feedback.on_start();
        self.observer.on_drag_start(&pending.active);

        Some(DragSession {
            active_id: pending.active,
            origin_container,
            pointer_id: pending.pointer_id,
            press_point: pending.origin,
            pointer,
            origin_rect: pending.rect,
            last_over: None,
            over_container: origin_container,
            recently_moved_to_new_container: false,
            started_at: Instant::now(),
        })
    }

    /// Resolve the current target and emit hover notifications.
    fn track(&self, session: &mut DragSession) -> Option<Collision> {
        let collision = self.resolver.resolve(
            &self.regions,
            &CollisionInput {
                active: &session.active_id,
                dragged: session.dragged_rect(),
                pointer: session.pointer,
                last_over: session.last_over.as_ref(),
                recently_moved_to_new_container: session.recently_moved_to_new_container,
            },
        )?;

        if let Some(container) = self.container_of(&collision.target)
            && container != session.over_container
        {
            trace!(
                target: TARGET_DND,
                from = %session.over_container,
                to = %container,
                "hover container changed"
            );
            session.over_container = container;
            session.recently_moved_to_new_container = true;
            self.feedback.on_hover_change();
            self.observer.on_drag_hover_container_change(container);
        }
        session.last_over = Some(collision.target.clone());
        Some(collision)
    }

    fn container_of(&self, id: &DropId) -> Option<TaskStatus> {
        match id {
            DropId::Container(status) => Some(*status),
            DropId::Item(item) => self
                .coordinator
                .board()
                .locate(item)
                .map(|(container, _)| container)
                .or_else(|| self.regions.get(id).map(|r| r.container)),
        }
    }

    fn on_release(&mut self, event: &PointerEvent) -> Option<DropOutcome> {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.pointer_id == event.pointer_id)
        {
            self.pending = None;
            return None;
        }
        let mut session = self.session.take()?;
        if session.pointer_id != event.pointer_id {
            self.session = Some(session);
            return None;
        }
        session.pointer = event.position;
        let collision = self.track(&mut session);
        Some(self.finish(&session, collision))
    }

    fn finish(&self, session: &DragSession, collision: Option<Collision>) -> DropOutcome {
        let elapsed_ms = session.elapsed().as_millis() as u64;
        let Some(item) = session.active_id.as_item() else {
            // Columns have a fixed order; a column drag never mutates.
            debug!(target: TARGET_DND, active = %session.active_id, elapsed_ms, "column drag released");
            self.feedback.on_noop();
            self.observer.on_drag_end(false, None);
            return DropOutcome::Unchanged;
        };

        let Some(intent) = collision.and_then(|c| self.build_intent(item, &c.target)) else {
            debug!(target: TARGET_DND, item = %item, elapsed_ms, "drop without target");
            self.feedback.on_error();
            self.observer
                .on_drag_end(false, Some(&DragError::ResolutionFailure));
            return DropOutcome::NoTarget;
        };

        match self.coordinator.stage(intent) {
            Ok(staged) if staged.is_noop() => {
                debug!(target: TARGET_DND, item = %item, elapsed_ms, "dropped in place");
                self.feedback.on_noop();
                self.observer.on_drag_end(false, None);
                DropOutcome::Unchanged
            }
            Ok(staged) => {
                let intent = staged.intent();
                debug!(
                    target: TARGET_DND,
                    item = %item,
                    from = %intent.from_container,
                    to = %intent.to_container,
                    to_index = intent.to_index,
                    elapsed_ms,
                    "drop staged"
                );
                self.feedback.on_success();
                self.observer.on_drag_end(true, None);
                DropOutcome::Staged(staged)
            }
            Err(e) => {
                warn!(target: TARGET_DND, item = %item, error = %e, "drop rejected");
                self.feedback.on_error();
                self.observer
                    .on_drag_end(false, Some(&DragError::Rejected(e.clone())));
                DropOutcome::Rejected(e)
            }
        }
    }

    fn build_intent(&self, item: &TaskId, target: &DropId) -> Option<MutationIntent> {
        let board = self.coordinator.board();
        let (from_container, from_index) = board.locate(item)?;
        let (to_container, to_index) = match target {
            DropId::Item(over) => board.locate(over)?,
            DropId::Container(status) => {
                let len = board.read(|s| s.index().len(*status));
                if *status == from_container {
                    (*status, len.saturating_sub(1))
                } else {
                    (*status, len)
                }
            }
        };
        Some(MutationIntent {
            item_id: item.clone(),
            from_container,
            to_container,
            from_index,
            to_index,
        })
    }
}

/// Persists staged drops independently of the controller, so pointer events
/// can keep flowing while a request is outstanding.
pub struct DropSettler<P> {
    coordinator: MutationCoordinator<P>,
    feedback: Rc<dyn FeedbackSink>,
    observer: Rc<dyn DragObserver>,
}

impl<P> Clone for DropSettler<P> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            feedback: Rc::clone(&self.feedback),
            observer: Rc::clone(&self.observer),
        }
    }
}

impl<P: TaskPersistence> DropSettler<P> {
    /// Reconcile `staged` with persistence. A rollback triggers error
    /// feedback.
    pub async fn settle(self, staged: StagedMutation) -> MutationOutcome {
        let outcome = self.coordinator.settle(staged).await;
        match &outcome {
            MutationOutcome::RolledBack(e) => {
                self.feedback.on_error();
                self.observer
                    .on_drop_settled(false, Some(&DragError::Persistence(e.clone())));
            }
            other => self.observer.on_drop_settled(other.is_applied(), None),
        }
        outcome
    }
}
