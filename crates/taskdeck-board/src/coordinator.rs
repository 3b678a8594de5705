#![forbid(unsafe_code)]

//! Optimistic mutation coordinator.
//!
//! A drop is applied to the board immediately ([`MutationCoordinator::stage`])
//! and reconciled with the persistence service afterwards
//! ([`MutationCoordinator::settle`]). Only status is persisted; a reorder
//! within one column never leaves the client.
//!
//! # Overlapping mutations
//!
//! Each remote mutation takes a per-item generation number. The newest intent
//! wins:
//!
//! - A response for a superseded generation changes nothing visible. A
//!   superseded success still updates the item's confirmed baseline, so a
//!   later failure rolls back to what the server last accepted.
//! - A failure for the current generation restores the full index snapshot
//!   when nothing else changed since staging. Otherwise only the affected item
//!   is moved back to its baseline position (clamped) and its fields are
//!   restored, leaving later unrelated moves intact.
//!
//! Edits, deletes, and reloads supersede any outstanding status mutation.
//! Once the newest mutation for an item settles its generation is retired, so
//! bookkeeping only covers items that still have a request outstanding.

use std::rc::Rc;

use taskdeck_core::logging::TARGET_PERSIST;
use tracing::{Instrument, debug, info_span, warn};

use crate::error::{BoardError, Operation};
use crate::index::IndexSnapshot;
use crate::model::{Task, TaskId, TaskStatus};
use crate::persistence::TaskPersistence;
use crate::state::{Baseline, BoardHandle, BoardState};

/// A requested move, built by the drag controller on release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationIntent {
    pub item_id: TaskId,
    pub from_container: TaskStatus,
    pub to_container: TaskStatus,
    pub from_index: usize,
    pub to_index: usize,
}

impl MutationIntent {
    /// Dropping the item where it already is.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from_container == self.to_container && self.from_index == self.to_index
    }

    /// Whether the item changes column (and therefore status).
    #[must_use]
    pub fn is_cross_container(&self) -> bool {
        self.from_container != self.to_container
    }
}

/// What a settled mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Dropped at its own position; nothing changed.
    Unchanged,
    /// Same-column reorder, kept locally.
    Reordered,
    /// Status change confirmed; the server's copy was adopted.
    Persisted(Task),
    /// The remote call failed and the change was reverted.
    RolledBack(BoardError),
    /// A newer mutation of the same item took over before this one settled.
    Superseded,
}

impl MutationOutcome {
    /// Whether the board now reflects the requested change.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Reordered | Self::Persisted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StagedKind {
    Noop,
    Local,
    Remote {
        generation: u64,
        snapshot: IndexSnapshot,
        revision: u64,
        owns_baseline: bool,
    },
}

/// A mutation applied locally and not yet settled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a staged mutation must be settled"]
pub struct StagedMutation {
    intent: MutationIntent,
    kind: StagedKind,
}

impl StagedMutation {
    /// The intent that was staged.
    #[must_use]
    pub fn intent(&self) -> &MutationIntent {
        &self.intent
    }

    /// Whether settling will call the persistence service.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.kind, StagedKind::Remote { .. })
    }

    /// Whether the staged change altered the board.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.kind == StagedKind::Noop
    }
}

/// Applies intents optimistically and reconciles them with persistence.
#[derive(Debug)]
pub struct MutationCoordinator<P> {
    board: BoardHandle,
    persistence: Rc<P>,
}

impl<P> Clone for MutationCoordinator<P> {
    fn clone(&self) -> Self {
        Self {
            board: self.board.clone(),
            persistence: Rc::clone(&self.persistence),
        }
    }
}

impl<P: TaskPersistence> MutationCoordinator<P> {
    /// Coordinate mutations of `board` against `persistence`.
    #[must_use]
    pub fn new(board: BoardHandle, persistence: Rc<P>) -> Self {
        Self { board, persistence }
    }

    /// The board this coordinator mutates.
    #[must_use]
    pub fn board(&self) -> &BoardHandle {
        &self.board
    }

    /// The persistence service.
    #[must_use]
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Stage then settle.
    pub async fn apply(&self, intent: MutationIntent) -> Result<MutationOutcome, BoardError> {
        let staged = self.stage(intent)?;
        Ok(self.settle(staged).await)
    }

    /// Apply `intent` to the index and task collection immediately.
    ///
    /// Fails without touching the board when the item is unknown or is no
    /// longer at `(from_container, from_index)`.
    pub fn stage(&self, intent: MutationIntent) -> Result<StagedMutation, BoardError> {
        self.board.update(|state| {
            let id = &intent.item_id;
            if state.task(id).is_none() {
                return Err(BoardError::UnknownTask(id.clone()));
            }
            let actual = state
                .index()
                .locate(id)
                .ok_or_else(|| BoardError::UnknownTask(id.clone()))?;
            let expected = (intent.from_container, intent.from_index);
            if actual != expected {
                return Err(BoardError::StaleIntent {
                    item: id.clone(),
                    expected,
                    actual,
                });
            }
            if intent.is_noop() {
                debug!(target: TARGET_PERSIST, item = %id, "drop at own position");
                return Ok(StagedMutation {
                    intent,
                    kind: StagedKind::Noop,
                });
            }

            let snapshot = state.index().snapshot();
            let prior = state.task(id).cloned();
            state.index_mut().move_item(
                id,
                intent.from_container,
                intent.to_container,
                intent.to_index,
            )?;

            if !intent.is_cross_container() {
                state.bump_revision();
                debug!(
                    target: TARGET_PERSIST,
                    item = %id,
                    container = %intent.to_container,
                    to_index = intent.to_index,
                    "local reorder"
                );
                return Ok(StagedMutation {
                    intent,
                    kind: StagedKind::Local,
                });
            }

            if let Some(task) = state.task_mut(id) {
                task.status = intent.to_container;
            }
            let revision = state.bump_revision();
            let generation = state.next_generation(id);
            let owns_baseline = match (state.is_pending(id), prior) {
                (false, Some(task)) => {
                    state.in_flight_mut().insert(
                        id.clone(),
                        Baseline {
                            task,
                            container: intent.from_container,
                            index: intent.from_index,
                        },
                    );
                    true
                }
                _ => false,
            };
            debug!(
                target: TARGET_PERSIST,
                item = %id,
                from = %intent.from_container,
                to = %intent.to_container,
                generation,
                "staged status change"
            );
            Ok(StagedMutation {
                intent,
                kind: StagedKind::Remote {
                    generation,
                    snapshot,
                    revision,
                    owns_baseline,
                },
            })
        })
    }

    /// Reconcile a staged mutation with the persistence service.
    pub async fn settle(&self, staged: StagedMutation) -> MutationOutcome {
        let StagedMutation { intent, kind } = staged;
        let (generation, snapshot, revision, owns_baseline) = match kind {
            StagedKind::Noop => return MutationOutcome::Unchanged,
            StagedKind::Local => {
                self.board.update(|state| state.clear_error());
                return MutationOutcome::Reordered;
            }
            StagedKind::Remote {
                generation,
                snapshot,
                revision,
                owns_baseline,
            } => (generation, snapshot, revision, owns_baseline),
        };

        let span = info_span!(
            target: TARGET_PERSIST,
            "update_task_status",
            item = %intent.item_id,
            status = %intent.to_container,
            generation
        );
        let result = self
            .persistence
            .update_task_status(&intent.item_id, intent.to_container)
            .instrument(span.clone())
            .await;
        let _guard = span.enter();

        self.board.update(|state| {
            let id = &intent.item_id;
            let current = state.generation(id) == generation;
            match result {
                Ok(task) if current => {
                    state.retire(id);
                    if let Err(e) = state.adopt(task.clone()) {
                        warn!(target: TARGET_PERSIST, item = %id, error = %e, "could not adopt server task");
                    }
                    state.clear_error();
                    debug!(target: TARGET_PERSIST, item = %id, "status change persisted");
                    MutationOutcome::Persisted(task)
                }
                Ok(task) => {
                    if let Some(baseline) = state.in_flight_mut().get_mut(id) {
                        *baseline = Baseline {
                            task,
                            container: intent.to_container,
                            index: intent.to_index,
                        };
                    }
                    debug!(target: TARGET_PERSIST, item = %id, "superseded success");
                    MutationOutcome::Superseded
                }
                Err(source) if current => {
                    let error = BoardError::persistence(Operation::UpdateTaskStatus, source);
                    let baseline = state.retire(id);
                    if state.revision() == revision && owns_baseline {
                        state.index_mut().restore(snapshot);
                        if let Some(baseline) = baseline
                            && let Some(task) = state.task_mut(id)
                        {
                            *task = baseline.task;
                        }
                    } else if let Some(baseline) = baseline {
                        compensate(state, id, baseline);
                    }
                    state.bump_revision();
                    warn!(target: TARGET_PERSIST, item = %id, error = %error, "rolled back status change");
                    state.set_error(error.clone());
                    MutationOutcome::RolledBack(error)
                }
                Err(source) => {
                    debug!(target: TARGET_PERSIST, item = %id, error = %source, "superseded failure ignored");
                    MutationOutcome::Superseded
                }
            }
        })
    }
}

/// Move only `id` back to its baseline and restore its fields.
fn compensate(state: &mut BoardState, id: &TaskId, baseline: Baseline) {
    if let Some((container, _)) = state.index().locate(id)
        && let Err(e) = state
            .index_mut()
            .move_item(id, container, baseline.container, baseline.index)
    {
        warn!(target: TARGET_PERSIST, item = %id, error = %e, "compensating move failed");
    }
    if let Some(task) = state.task_mut(id) {
        *task = baseline.task;
    }
}
