#![forbid(unsafe_code)]

//! Drag-and-drop for the task board.
//!
//! # Role in TaskDeck
//! `taskdeck-dnd` is the interaction layer. The host registers
//! [`DroppableRegion`]s for columns and cards and feeds
//! [`PointerEvent`](taskdeck_core::PointerEvent)s into a [`DragController`].
//! The controller runs the [`CollisionResolver`] on every move and, on
//! release, stages a [`MutationIntent`](taskdeck_board::MutationIntent) on the
//! board's mutation coordinator.
//!
//! # Typical loop
//!
//! ```ignore
//! if let Some(DropOutcome::Staged(staged)) = controller.handle(&event) {
//!     let settler = controller.settler();
//!     spawner.spawn_local(async move {
//!         settler.settle(staged).await;
//!     })?;
//! }
//! // once per rendered frame
//! controller.frame_boundary();
//! ```

pub mod collision;
pub mod controller;
pub mod feedback;
pub mod region;

pub use collision::{Collision, CollisionInput, CollisionResolver, CollisionTier};
pub use controller::{DragController, DragPhase, DragSession, DropOutcome, DropSettler};
pub use feedback::{
    DragError, DragNotification, DragObserver, FeedbackKind, FeedbackSink, NoFeedback,
    NoObserver, RecordingFeedback, RecordingObserver,
};
pub use region::{DropId, DropRegions, DroppableRegion};
