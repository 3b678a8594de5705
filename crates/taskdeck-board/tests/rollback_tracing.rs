//! Rollbacks are reported on the `taskdeck.persist` target.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use futures::executor::block_on;
use taskdeck_board::{
    BoardHandle, MemoryPersistence, MutationCoordinator, MutationIntent, MutationOutcome,
    PersistenceError, Task, TaskStatus,
};
use time::OffsetDateTime;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Default)]
struct Captured {
    events: Vec<(String, String)>,
}

struct PersistCapture {
    state: Arc<Mutex<Captured>>,
}

impl<S: Subscriber> Layer<S> for PersistCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct MessageVisitor {
            message: Option<String>,
        }
        impl tracing::field::Visit for MessageVisitor {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_owned());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_owned());
                }
            }
        }
        let mut visitor = MessageVisitor { message: None };
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            self.state
                .lock()
                .expect("capture lock")
                .events
                .push((event.metadata().target().to_owned(), message));
        }
    }
}

#[test]
fn rollback_emits_warning_on_persist_target() {
    let state = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(PersistCapture {
        state: Arc::clone(&state),
    });

    let tasks = vec![Task::new("a", "A", TaskStatus::Todo, OffsetDateTime::UNIX_EPOCH)];
    let board = BoardHandle::from_tasks(tasks.clone()).unwrap();
    let persistence = Rc::new(MemoryPersistence::with_tasks(tasks));
    persistence.fail_next(PersistenceError::Rejected("read-only".into()));
    let coordinator = MutationCoordinator::new(board, persistence);

    let outcome = tracing::subscriber::with_default(subscriber, || {
        block_on(coordinator.apply(MutationIntent {
            item_id: "a".into(),
            from_container: TaskStatus::Todo,
            to_container: TaskStatus::Done,
            from_index: 0,
            to_index: 0,
        }))
        .unwrap()
    });
    assert!(matches!(outcome, MutationOutcome::RolledBack(_)));

    let captured = state.lock().expect("capture lock");
    assert!(
        captured
            .events
            .iter()
            .any(|(target, msg)| target == "taskdeck.persist" && msg == "rolled back status change")
    );
    assert!(
        captured
            .events
            .iter()
            .any(|(target, msg)| target == "taskdeck.board" && msg == "index move")
    );
}
