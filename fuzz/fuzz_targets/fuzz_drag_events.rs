#![no_main]

use arbitrary::Arbitrary;
use futures::executor::block_on;
use libfuzzer_sys::fuzz_target;
use taskdeck_board::{
    BoardHandle, MemoryPersistence, MutationCoordinator, PersistenceError, Task, TaskStatus,
};
use taskdeck_core::config::DragConfig;
use taskdeck_core::event::{PointerEvent, PointerId};
use taskdeck_core::geometry::Rect;
use taskdeck_dnd::{DragController, DragPhase, DropOutcome, DropRegions, DroppableRegion};
use time::OffsetDateTime;

#[derive(Debug, Arbitrary)]
enum Input {
    Down { x: i16, y: i16, pointer: u8 },
    Move { x: i16, y: i16, pointer: u8 },
    Up { x: i16, y: i16, pointer: u8, fail: bool },
    Cancel,
    Frame,
}

fn layout(board: &BoardHandle) -> DropRegions {
    let mut regions = DropRegions::new();
    for status in TaskStatus::ALL {
        let x = 120 * status.index() as i32;
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

fuzz_target!(|inputs: Vec<Input>| {
    let tasks: Vec<Task> = ["a", "b", "c", "d", "e", "f"]
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let status = TaskStatus::ALL[i % 3];
            Task::new(*id, id.to_uppercase(), status, OffsetDateTime::UNIX_EPOCH)
        })
        .collect();
    let total = tasks.len();
    let persistence = MemoryPersistence::with_tasks(tasks.clone());
    let Ok(board) = BoardHandle::from_tasks(tasks) else {
        return;
    };
    let coordinator = MutationCoordinator::new(board.clone(), std::rc::Rc::new(persistence));
    let mut controller = DragController::new(DragConfig::default(), coordinator);
    controller.set_regions(layout(&board));

    for input in inputs.into_iter().take(128) {
        let event = match input {
            Input::Down { x, y, pointer } => {
                PointerEvent::down(x.into(), y.into()).with_pointer(PointerId(u32::from(pointer % 2)))
            }
            Input::Move { x, y, pointer } => {
                PointerEvent::moved(x.into(), y.into()).with_pointer(PointerId(u32::from(pointer % 2)))
            }
            Input::Up { x, y, pointer, fail } => {
                if fail {
                    controller
                        .coordinator()
                        .persistence()
                        .fail_next(PersistenceError::Unavailable("fuzz".into()));
                }
                PointerEvent::up(x.into(), y.into()).with_pointer(PointerId(u32::from(pointer % 2)))
            }
            Input::Cancel => PointerEvent::cancel(),
            Input::Frame => {
                controller.frame_boundary();
                continue;
            }
        };
        let is_terminal = matches!(event.kind, taskdeck_core::event::PointerEventKind::Cancel);
        if let Some(outcome) = controller.handle(&event) {
            assert_eq!(controller.phase(), DragPhase::Idle);
            if let DropOutcome::Staged(staged) = outcome {
                let _ = block_on(controller.settle(staged));
            }
            controller.set_regions(layout(&board));
        }
        if is_terminal {
            assert_eq!(controller.phase(), DragPhase::Idle);
        }

        let index = board.index();
        assert_eq!(index.total_len(), total);
        for (status, column) in index.iter() {
            for id in column {
                let task = board.task(id);
                assert_eq!(task.map(|t| t.status), Some(status));
            }
        }
    }
});
