#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use taskdeck_board::{ContainerIndex, TaskId, TaskStatus};

#[derive(Debug, Arbitrary)]
enum Op {
    Move { item: u8, from: u8, to: u8, index: u8 },
    Insert { item: u8, column: u8, index: u8 },
    Remove { item: u8 },
    Snapshot,
    Restore,
}

fn status(n: u8) -> TaskStatus {
    TaskStatus::ALL[n as usize % TaskStatus::COUNT]
}

fn id(n: u8) -> TaskId {
    TaskId::new(format!("t{}", n % 16))
}

fuzz_target!(|ops: Vec<Op>| {
    let mut index = ContainerIndex::new();
    let mut saved = index.snapshot();

    for op in ops.into_iter().take(256) {
        let before = index.total_len();
        match op {
            Op::Move { item, from, to, index: at } => {
                let moved = index.move_item(&id(item), status(from), status(to), at as usize);
                assert_eq!(index.total_len(), before);
                if let Ok(landed) = moved {
                    assert_eq!(index.locate(&id(item)), Some((status(to), landed)));
                }
            }
            Op::Insert { item, column, index: at } => {
                let inserted = index.insert(id(item), status(column), at as usize);
                let expected = if inserted.is_ok() { before + 1 } else { before };
                assert_eq!(index.total_len(), expected);
            }
            Op::Remove { item } => {
                let removed = index.remove(&id(item));
                let expected = if removed.is_ok() { before - 1 } else { before };
                assert_eq!(index.total_len(), expected);
                assert!(!index.contains(&id(item)));
            }
            Op::Snapshot => saved = index.snapshot(),
            Op::Restore => index.restore(saved.clone()),
        }

        // Every id lives in exactly one column.
        let mut seen = std::collections::HashSet::new();
        for (_, column) in index.iter() {
            for item in column {
                assert!(seen.insert(item.clone()), "duplicate id {item}");
            }
        }
        assert_eq!(seen.len(), index.total_len());
    }
});
