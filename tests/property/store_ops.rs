//! Property-based tests for the store's task-sequence operations.
//!
//! Uses proptest to verify, over arbitrary operation sequences drawn
//! from a small id space (so collisions are common):
//! 1. Task ids in the snapshot are always unique.
//! 2. The snapshot matches a simple sequential model of the operations.
//! 3. Subscribers get exactly one notification per effective mutation;
//!    no-ops (duplicate insert, absent remove/replace) notify nobody.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use taskdeck::store::Store;
use taskdeck_api::{Task, TaskId, TaskStatus};

/// One store operation over a deliberately tiny id space.
#[derive(Debug, Clone)]
enum Op {
    InsertFront(u8),
    Remove(u8),
    Replace(u8),
    SetTasks(Vec<u8>),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::InsertFront),
        (0u8..6).prop_map(Op::Remove),
        (0u8..6).prop_map(Op::Replace),
        prop::collection::vec(0u8..6, 0..8).prop_map(Op::SetTasks),
    ]
}

fn make_task(id: u8, version: u32) -> Task {
    Task {
        id: TaskId::new(format!("id-{id}")),
        title: format!("v{version}"),
        description: None,
        status: TaskStatus::Pending,
        priority: None,
        due_date: None,
        created_at: "2026-08-30T10:00:00Z".to_string(),
        updated_at: None,
        category_id: None,
    }
}

/// Sequential model: (id, title) pairs in order, plus the number of
/// notifications the real store should have produced.
#[derive(Default)]
struct Model {
    tasks: Vec<(u8, String)>,
    notifications: usize,
}

impl Model {
    fn apply(&mut self, op: &Op, version: u32) {
        match op {
            Op::InsertFront(id) => {
                if self.tasks.iter().any(|(i, _)| i == id) {
                    return;
                }
                self.tasks.insert(0, (*id, format!("v{version}")));
                self.notifications += 1;
            }
            Op::Remove(id) => {
                let before = self.tasks.len();
                self.tasks.retain(|(i, _)| i != id);
                if self.tasks.len() != before {
                    self.notifications += 1;
                }
            }
            Op::Replace(id) => {
                let mut hit = false;
                for entry in &mut self.tasks {
                    if entry.0 == *id {
                        entry.1 = format!("v{version}");
                        hit = true;
                    }
                }
                if hit {
                    self.notifications += 1;
                }
            }
            Op::SetTasks(ids) => {
                // Duplicates are dropped keeping the first occurrence.
                let mut seen = HashSet::new();
                self.tasks = ids
                    .iter()
                    .filter(|id| seen.insert(**id))
                    .map(|id| (*id, format!("v{version}")))
                    .collect();
                self.notifications += 1;
            }
        }
    }
}

fn run_op(store: &Store, op: &Op, version: u32) {
    match op {
        Op::InsertFront(id) => store.insert_front(make_task(*id, version)),
        Op::Remove(id) => store.remove_by_id(&TaskId::new(format!("id-{id}"))),
        Op::Replace(id) => {
            store.replace_by_id(&TaskId::new(format!("id-{id}")), make_task(*id, version));
        }
        Op::SetTasks(ids) => {
            store.set_tasks(ids.iter().map(|id| make_task(*id, version)).collect());
        }
    }
}

fn snapshot_pairs(store: &Store) -> Vec<(String, String)> {
    store
        .snapshot()
        .tasks
        .iter()
        .map(|t| (t.id.to_string(), t.title.clone()))
        .collect()
}

proptest! {
    /// Snapshot ids stay unique under any operation sequence.
    #[test]
    fn ids_are_always_unique(ops in prop::collection::vec(arb_op(), 0..32)) {
        let store = Store::new(None);
        for (version, op) in ops.iter().enumerate() {
            run_op(&store, op, u32::try_from(version).unwrap());
            let ids: Vec<_> = store.snapshot().tasks.iter().map(|t| t.id.clone()).collect();
            let unique: HashSet<_> = ids.iter().cloned().collect();
            prop_assert_eq!(ids.len(), unique.len());
        }
    }

    /// The store agrees with the sequential model after every step.
    #[test]
    fn snapshot_matches_sequential_model(ops in prop::collection::vec(arb_op(), 0..32)) {
        let store = Store::new(None);
        let mut model = Model::default();
        for (version, op) in ops.iter().enumerate() {
            let version = u32::try_from(version).unwrap();
            run_op(&store, op, version);
            model.apply(op, version);
            let expected: Vec<(String, String)> = model
                .tasks
                .iter()
                .map(|(id, title)| (format!("id-{id}"), title.clone()))
                .collect();
            prop_assert_eq!(snapshot_pairs(&store), expected);
        }
    }

    /// Exactly one notification per effective mutation; no-ops are
    /// silent.
    #[test]
    fn one_notification_per_effective_mutation(ops in prop::collection::vec(arb_op(), 0..32)) {
        let store = Store::new(None);
        let count = Arc::new(Mutex::new(0usize));
        let c = Arc::clone(&count);
        let _sub = store.subscribe(move |_| *c.lock() += 1);
        let mut model = Model::default();
        for (version, op) in ops.iter().enumerate() {
            let version = u32::try_from(version).unwrap();
            run_op(&store, op, version);
            model.apply(op, version);
        }
        // One extra for the subscription replay.
        prop_assert_eq!(*count.lock(), model.notifications + 1);
    }

    /// The derived visible view is always a subsequence of the stored
    /// tasks and never invents entries.
    #[test]
    fn visible_tasks_is_a_filtered_subsequence(ids in prop::collection::vec(0u8..6, 0..8)) {
        let store = Store::new(None);
        store.set_tasks(ids.iter().map(|id| make_task(*id, 0)).collect());
        let state = store.snapshot();
        let visible = state.visible_tasks();
        prop_assert!(visible.len() <= state.tasks.len());
        let all: Vec<_> = state.tasks.iter().map(|t| &t.id).collect();
        for task in visible {
            prop_assert!(all.contains(&&task.id));
        }
    }
}
