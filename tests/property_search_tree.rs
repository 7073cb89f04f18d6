use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use searchtrace::engine::TraceCore;
use searchtrace::trace::{Event, EventKind, NodeId, NodeStatus};
use searchtrace_test_utils::builders::independent_problem;
use searchtrace_test_utils::scripted::ScriptedBounds;

// A frame assigns every task either a fixed value or a proper interval.
fn frame_strategy(n: usize) -> impl Strategy<Value = Vec<(i64, i64)>> {
    proptest::collection::vec(
        prop_oneof![
            (0..6i64).prop_map(|v| (v, v)),
            (0..6i64, 1..4i64).prop_map(|(l, w)| (l, l + w)),
        ],
        n,
    )
}

fn scenario_strategy() -> impl Strategy<Value = (usize, Vec<Vec<(i64, i64)>>)> {
    (1..6usize).prop_flat_map(|n| (Just(n), proptest::collection::vec(frame_strategy(n), 1..12)))
}

/// Mirrors the visualiser's path replay.
#[derive(Default)]
struct Replay {
    path: Vec<NodeId>,
    seen: HashSet<NodeId>,
    level_of: HashMap<NodeId, usize>,
    awaiting_assignment: Option<i64>,
}

impl Replay {
    fn new() -> Self {
        Self {
            path: vec![NodeId::ROOT],
            seen: HashSet::from([NodeId::ROOT]),
            ..Self::default()
        }
    }

    fn step(&mut self, e: &Event) -> Result<(), TestCaseError> {
        if let Some(parent) = e.parent_node_id {
            prop_assert!(self.seen.contains(&parent), "unseen parent {}", parent);
        }
        if let Some(task) = self.awaiting_assignment.take() {
            prop_assert_eq!(e.kind, EventKind::Assigned);
            prop_assert_eq!(e.task_id, task);
        }

        match e.kind {
            EventKind::Assigned => {
                let node = e.node_id.unwrap();
                self.path.push(node);
                self.seen.insert(node);
                self.level_of.insert(node, e.decision_level.unwrap());
            }
            EventKind::Backtrack => {
                let target = e.backtrack_to_level.unwrap();
                let node = e.node_id.unwrap();
                prop_assert_eq!(e.node_status, Some(NodeStatus::Pruned));
                prop_assert!(target < self.level_of[&node]);
                self.path.truncate(target + 1);
                self.awaiting_assignment = Some(e.task_id);
            }
            _ => {}
        }

        prop_assert_eq!(e.decision_level, Some(self.path.len() - 1));
        Ok(())
    }
}

proptest! {
    #[test]
    fn reconstruction_invariants_hold((n, frames) in scenario_strategy()) {
        let problem = independent_problem(n);
        let mut bounds = ScriptedBounds::new(n, 0, 9);
        let mut core = TraceCore::new(problem, bounds.vars()).unwrap();
        let mut replay = Replay::new();

        for (ts, frame) in frames.iter().enumerate() {
            for (task, &(l, u)) in frame.iter().enumerate() {
                bounds.set(task, l, u);
            }

            let events = core.on_notify(&bounds, ts as u64).unwrap();
            for e in &events {
                replay.step(e)?;
            }

            // Stack/level consistency after the batch.
            prop_assert_eq!(core.tree().decision_level(), replay.path.len() - 1);
            prop_assert_eq!(core.tree().path(), replay.path.as_slice());

            // Idempotence.
            let again = core.on_notify(&bounds, ts as u64).unwrap();
            prop_assert!(again.is_empty());
        }

        prop_assert!(replay.awaiting_assignment.is_none());
    }

    #[test]
    fn events_follow_task_order_within_a_batch(frame in frame_strategy(5)) {
        let problem = independent_problem(5);
        let bounds = ScriptedBounds::from_pairs(&frame);
        let mut core = TraceCore::new(problem, bounds.vars()).unwrap();

        let events = core.on_notify(&bounds, 0).unwrap();
        let ids: Vec<i64> = events.iter().map(|e| e.task_id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        prop_assert_eq!(ids, sorted);
    }
}
