#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use searchtrace::engine::{SolveReport, SolveRequest, run_traced_solve};
use searchtrace::fs::mock::MockFileSystem;
use searchtrace::model::Problem;
use searchtrace::solver::{Schedule, SearchLimits};
use searchtrace::trace::{EventRecord, ManualClock, TraceDocument, parse_trace};

pub use searchtrace_test_utils::init_tracing;

pub const TRACE_PATH: &str = "trace.json";

/// Solve `problem` with a trace written to an in-memory filesystem.
pub fn traced_run(problem: Arc<Problem>, limits: SearchLimits) -> (MockFileSystem, SolveReport) {
    init_tracing();
    let fs = MockFileSystem::new();
    let request = SolveRequest {
        problem,
        output: PathBuf::from(TRACE_PATH),
        limits,
    };
    let report = run_traced_solve(&request, &fs, Box::new(ManualClock::new()), None)
        .expect("traced solve failed");
    (fs, report)
}

pub fn read_doc(fs: &MockFileSystem) -> TraceDocument {
    let text = fs.contents_string(TRACE_PATH).expect("trace file missing");
    parse_trace(&text).expect("trace is not valid JSON")
}

pub fn with_tag<'a>(doc: &'a TraceDocument, tag: &str) -> Vec<&'a EventRecord> {
    doc.events
        .iter()
        .filter(|e| e.kind_tag() == Some(tag))
        .collect()
}

/// Replay a trace the way the visualiser does and check the structural
/// guarantees of the search-tree events.
pub fn assert_trace_consistent(events: &[EventRecord]) {
    let mut path: Vec<String> = vec!["root".to_string()];
    let mut seen: HashSet<String> = HashSet::from(["root".to_string()]);
    let mut node_level: HashMap<String, usize> = HashMap::new();
    let mut last_timestamp = 0;
    let mut pending_reassign: Option<String> = None;

    for (i, e) in events.iter().enumerate() {
        assert!(e.timestamp >= last_timestamp, "timestamp decreased at event {i}");
        last_timestamp = e.timestamp;

        if let Some(parent) = &e.parent_node_id {
            assert!(seen.contains(parent), "event {i} references unseen parent {parent}");
        }

        let tag = e.kind_tag().unwrap_or_default();
        if let Some(task) = pending_reassign.take() {
            assert_eq!(tag, "assigned", "backtrack before event {i} not followed by assignment");
            assert_eq!(e.task_id, task);
        }

        match tag {
            "assigned" => {
                let node = e.node_id.clone().expect("assignment without node");
                path.push(node.clone());
                seen.insert(node.clone());
                node_level.insert(node, e.decision_level.expect("assignment without level"));
            }
            "backtrack" => {
                let target = e.backtrack_to_level.expect("backtrack without target");
                let node = e.node_id.clone().expect("backtrack without node");
                assert_eq!(e.node_status.as_deref(), Some("pruned"));
                assert!(target < node_level[&node], "backtrack target not above pruned node");
                path.truncate(target + 1);
                pending_reassign = Some(e.task_id.clone());
            }
            _ => {}
        }

        if matches!(tag, "assigned" | "scheduled" | "backtrack" | "bounds_changed") {
            assert_eq!(
                Some(path.len() - 1),
                e.decision_level,
                "decision level mismatch at event {i} ({})",
                e.id
            );
        }
    }
}

/// Check precedence and capacity of a schedule.
pub fn assert_schedule_feasible(problem: &Problem, schedule: &Schedule) {
    let tasks = problem.tasks();
    for (before, after) in problem.graph().edges() {
        assert!(
            schedule.starts[before] + tasks[before].duration <= schedule.starts[after],
            "precedence {} -> {} violated",
            tasks[before].id,
            tasks[after].id
        );
    }

    for (r, resource) in problem.resources().iter().enumerate() {
        for t in 0..schedule.makespan {
            let usage: i64 = tasks
                .iter()
                .zip(&schedule.starts)
                .filter(|&(task, &s)| s <= t && t < s + task.duration)
                .map(|(task, _)| task.demands[r])
                .sum();
            assert!(
                usage <= resource.capacity,
                "resource {} overloaded at {t}",
                resource.name
            );
        }
    }

    assert_eq!(problem.makespan_of(&schedule.starts), schedule.makespan);
}
