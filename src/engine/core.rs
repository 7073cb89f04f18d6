// src/engine/core.rs

//! Pure tracing core.
//!
//! `TraceCore` turns solver notifications into trace [`Event`]s:
//! - the tap diffs current bounds against its cache,
//! - the search tree turns each observation into transitions,
//! - each transition is rendered as one or two events.
//!
//! It performs no IO and holds no clock; timestamps are passed in by the
//! caller (`engine::session::TraceSession`). That keeps it deterministic and
//! testable with a scripted [`BoundsView`].

use std::sync::Arc;

use crate::errors::{Result, TraceError};
use crate::model::{Problem, Task};
use crate::solver::{BoundsView, Schedule};
use crate::trace::{
    Event, EventKind, NodeId, NodeStatus, PropagationTap, SearchTree, Transition, TreeError,
};
use crate::types::{SOLVER_TASK_ID, TaskIndex, VarId};

/// Only tree events (Assigned, Scheduled, Backtrack, BoundsChanged) carry
/// the active decision level; Defined and FinalSolution have none, and
/// SearchStarted is pinned to the root at level 0.
#[derive(Debug, Clone)]
pub struct TraceCore {
    problem: Arc<Problem>,
    tap: PropagationTap,
    tree: SearchTree,
    notifications: u64,
}

impl TraceCore {
    /// `start_vars` must be index-aligned with `problem.tasks()`.
    pub fn new(problem: Arc<Problem>, start_vars: Vec<VarId>) -> Result<Self> {
        if start_vars.len() != problem.n_tasks() {
            return Err(TraceError::ConfigError(format!(
                "{} tasks but {} start variables",
                problem.n_tasks(),
                start_vars.len()
            )));
        }

        let tree = SearchTree::new(problem.n_tasks());
        Ok(Self {
            problem,
            tap: PropagationTap::new(start_vars),
            tree,
            notifications: 0,
        })
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn tap(&self) -> &PropagationTap {
        &self.tap
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Number of `on_notify` calls so far.
    pub fn notifications(&self) -> u64 {
        self.notifications
    }

    /// One `Defined` event per task, in task order.
    pub fn definition_events(&self, timestamp_ms: u64) -> Vec<Event> {
        self.problem
            .tasks()
            .iter()
            .enumerate()
            .map(|(index, task)| {
                let successors = task.successors.clone();
                Event::new(
                    EventKind::Defined,
                    timestamp_ms,
                    task.id,
                    task.name.clone(),
                    format!("Task defined with duration {}", task.duration),
                )
                .with_window(0, task.duration)
                .with_links(self.problem.predecessor_ids(index), successors)
            })
            .collect()
    }

    pub fn search_started_event(&self, timestamp_ms: u64) -> Event {
        Event::new(
            EventKind::SearchStarted,
            timestamp_ms,
            SOLVER_TASK_ID,
            "Solver",
            "Solver started",
        )
        .at_level(0)
        .on_node(NodeId::ROOT, None, NodeStatus::Created)
    }

    /// Handle one watcher wake-up. All events of the batch share
    /// `timestamp_ms` and appear in task order.
    pub fn on_notify(&mut self, view: &dyn BoundsView, timestamp_ms: u64) -> Result<Vec<Event>> {
        self.notifications += 1;

        let mut events = Vec::new();
        for observation in self.tap.scan(view) {
            let transitions = self
                .tree
                .apply(observation)
                .map_err(|err| self.invariant_error(err, observation.task()))?;
            for transition in transitions {
                self.render(transition, timestamp_ms, &mut events);
            }
        }
        Ok(events)
    }

    /// One `FinalSolution` event per task for an improving schedule.
    pub fn solution_events(&self, schedule: &Schedule, timestamp_ms: u64) -> Vec<Event> {
        self.problem
            .tasks()
            .iter()
            .zip(&schedule.starts)
            .map(|(task, &start)| {
                Event::new(
                    EventKind::FinalSolution,
                    timestamp_ms,
                    task.id,
                    task.name.clone(),
                    format!(
                        "Solution: start {start}, end {} (makespan {})",
                        start + task.duration,
                        schedule.makespan
                    ),
                )
                .with_window(start, start + task.duration)
            })
            .collect()
    }

    fn render(&self, transition: Transition, ts: u64, out: &mut Vec<Event>) {
        match transition {
            Transition::Decided {
                node,
                parent,
                task,
                value,
                level,
            } => {
                let t = self.task(task);
                let end = value + t.duration;
                out.push(
                    Event::new(
                        EventKind::Assigned,
                        ts,
                        t.id,
                        t.name.clone(),
                        format!("Start variable fixed to {value}"),
                    )
                    .with_window(value, end)
                    .at_level(level)
                    .on_node(node, Some(parent), NodeStatus::Created),
                );
                out.push(
                    Event::new(
                        EventKind::Scheduled,
                        ts,
                        t.id,
                        t.name.clone(),
                        format!("Task scheduled at time {value}"),
                    )
                    .with_window(value, end)
                    .at_level(level)
                    .on_node(node, Some(parent), NodeStatus::Created),
                );
            }
            Transition::Abandoned {
                node,
                parent,
                task,
                from,
                to,
                target_level,
            } => {
                let t = self.task(task);
                out.push(
                    Event::new(
                        EventKind::Backtrack,
                        ts,
                        t.id,
                        t.name.clone(),
                        format!("Backtracked from {from} to {to}"),
                    )
                    .with_window(from, to)
                    .at_level(target_level)
                    .backtracking_to(target_level)
                    .on_node(node, parent, NodeStatus::Pruned),
                );
            }
            Transition::Narrowed {
                node,
                parent,
                task,
                bounds,
                level,
            } => {
                let t = self.task(task);
                out.push(
                    Event::new(
                        EventKind::BoundsChanged,
                        ts,
                        t.id,
                        t.name.clone(),
                        format!(
                            "Start variable bounds updated: [{}, {}]",
                            bounds.lower, bounds.upper
                        ),
                    )
                    .with_window(bounds.lower, bounds.upper + t.duration)
                    .at_level(level)
                    .on_node(node, parent, NodeStatus::Created),
                );
            }
        }
    }

    // Transitions only carry indices the tree has validated.
    fn task(&self, index: TaskIndex) -> &Task {
        &self.problem.tasks()[index]
    }

    fn invariant_error(&self, err: TreeError, index: TaskIndex) -> TraceError {
        TraceError::invariant(
            err.to_string(),
            self.problem.task(index).map(|t| t.id),
            err.kind(),
            self.tree.decision_level(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::builtin_instance;
    use crate::types::Bounds;

    struct Frame(HashMap<usize, Bounds>);

    impl BoundsView for Frame {
        fn lower_bound(&self, var: VarId) -> i64 {
            self.0[&var.0].lower
        }
        fn upper_bound(&self, var: VarId) -> i64 {
            self.0[&var.0].upper
        }
    }

    fn frame(bounds: &[(i64, i64)]) -> Frame {
        Frame(
            bounds
                .iter()
                .enumerate()
                .map(|(i, &(l, u))| (i, Bounds::new(l, u)))
                .collect(),
        )
    }

    fn pair_core() -> TraceCore {
        let problem = Arc::new(Problem::from_instance(&builtin_instance("pair").unwrap()));
        TraceCore::new(problem, vec![VarId(0), VarId(1)]).unwrap()
    }

    #[test]
    fn mismatched_variables_are_a_config_error() {
        let problem = Arc::new(Problem::from_instance(&builtin_instance("pair").unwrap()));
        let err = TraceCore::new(problem, vec![VarId(0)]).unwrap_err();
        assert!(matches!(err, TraceError::ConfigError(_)));
    }

    #[test]
    fn definitions_carry_links() {
        let core = pair_core();
        let defs = core.definition_events(0);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].successors, Some(vec![1]));
        assert_eq!(defs[1].dependencies, Some(vec![0]));
        assert_eq!(defs[1].end_time, Some(4));
    }

    #[test]
    fn fixation_renders_assigned_then_scheduled() {
        let mut core = pair_core();
        let events = core.on_notify(&frame(&[(0, 0), (3, 3)]), 5).unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Assigned,
                EventKind::Scheduled,
                EventKind::Assigned,
                EventKind::Scheduled
            ]
        );
        assert_eq!(events[2].decision_level, Some(2));
        assert_eq!(events[2].parent_node_id, events[0].node_id);
        assert_eq!(events[2].end_time, Some(7));
    }

    #[test]
    fn backtrack_reports_enclosing_level() {
        let mut core = pair_core();
        core.on_notify(&frame(&[(0, 4), (2, 2)]), 1).unwrap();
        core.on_notify(&frame(&[(0, 0), (2, 2)]), 2).unwrap();
        let events = core.on_notify(&frame(&[(0, 0), (5, 5)]), 3).unwrap();

        assert_eq!(events[0].kind, EventKind::Backtrack);
        assert_eq!(events[0].description, "Backtracked from 2 to 5");
        assert_eq!(events[0].backtrack_to_level, Some(1));
        assert_eq!(events[0].node_status, Some(NodeStatus::Pruned));
        assert_eq!(events[1].kind, EventKind::Assigned);
        assert_eq!(events[1].decision_level, Some(2));
    }

    #[test]
    fn unchanged_state_yields_nothing() {
        let mut core = pair_core();
        let f = frame(&[(0, 4), (3, 3)]);
        assert!(!core.on_notify(&f, 0).unwrap().is_empty());
        assert!(core.on_notify(&f, 1).unwrap().is_empty());
        assert_eq!(core.notifications(), 2);
    }
}
