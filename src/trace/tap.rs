// src/trace/tap.rs

//! Classification of raw domain notifications.

use tracing::trace;

use crate::solver::BoundsView;
use crate::types::{Bounds, TaskIndex, VarId};

/// What the tap last saw for one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentRecord {
    /// Last fixed value; never cleared once set.
    pub fixed: Option<i64>,
    /// Last observed unfixed bounds.
    pub bounds: Option<Bounds>,
}

/// New information found by one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First fixation of the task.
    Fixed { task: TaskIndex, value: i64 },
    /// The task was fixed before and is now fixed to a different value.
    Refixed {
        task: TaskIndex,
        previous: i64,
        value: i64,
    },
    /// Unfixed bounds differ from the last observed pair.
    Narrowed { task: TaskIndex, bounds: Bounds },
}

impl Observation {
    pub fn task(&self) -> TaskIndex {
        match *self {
            Observation::Fixed { task, .. }
            | Observation::Refixed { task, .. }
            | Observation::Narrowed { task, .. } => task,
        }
    }
}

/// Re-reads every watched start variable on each call and diffs it against
/// a dense per-task cache.
///
/// The tap never assumes exactly-once delivery: a scan over an unchanged
/// state yields nothing. Bounds changes are not reported for a task that has
/// a cached fixed value, although the cache is still kept current.
#[derive(Debug, Clone)]
pub struct PropagationTap {
    vars: Vec<VarId>,
    records: Vec<AssignmentRecord>,
}

impl PropagationTap {
    /// `vars[i]` is the start variable of task index `i`.
    pub fn new(vars: Vec<VarId>) -> Self {
        let records = vec![AssignmentRecord::default(); vars.len()];
        Self { vars, records }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn record(&self, task: TaskIndex) -> Option<&AssignmentRecord> {
        self.records.get(task)
    }

    /// Observations in task order.
    pub fn scan(&mut self, view: &dyn BoundsView) -> Vec<Observation> {
        let mut out = Vec::new();

        for (task, (&var, record)) in self.vars.iter().zip(self.records.iter_mut()).enumerate() {
            let bounds = view.bounds(var);

            if bounds.is_fixed() {
                let value = bounds.lower;
                match record.fixed {
                    None => out.push(Observation::Fixed { task, value }),
                    Some(previous) if previous != value => out.push(Observation::Refixed {
                        task,
                        previous,
                        value,
                    }),
                    Some(_) => {}
                }
                record.fixed = Some(value);
            } else if record.bounds != Some(bounds) {
                record.bounds = Some(bounds);
                if record.fixed.is_none() {
                    out.push(Observation::Narrowed { task, bounds });
                }
            }
        }

        trace!(watched = self.vars.len(), observations = out.len(), "tap scan");
        out
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
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

    fn tap(n: usize) -> PropagationTap {
        PropagationTap::new((0..n).map(VarId).collect())
    }

    #[test]
    fn first_scan_reports_everything_in_task_order() {
        let mut tap = tap(3);
        let obs = tap.scan(&frame(&[(0, 5), (2, 2), (1, 4)]));
        assert_eq!(
            obs,
            vec![
                Observation::Narrowed { task: 0, bounds: Bounds::new(0, 5) },
                Observation::Fixed { task: 1, value: 2 },
                Observation::Narrowed { task: 2, bounds: Bounds::new(1, 4) },
            ]
        );
    }

    #[test]
    fn repeated_scan_is_silent() {
        let mut tap = tap(2);
        let f = frame(&[(0, 5), (3, 3)]);
        tap.scan(&f);
        assert!(tap.scan(&f).is_empty());
    }

    #[test]
    fn refixing_reports_previous_value() {
        let mut tap = tap(1);
        tap.scan(&frame(&[(2, 2)]));
        assert_eq!(
            tap.scan(&frame(&[(5, 5)])),
            vec![Observation::Refixed { task: 0, previous: 2, value: 5 }]
        );
        assert_eq!(tap.record(0).unwrap().fixed, Some(5));
    }

    #[test]
    fn bounds_of_a_fixed_task_are_cached_but_not_reported() {
        let mut tap = tap(1);
        tap.scan(&frame(&[(2, 2)]));
        assert!(tap.scan(&frame(&[(0, 9)])).is_empty());
        assert_eq!(tap.record(0).unwrap().bounds, Some(Bounds::new(0, 9)));
    }
}
