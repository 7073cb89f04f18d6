// src/solver/mod.rs

//! Solver-side collaborators of the tracing core.
//!
//! The tracing core only ever talks to a solver through the watch/propagate
//! protocol defined here:
//! - a watcher is registered and receives a [`WatcherId`],
//! - the watcher subscribes to lower/upper bound changes per variable,
//! - the solver calls [`Watcher::propagate`] whenever a watched domain may
//!   have changed, handing it a read-only [`BoundsView`].
//!
//! [`ReferenceSolver`] is a small depth-first branch-and-bound scheduler that
//! implements the protocol so the binary and the tests can run end to end.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::types::{Bounds, VarId};

pub mod domains;
mod propagators;
pub mod search;

pub use domains::{BoundSide, Domains, EmptyDomain};
pub use search::{ReferenceSolver, SearchLimits, SearchStats, SolveOutcome};

/// Handle returned by watcher registration.
pub type WatcherId = usize;

/// Answer of a watcher to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// No conflict; continue the search.
    Continue,
    /// Abort the search. Reserved for unrecoverable watcher failures; it is
    /// never used to express a conflict.
    Stop,
}

/// Read-only access to the current domain of solver variables.
pub trait BoundsView {
    fn lower_bound(&self, var: VarId) -> i64;
    fn upper_bound(&self, var: VarId) -> i64;

    fn bounds(&self, var: VarId) -> Bounds {
        Bounds::new(self.lower_bound(var), self.upper_bound(var))
    }
}

/// Callback invoked by the solver when a watched variable's domain may have
/// changed.
pub trait Watcher {
    fn propagate(&mut self, view: &dyn BoundsView) -> Propagation;
}

/// Callback invoked by the solver each time it finds an improving schedule.
pub trait SolutionObserver {
    fn on_solution(&mut self, schedule: &Schedule);
}

// The search thread is the only owner of these handles; sharing one session
// as both watcher and observer goes through `Rc<RefCell<_>>`.
impl<W: Watcher + ?Sized> Watcher for Rc<RefCell<W>> {
    fn propagate(&mut self, view: &dyn BoundsView) -> Propagation {
        self.borrow_mut().propagate(view)
    }
}

impl<O: SolutionObserver + ?Sized> SolutionObserver for Rc<RefCell<O>> {
    fn on_solution(&mut self, schedule: &Schedule) {
        self.borrow_mut().on_solution(schedule)
    }
}

/// Start times for every task (index-aligned with the problem's tasks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub starts: Vec<i64>,
    pub makespan: i64,
}

/// Final status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Search space exhausted; the best schedule is optimal.
    Optimal,
    /// A schedule was found but optimality was not proven.
    Feasible,
    /// Search space exhausted without any schedule.
    Infeasible,
    /// A limit was hit before any schedule was found.
    Unknown,
    /// A watcher asked the search to stop.
    Aborted,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
            SolveStatus::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}
