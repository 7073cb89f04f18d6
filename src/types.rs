// src/types.rs

//! Small value types shared across the crate.

use std::fmt;

/// External task identifier as it appears in instance files and traces.
///
/// Ids are not required to be contiguous; see [`TaskIndex`] for the dense
/// index used internally.
pub type TaskId = i64;

/// Dense task index in `0..N`, assigned once when the problem is built.
///
/// All per-task state (tap cache, solver variables, graph adjacency) is
/// stored in vectors indexed by this value.
pub type TaskIndex = usize;

/// Task id used for solver-level events that do not refer to a task.
pub const SOLVER_TASK_ID: TaskId = -1;

/// Opaque handle to a start-time decision variable owned by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Handle for the `index`-th variable of an external solver or a test
    /// double.
    pub fn from_index(index: usize) -> Self {
        VarId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Inclusive `[lower, upper]` domain bounds of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lower: i64,
    pub upper: i64,
}

impl Bounds {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}
