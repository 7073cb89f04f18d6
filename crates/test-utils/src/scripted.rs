use searchtrace::solver::BoundsView;
use searchtrace::types::{Bounds, VarId};

/// Hand-driven domains standing in for a solver.
///
/// Variable `i` is task `i`; tests move bounds around and feed the view to
/// the tracing core as if the solver had just notified.
#[derive(Debug, Clone)]
pub struct ScriptedBounds {
    bounds: Vec<Bounds>,
}

impl ScriptedBounds {
    /// `n` variables, all with domain `[lower, upper]`.
    pub fn new(n: usize, lower: i64, upper: i64) -> Self {
        Self {
            bounds: vec![Bounds::new(lower, upper); n],
        }
    }

    pub fn from_pairs(pairs: &[(i64, i64)]) -> Self {
        Self {
            bounds: pairs.iter().map(|&(l, u)| Bounds::new(l, u)).collect(),
        }
    }

    pub fn vars(&self) -> Vec<VarId> {
        (0..self.bounds.len()).map(VarId::from_index).collect()
    }

    pub fn set(&mut self, task: usize, lower: i64, upper: i64) -> &mut Self {
        self.bounds[task] = Bounds::new(lower, upper);
        self
    }

    pub fn fix(&mut self, task: usize, value: i64) -> &mut Self {
        self.set(task, value, value)
    }
}

impl BoundsView for ScriptedBounds {
    fn lower_bound(&self, var: VarId) -> i64 {
        self.bounds[var.index()].lower
    }

    fn upper_bound(&self, var: VarId) -> i64 {
        self.bounds[var.index()].upper
    }
}
