// src/solver/domains.rs

//! Trailed interval domains.

use crate::solver::BoundsView;
use crate::types::{Bounds, VarId};

/// A bound update emptied the domain of `var`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyDomain {
    pub var: VarId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy)]
struct TrailEntry {
    var: VarId,
    previous: Bounds,
}

/// Interval domains with a trail, so every change made after
/// [`Domains::push_level`] is undone by the matching [`Domains::pop_level`].
#[derive(Debug, Clone, Default)]
pub struct Domains {
    bounds: Vec<Bounds>,
    trail: Vec<TrailEntry>,
    /// Trail length at the start of each open level.
    level_starts: Vec<usize>,
    /// Bound changes since the last [`Domains::take_touched`].
    touched: Vec<(VarId, BoundSide)>,
}

impl Domains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a variable with domain `[lower, upper]`. The domain may be
    /// empty; callers check [`Domains::any_empty`] before searching.
    pub fn new_var(&mut self, lower: i64, upper: i64) -> VarId {
        self.bounds.push(Bounds::new(lower, upper));
        VarId(self.bounds.len() - 1)
    }

    pub fn num_vars(&self) -> usize {
        self.bounds.len()
    }

    pub fn bounds(&self, var: VarId) -> Bounds {
        self.bounds[var.0]
    }

    pub fn is_fixed(&self, var: VarId) -> bool {
        self.bounds[var.0].is_fixed()
    }

    pub fn any_empty(&self) -> Option<VarId> {
        self.bounds.iter().position(Bounds::is_empty).map(VarId)
    }

    pub fn decision_level(&self) -> usize {
        self.level_starts.len()
    }

    /// Raise the lower bound of `var` to `value`. Returns whether the domain
    /// changed.
    pub fn tighten_lower(&mut self, var: VarId, value: i64) -> Result<bool, EmptyDomain> {
        let current = self.bounds[var.0];
        if value <= current.lower {
            return Ok(false);
        }
        self.record(var, current);
        self.bounds[var.0].lower = value;
        self.touched.push((var, BoundSide::Lower));
        self.check(var)
    }

    /// Lower the upper bound of `var` to `value`. Returns whether the domain
    /// changed.
    pub fn tighten_upper(&mut self, var: VarId, value: i64) -> Result<bool, EmptyDomain> {
        let current = self.bounds[var.0];
        if value >= current.upper {
            return Ok(false);
        }
        self.record(var, current);
        self.bounds[var.0].upper = value;
        self.touched.push((var, BoundSide::Upper));
        self.check(var)
    }

    pub fn fix(&mut self, var: VarId, value: i64) -> Result<bool, EmptyDomain> {
        let lower = self.tighten_lower(var, value)?;
        let upper = self.tighten_upper(var, value)?;
        Ok(lower || upper)
    }

    pub fn push_level(&mut self) {
        self.level_starts.push(self.trail.len());
    }

    /// Undo every change made since the matching `push_level`.
    pub fn pop_level(&mut self) {
        let Some(start) = self.level_starts.pop() else {
            return;
        };
        while self.trail.len() > start {
            if let Some(entry) = self.trail.pop() {
                self.bounds[entry.var.0] = entry.previous;
                self.touched.push((entry.var, BoundSide::Lower));
                self.touched.push((entry.var, BoundSide::Upper));
            }
        }
    }

    pub fn take_touched(&mut self) -> Vec<(VarId, BoundSide)> {
        std::mem::take(&mut self.touched)
    }

    fn record(&mut self, var: VarId, previous: Bounds) {
        self.trail.push(TrailEntry { var, previous });
    }

    fn check(&self, var: VarId) -> Result<bool, EmptyDomain> {
        if self.bounds[var.0].is_empty() {
            Err(EmptyDomain { var })
        } else {
            Ok(true)
        }
    }
}

impl BoundsView for Domains {
    fn lower_bound(&self, var: VarId) -> i64 {
        self.bounds[var.0].lower
    }

    fn upper_bound(&self, var: VarId) -> i64 {
        self.bounds[var.0].upper
    }
}
