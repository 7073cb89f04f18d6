// src/solver/search.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::errors::{Result, TraceError};
use crate::model::Problem;
use crate::solver::domains::{BoundSide, Domains};
use crate::solver::propagators::{
    Inconsistency, propagate_makespan_bound, propagate_precedences, propagate_time_table,
};
use crate::solver::{Propagation, Schedule, SolutionObserver, SolveStatus, Watcher, WatcherId};
use crate::types::VarId;

/// Limits applied to a single solve.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    pub time_limit: Option<Duration>,
    pub node_limit: Option<u64>,
    /// Keep searching for shorter schedules after the first one.
    pub optimize: bool,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            time_limit: None,
            node_limit: None,
            optimize: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub decisions: u64,
    pub conflicts: u64,
    pub solutions: u64,
    pub watcher_calls: u64,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub best: Option<Schedule>,
    pub stats: SearchStats,
    pub elapsed: Duration,
}

/// How a subtree ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Subtree exhausted; try the next value.
    Continue,
    /// First schedule found and optimisation is off.
    Satisfied,
    /// A limit or the cancel flag fired.
    Interrupted,
    /// A watcher returned [`Propagation::Stop`].
    Aborted,
}

struct WatcherSlot<'w> {
    watcher: Box<dyn Watcher + 'w>,
    pending: bool,
}

/// Depth-first branch-and-bound over task start times.
///
/// Branching picks the unfixed task with the smallest earliest start (ties by
/// task order) and tries its start values in ascending order. After every
/// successful propagation fixpoint, watchers subscribed to a changed bound
/// are called with the current domains.
pub struct ReferenceSolver<'w> {
    problem: Arc<Problem>,
    limits: SearchLimits,
    domains: Domains,
    start_vars: Vec<VarId>,
    watchers: Vec<WatcherSlot<'w>>,
    lower_watches: Vec<Vec<WatcherId>>,
    upper_watches: Vec<Vec<WatcherId>>,
    observers: Vec<Box<dyn SolutionObserver + 'w>>,
    best: Option<Schedule>,
    stats: SearchStats,
    cancel: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl<'w> ReferenceSolver<'w> {
    /// One start variable per task with domain `[0, horizon - duration]`.
    pub fn new(problem: Arc<Problem>, limits: SearchLimits) -> Self {
        let mut domains = Domains::new();
        let start_vars: Vec<VarId> = problem
            .tasks()
            .iter()
            .map(|t| domains.new_var(0, problem.horizon() - t.duration))
            .collect();
        let n_vars = domains.num_vars();

        Self {
            problem,
            limits,
            domains,
            start_vars,
            watchers: Vec::new(),
            lower_watches: vec![Vec::new(); n_vars],
            upper_watches: vec![Vec::new(); n_vars],
            observers: Vec::new(),
            best: None,
            stats: SearchStats::default(),
            cancel: None,
            deadline: None,
        }
    }

    /// Start variables, index-aligned with the problem's tasks.
    pub fn start_vars(&self) -> &[VarId] {
        &self.start_vars
    }

    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    /// Register a watcher. It is called once at the root even if nothing it
    /// watches has changed yet.
    pub fn register(&mut self, watcher: Box<dyn Watcher + 'w>) -> WatcherId {
        self.watchers.push(WatcherSlot {
            watcher,
            pending: true,
        });
        self.watchers.len() - 1
    }

    pub fn watch_lower_bound(&mut self, id: WatcherId, var: VarId) -> Result<()> {
        self.check_subscription(id, var)?;
        self.lower_watches[var.index()].push(id);
        Ok(())
    }

    pub fn watch_upper_bound(&mut self, id: WatcherId, var: VarId) -> Result<()> {
        self.check_subscription(id, var)?;
        self.upper_watches[var.index()].push(id);
        Ok(())
    }

    pub fn add_solution_observer(&mut self, observer: Box<dyn SolutionObserver + 'w>) {
        self.observers.push(observer);
    }

    pub fn solve(&mut self) -> SolveOutcome {
        let started = Instant::now();
        self.deadline = self.limits.time_limit.map(|limit| started + limit);

        info!(
            problem = %self.problem.name(),
            tasks = self.problem.n_tasks(),
            horizon = self.problem.horizon(),
            optimize = self.limits.optimize,
            "search started"
        );

        let flow = match self.domains.any_empty() {
            Some(var) => {
                debug!(%var, "start variable has an empty initial domain");
                Flow::Continue
            }
            None => self.descend(),
        };

        let status = match flow {
            Flow::Aborted => SolveStatus::Aborted,
            Flow::Satisfied => SolveStatus::Feasible,
            Flow::Interrupted if self.best.is_some() => SolveStatus::Feasible,
            Flow::Interrupted => SolveStatus::Unknown,
            Flow::Continue if self.best.is_some() => SolveStatus::Optimal,
            Flow::Continue => SolveStatus::Infeasible,
        };

        let elapsed = started.elapsed();
        info!(
            %status,
            nodes = self.stats.nodes,
            conflicts = self.stats.conflicts,
            solutions = self.stats.solutions,
            elapsed_ms = elapsed.as_millis() as u64,
            "search finished"
        );

        SolveOutcome {
            status,
            best: self.best.clone(),
            stats: self.stats,
            elapsed,
        }
    }

    fn check_subscription(&self, id: WatcherId, var: VarId) -> Result<()> {
        if id >= self.watchers.len() {
            return Err(TraceError::ConfigError(format!("unknown watcher id {id}")));
        }
        if var.index() >= self.domains.num_vars() {
            return Err(TraceError::ConfigError(format!("unknown variable {var}")));
        }
        Ok(())
    }

    fn descend(&mut self) -> Flow {
        if let Some(flow) = self.check_limits() {
            return flow;
        }
        self.stats.nodes += 1;

        if let Err(reason) = self.propagate() {
            self.stats.conflicts += 1;
            debug!(?reason, level = self.domains.decision_level(), "conflict");
            return Flow::Continue;
        }

        if self.notify_watchers() == Propagation::Stop {
            warn!("watcher requested stop; aborting search");
            return Flow::Aborted;
        }

        let Some(task) = self.select_task() else {
            return self.record_solution();
        };
        let var = self.start_vars[task];
        let bounds = self.domains.bounds(var);
        let duration = self.problem.tasks()[task].duration;

        for value in bounds.lower..=bounds.upper {
            // Values ascend, so once one cannot beat the incumbent none can.
            if self.limits.optimize
                && self.best.as_ref().is_some_and(|b| value + duration >= b.makespan)
            {
                break;
            }
            self.domains.push_level();
            self.stats.decisions += 1;
            let flow = match self.domains.fix(var, value) {
                Ok(_) => self.descend(),
                Err(_) => {
                    self.stats.conflicts += 1;
                    Flow::Continue
                }
            };
            self.domains.pop_level();
            if flow != Flow::Continue {
                return flow;
            }
        }

        Flow::Continue
    }

    fn propagate(&mut self) -> std::result::Result<(), Inconsistency> {
        let incumbent = if self.limits.optimize {
            self.best.as_ref().map(|s| s.makespan)
        } else {
            None
        };

        loop {
            let mut changed = propagate_precedences(&self.problem, &self.start_vars, &mut self.domains)?;
            if let Some(makespan) = incumbent {
                changed |= propagate_makespan_bound(
                    &self.problem,
                    &self.start_vars,
                    &mut self.domains,
                    makespan - 1,
                )?;
            }
            changed |= propagate_time_table(&self.problem, &self.start_vars, &mut self.domains)?;
            if !changed {
                return Ok(());
            }
        }
    }

    fn notify_watchers(&mut self) -> Propagation {
        for (var, side) in self.domains.take_touched() {
            let subscribed = match side {
                BoundSide::Lower => &self.lower_watches[var.index()],
                BoundSide::Upper => &self.upper_watches[var.index()],
            };
            for &id in subscribed {
                self.watchers[id].pending = true;
            }
        }

        for slot in self.watchers.iter_mut().filter(|s| s.pending) {
            slot.pending = false;
            self.stats.watcher_calls += 1;
            if slot.watcher.propagate(&self.domains) == Propagation::Stop {
                return Propagation::Stop;
            }
        }
        Propagation::Continue
    }

    fn select_task(&self) -> Option<usize> {
        self.start_vars
            .iter()
            .enumerate()
            .filter(|(_, var)| !self.domains.is_fixed(**var))
            .min_by_key(|(i, var)| (self.domains.bounds(**var).lower, *i))
            .map(|(i, _)| i)
    }

    fn record_solution(&mut self) -> Flow {
        let starts: Vec<i64> = self
            .start_vars
            .iter()
            .map(|&v| self.domains.bounds(v).lower)
            .collect();
        let makespan = self.problem.makespan_of(&starts);

        if self.best.as_ref().is_none_or(|b| makespan < b.makespan) {
            self.stats.solutions += 1;
            info!(makespan, solutions = self.stats.solutions, "improving schedule found");
            let schedule = Schedule { starts, makespan };
            for observer in &mut self.observers {
                observer.on_solution(&schedule);
            }
            self.best = Some(schedule);
        }

        if self.limits.optimize {
            Flow::Continue
        } else {
            Flow::Satisfied
        }
    }

    fn check_limits(&self) -> Option<Flow> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            debug!("cancel flag observed");
            return Some(Flow::Interrupted);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            debug!("time limit reached");
            return Some(Flow::Interrupted);
        }
        if self.limits.node_limit.is_some_and(|n| self.stats.nodes >= n) {
            debug!("node limit reached");
            return Some(Flow::Interrupted);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::builtin_instance;
    use crate::solver::BoundsView;

    fn problem(name: &str) -> Arc<Problem> {
        Arc::new(Problem::from_instance(&builtin_instance(name).unwrap()))
    }

    #[derive(Default)]
    struct CountingWatcher {
        calls: usize,
        stop_after: Option<usize>,
    }

    impl Watcher for CountingWatcher {
        fn propagate(&mut self, _view: &dyn BoundsView) -> Propagation {
            self.calls += 1;
            if self.stop_after.is_some_and(|n| self.calls >= n) {
                Propagation::Stop
            } else {
                Propagation::Continue
            }
        }
    }

    #[test]
    fn pair_is_solved_optimally() {
        let mut solver = ReferenceSolver::new(problem("pair"), SearchLimits::default());
        let outcome = solver.solve();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        let best = outcome.best.unwrap();
        assert_eq!(best.starts, vec![0, 3]);
        assert_eq!(best.makespan, 7);
    }

    #[test]
    fn watchers_see_root_and_changes() {
        let watcher = Rc::new(RefCell::new(CountingWatcher::default()));
        let mut solver = ReferenceSolver::new(problem("simple"), SearchLimits::default());
        let id = solver.register(Box::new(watcher.clone()));
        for var in solver.start_vars().to_vec() {
            solver.watch_lower_bound(id, var).unwrap();
            solver.watch_upper_bound(id, var).unwrap();
        }
        let outcome = solver.solve();
        assert!(outcome.status.has_solution());
        assert!(watcher.borrow().calls >= 1);
        assert_eq!(outcome.stats.watcher_calls as usize, watcher.borrow().calls);
    }

    #[test]
    fn stop_aborts_the_search() {
        let watcher = Rc::new(RefCell::new(CountingWatcher {
            calls: 0,
            stop_after: Some(1),
        }));
        let mut solver = ReferenceSolver::new(problem("software"), SearchLimits::default());
        solver.register(Box::new(watcher.clone()));
        assert_eq!(solver.solve().status, SolveStatus::Aborted);
    }

    #[test]
    fn cancel_flag_interrupts_before_any_node() {
        let mut solver = ReferenceSolver::new(problem("simple"), SearchLimits::default());
        solver.set_cancel_flag(Arc::new(AtomicBool::new(true)));
        let outcome = solver.solve();
        assert_eq!(outcome.status, SolveStatus::Unknown);
        assert_eq!(outcome.stats.nodes, 0);
    }

    #[test]
    fn first_solution_mode_stops_early() {
        let limits = SearchLimits {
            optimize: false,
            ..SearchLimits::default()
        };
        let mut solver = ReferenceSolver::new(problem("software"), limits);
        let outcome = solver.solve();
        assert_eq!(outcome.status, SolveStatus::Feasible);
        assert_eq!(outcome.stats.solutions, 1);
    }

    #[test]
    fn subscribing_unknown_variable_is_rejected() {
        let mut solver = ReferenceSolver::new(problem("pair"), SearchLimits::default());
        let id = solver.register(Box::new(CountingWatcher::default()));
        assert!(solver.watch_lower_bound(id, VarId(42)).is_err());
    }
}
