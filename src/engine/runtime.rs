// src/engine/runtime.rs

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::engine::core::TraceCore;
use crate::engine::session::TraceSession;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::model::Problem;
use crate::solver::{ReferenceSolver, SearchLimits, SolveOutcome};
use crate::trace::{TraceClock, TraceEmitter, TraceMetadata, TraceSummary};

/// Name recorded in the trace metadata.
pub const SOLVER_NAME: &str = "searchtrace reference solver";

/// Everything needed for one traced solve.
#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub problem: Arc<Problem>,
    pub output: PathBuf,
    pub limits: SearchLimits,
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub trace: TraceSummary,
}

/// Run the reference solver with a trace session attached.
///
/// The session watches both bounds of every start variable and observes
/// improving schedules. Sink failures only degrade the trace; an invariant
/// violation in the reconstruction is returned as an error once the trace
/// has been closed.
///
/// Runs entirely on the calling thread.
pub fn run_traced_solve(
    request: &SolveRequest,
    fs: &dyn FileSystem,
    clock: Box<dyn TraceClock>,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<SolveReport> {
    let problem = Arc::clone(&request.problem);

    let mut solver = ReferenceSolver::new(Arc::clone(&problem), request.limits.clone());
    if let Some(flag) = cancel {
        solver.set_cancel_flag(flag);
    }
    let start_vars = solver.start_vars().to_vec();

    let core = TraceCore::new(Arc::clone(&problem), start_vars.clone())?;
    let metadata = TraceMetadata {
        project_name: problem.name().to_string(),
        total_tasks: problem.n_tasks(),
        solver: SOLVER_NAME.to_string(),
    };
    let emitter = TraceEmitter::open(fs, &request.output, &metadata);

    let session = Rc::new(RefCell::new(TraceSession::new(core, emitter, clock)));
    session.borrow_mut().begin();

    let id = solver.register(Box::new(Rc::clone(&session)));
    for &var in &start_vars {
        solver.watch_lower_bound(id, var)?;
        solver.watch_upper_bound(id, var)?;
    }
    solver.add_solution_observer(Box::new(Rc::clone(&session)));

    let outcome = solver.solve();
    drop(solver);

    let mut guard = session.borrow_mut();
    let trace = guard.finish();
    info!(
        path = ?trace.path,
        events = trace.events_written,
        degraded = trace.degraded,
        "trace written"
    );

    if let Some(err) = guard.take_failure() {
        return Err(err);
    }

    Ok(SolveReport { outcome, trace })
}
