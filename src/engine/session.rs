// src/engine/session.rs

use tracing::{debug, error};

use crate::engine::core::TraceCore;
use crate::errors::TraceError;
use crate::solver::{BoundsView, Propagation, Schedule, SolutionObserver, Watcher};
use crate::trace::{TraceClock, TraceEmitter, TraceSummary};

/// IO shell around [`TraceCore`]: stamps batches with the clock and hands
/// the resulting events to the emitter.
///
/// Registered with the solver both as its watcher and as a solution
/// observer. The watcher never vetoes search; it only answers
/// [`Propagation::Stop`] after an invariant violation, which is kept in
/// `failure` for the caller.
pub struct TraceSession {
    core: TraceCore,
    emitter: TraceEmitter,
    clock: Box<dyn TraceClock>,
    failure: Option<TraceError>,
}

impl TraceSession {
    pub fn new(core: TraceCore, emitter: TraceEmitter, clock: Box<dyn TraceClock>) -> Self {
        Self {
            core,
            emitter,
            clock,
            failure: None,
        }
    }

    pub fn core(&self) -> &TraceCore {
        &self.core
    }

    /// Emit the task definitions and the search-start marker.
    pub fn begin(&mut self) {
        let ts = self.clock.now_ms();
        let definitions = self.core.definition_events(ts);
        self.emitter.emit_all(definitions);
        self.emitter.emit(self.core.search_started_event(ts));
    }

    pub fn take_failure(&mut self) -> Option<TraceError> {
        self.failure.take()
    }

    /// Close the trace document.
    pub fn finish(&mut self) -> TraceSummary {
        let summary = self.emitter.close();
        debug!(
            notifications = self.core.notifications(),
            events = summary.events_written,
            "trace session finished"
        );
        summary
    }
}

impl Watcher for TraceSession {
    fn propagate(&mut self, view: &dyn BoundsView) -> Propagation {
        if self.failure.is_some() {
            return Propagation::Stop;
        }

        let ts = self.clock.now_ms();
        match self.core.on_notify(view, ts) {
            Ok(events) => {
                self.emitter.emit_all(events);
                Propagation::Continue
            }
            Err(err) => {
                error!(error = %err, "search tree reconstruction failed; stopping search");
                self.failure = Some(err);
                Propagation::Stop
            }
        }
    }
}

impl SolutionObserver for TraceSession {
    fn on_solution(&mut self, schedule: &Schedule) {
        let ts = self.clock.now_ms();
        let events = self.core.solution_events(schedule, ts);
        self.emitter.emit_all(events);
    }
}
