// src/engine/mod.rs

//! Tracing engine.
//!
//! The pure reconstruction core lives in [`core`]; [`session`] adds the
//! clock and the trace sink and plugs into the solver protocol; [`runtime`]
//! wires a solver, a session and a filesystem together for one run.

pub mod core;
pub mod runtime;
pub mod session;

pub use core::TraceCore;
pub use runtime::{SOLVER_NAME, SolveReport, SolveRequest, run_traced_solve};
pub use session::TraceSession;
