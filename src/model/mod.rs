// src/model/mod.rs

//! Scheduling model handed to the solver and the tracing core.
//!
//! - [`problem`] holds tasks, resources and the horizon, with dense task
//!   indices and an id lookup for the boundary.
//! - [`graph`] keeps precedence adjacency by index.

pub mod graph;
pub mod problem;

pub use graph::PrecedenceGraph;
pub use problem::{Problem, Resource, Task};
