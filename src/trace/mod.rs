// src/trace/mod.rs

//! Search-tree event reconstruction and persistence.
//!
//! Data flows one way: solver notification → [`tap::PropagationTap`] →
//! [`tree::SearchTree`] → [`emitter::TraceEmitter`].

pub mod clock;
pub mod emitter;
pub mod event;
pub mod reader;
pub mod tap;
pub mod tree;

pub use clock::{ManualClock, MonotonicClock, TraceClock};
pub use emitter::{TRACE_FOOTER, TRACE_VERSION, TraceEmitter, TraceSummary};
pub use event::{Event, EventKind, EventRecord, NodeId, NodeStatus, TraceDocument, TraceMetadata};
pub use reader::{parse_trace, read_trace, recover_trace};
pub use tap::{AssignmentRecord, Observation, PropagationTap};
pub use tree::{DecisionNode, SearchTree, Transition, TreeError};
