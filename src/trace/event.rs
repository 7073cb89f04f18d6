// src/trace/event.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::TaskId;

/// Identifier of a reconstructed decision node. `ROOT` is the synthetic
/// sentinel that exists before any event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("root")
        } else {
            write!(f, "node_{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Created,
    Pruned,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Created => "created",
            NodeStatus::Pruned => "pruned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Assigned,
    BoundsChanged,
    Scheduled,
    Backtrack,
    SearchStarted,
    Defined,
    FinalSolution,
}

impl EventKind {
    /// Value of the `type` field in the trace file.
    pub fn wire_type(&self) -> &'static str {
        match self {
            EventKind::Assigned | EventKind::FinalSolution => "assign",
            EventKind::BoundsChanged | EventKind::Defined => "modify",
            EventKind::Scheduled | EventKind::SearchStarted => "start",
            EventKind::Backtrack => "remove",
        }
    }

    /// Tag used inside event ids; unique per kind.
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::Assigned => "assigned",
            EventKind::BoundsChanged => "bounds_changed",
            EventKind::Scheduled => "scheduled",
            EventKind::Backtrack => "backtrack",
            EventKind::SearchStarted => "search_started",
            EventKind::Defined => "defined",
            EventKind::FinalSolution => "final_solution",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One semantic trace event. Immutable once handed to the emitter (apart
/// from timestamp clamping).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub task_id: TaskId,
    pub task_name: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub decision_level: Option<usize>,
    pub backtrack_to_level: Option<usize>,
    pub node_id: Option<NodeId>,
    pub parent_node_id: Option<NodeId>,
    pub node_status: Option<NodeStatus>,
    pub description: String,
    pub dependencies: Option<Vec<TaskId>>,
    pub successors: Option<Vec<TaskId>>,
}

impl Event {
    pub fn new(
        kind: EventKind,
        timestamp_ms: u64,
        task_id: TaskId,
        task_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            timestamp_ms,
            task_id,
            task_name: task_name.into(),
            start_time: None,
            end_time: None,
            decision_level: None,
            backtrack_to_level: None,
            node_id: None,
            parent_node_id: None,
            node_status: None,
            description: description.into(),
            dependencies: None,
            successors: None,
        }
    }

    pub fn with_window(mut self, start: i64, end: i64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn at_level(mut self, level: usize) -> Self {
        self.decision_level = Some(level);
        self
    }

    pub fn on_node(mut self, node: NodeId, parent: Option<NodeId>, status: NodeStatus) -> Self {
        self.node_id = Some(node);
        self.parent_node_id = parent;
        self.node_status = Some(status);
        self
    }

    pub fn backtracking_to(mut self, level: usize) -> Self {
        self.backtrack_to_level = Some(level);
        self
    }

    pub fn with_links(mut self, dependencies: Vec<TaskId>, successors: Vec<TaskId>) -> Self {
        self.dependencies = Some(dependencies);
        self.successors = Some(successors);
        self
    }

    /// `"<taskId>_<kind>_<timestamp>"`
    pub fn record_id(&self) -> String {
        format!("{}_{}_{}", self.task_id, self.kind.tag(), self.timestamp_ms)
    }

    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            id: self.record_id(),
            kind: self.kind.wire_type().to_string(),
            task_id: self.task_id.to_string(),
            task_name: self.task_name.clone(),
            timestamp: self.timestamp_ms,
            start_time: self.start_time,
            end_time: self.end_time,
            decision_level: self.decision_level,
            backtrack_to_level: self.backtrack_to_level,
            node_id: self.node_id.map(|n| n.to_string()),
            parent_node_id: self.parent_node_id.map(|n| n.to_string()),
            node_status: self.node_status.map(|s| s.as_str().to_string()),
            description: self.description.clone(),
            dependencies: self.dependencies.clone(),
            successors: self.successors.clone(),
        }
    }
}

/// Serialized shape of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub task_id: String,
    #[serde(default)]
    pub task_name: String,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtrack_to_level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_status: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<TaskId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successors: Option<Vec<TaskId>>,
}

impl EventRecord {
    /// Kind tag recovered from the record id, e.g. `"backtrack"`.
    pub fn kind_tag(&self) -> Option<&str> {
        let (_, rest) = self.id.split_once('_')?;
        let (tag, _) = rest.rsplit_once('_')?;
        Some(tag)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceMetadata {
    pub project_name: String,
    pub total_tasks: usize,
    pub solver: String,
}

/// A complete trace file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceDocument {
    pub version: String,
    #[serde(default)]
    pub metadata: TraceMetadata,
    pub events: Vec<EventRecord>,
}
