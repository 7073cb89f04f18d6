// src/model/graph.rs

use crate::types::TaskIndex;

/// Internal node structure: stores immediate predecessors and successors.
#[derive(Debug, Clone, Default)]
struct PrecedenceNode {
    /// Tasks that must finish before this one starts.
    predecessors: Vec<TaskIndex>,
    /// Tasks that may only start after this one finishes.
    successors: Vec<TaskIndex>,
}

/// In-memory precedence graph keyed by dense task index.
///
/// Acyclicity is validated when the instance is loaded; here we only keep
/// adjacency for propagation, trace definitions and diagnostics.
#[derive(Debug, Clone)]
pub struct PrecedenceGraph {
    nodes: Vec<PrecedenceNode>,
}

impl PrecedenceGraph {
    /// Build the graph from per-task successor lists (already resolved to
    /// dense indices).
    pub fn from_successors(successors: &[Vec<TaskIndex>]) -> Self {
        let mut nodes = vec![PrecedenceNode::default(); successors.len()];

        for (task, succs) in successors.iter().enumerate() {
            for &succ in succs {
                nodes[task].successors.push(succ);
                nodes[succ].predecessors.push(task);
            }
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn predecessors_of(&self, task: TaskIndex) -> &[TaskIndex] {
        self.nodes
            .get(task)
            .map(|n| n.predecessors.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors_of(&self, task: TaskIndex) -> &[TaskIndex] {
        self.nodes
            .get(task)
            .map(|n| n.successors.as_slice())
            .unwrap_or(&[])
    }

    /// All `(before, after)` edges in task order.
    pub fn edges(&self) -> impl Iterator<Item = (TaskIndex, TaskIndex)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(task, node)| node.successors.iter().map(move |&succ| (task, succ)))
    }

    /// Tasks without predecessors.
    pub fn roots(&self) -> impl Iterator<Item = TaskIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.predecessors.is_empty())
            .map(|(i, _)| i)
    }
}
