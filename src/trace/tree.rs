// src/trace/tree.rs

//! Best-effort decision tree rebuilt from observed fixations.
//!
//! The solver's real branching log is not visible, so the tree is a
//! linearization of the order in which fixations were observed:
//! - every first fixation opens a child of the active node,
//! - a re-fixation abandons the active node (one level up) and opens a
//!   sibling for the new value,
//! - narrowed bounds attach to the active node without moving it.
//!
//! Multi-level backjumps are never inferred.

use thiserror::Error;
use tracing::debug;

use crate::trace::event::{NodeId, NodeStatus};
use crate::trace::tap::Observation;
use crate::types::{Bounds, TaskIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub status: NodeStatus,
    /// `None` only for the root.
    pub task: Option<TaskIndex>,
    pub value: Option<i64>,
    pub level: usize,
}

/// State change produced by applying one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Decided {
        node: NodeId,
        parent: NodeId,
        task: TaskIndex,
        value: i64,
        level: usize,
    },
    Abandoned {
        node: NodeId,
        parent: Option<NodeId>,
        task: TaskIndex,
        from: i64,
        to: i64,
        target_level: usize,
    },
    Narrowed {
        node: NodeId,
        parent: Option<NodeId>,
        task: TaskIndex,
        bounds: Bounds,
        level: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("observation references unknown task index {0}")]
    UnknownTask(TaskIndex),
    #[error("backtrack would pop the root off the active path")]
    StackUnderflow,
    #[error("task index {0} fixed for the first time while already the active decision")]
    RepeatedDecision(TaskIndex),
}

impl TreeError {
    pub fn kind(&self) -> &'static str {
        match self {
            TreeError::UnknownTask(_) => "unknown_task",
            TreeError::StackUnderflow => "stack_underflow",
            TreeError::RepeatedDecision(_) => "repeated_decision",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    /// Append-only; `nodes[i].id == NodeId::new(i)`.
    nodes: Vec<DecisionNode>,
    /// Root at index 0, active node on top.
    path: Vec<NodeId>,
    current_task: Option<TaskIndex>,
    next_id: u32,
    n_tasks: usize,
}

impl SearchTree {
    pub fn new(n_tasks: usize) -> Self {
        let root = DecisionNode {
            id: NodeId::ROOT,
            parent: None,
            status: NodeStatus::Created,
            task: None,
            value: None,
            level: 0,
        };
        Self {
            nodes: vec![root],
            path: vec![NodeId::ROOT],
            current_task: None,
            next_id: 1,
            n_tasks,
        }
    }

    pub fn decision_level(&self) -> usize {
        self.path.len() - 1
    }

    pub fn active(&self) -> NodeId {
        self.path.last().copied().unwrap_or(NodeId::ROOT)
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn nodes(&self) -> &[DecisionNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&DecisionNode> {
        self.nodes.get(id.raw() as usize)
    }

    pub fn apply(&mut self, observation: Observation) -> Result<Vec<Transition>, TreeError> {
        let task = observation.task();
        if task >= self.n_tasks {
            return Err(TreeError::UnknownTask(task));
        }

        match observation {
            Observation::Fixed { value, .. } => {
                if self.current_task == Some(task) {
                    return Err(TreeError::RepeatedDecision(task));
                }
                Ok(vec![self.decide(task, value)])
            }
            Observation::Refixed {
                previous, value, ..
            } => {
                if self.path.len() < 2 {
                    return Err(TreeError::StackUnderflow);
                }
                let abandoned = self.abandon_active(task, previous, value)?;
                Ok(vec![abandoned, self.decide(task, value)])
            }
            Observation::Narrowed { bounds, .. } => {
                let node = self.active();
                Ok(vec![Transition::Narrowed {
                    node,
                    parent: self.node(node).and_then(|n| n.parent),
                    task,
                    bounds,
                    level: self.decision_level(),
                }])
            }
        }
    }

    fn decide(&mut self, task: TaskIndex, value: i64) -> Transition {
        let parent = self.active();
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        let level = self.path.len();

        self.nodes.push(DecisionNode {
            id,
            parent: Some(parent),
            status: NodeStatus::Created,
            task: Some(task),
            value: Some(value),
            level,
        });
        self.path.push(id);
        self.current_task = Some(task);
        debug!(node = %id, %parent, task, value, level, "decision node opened");

        Transition::Decided {
            node: id,
            parent,
            task,
            value,
            level,
        }
    }

    fn abandon_active(
        &mut self,
        task: TaskIndex,
        from: i64,
        to: i64,
    ) -> Result<Transition, TreeError> {
        let node = self.path.pop().ok_or(TreeError::StackUnderflow)?;
        let entry = self
            .nodes
            .get_mut(node.raw() as usize)
            .ok_or(TreeError::StackUnderflow)?;
        entry.status = NodeStatus::Pruned;
        let parent = entry.parent;
        debug!(node = %node, task, from, to, "decision node pruned");

        Ok(Transition::Abandoned {
            node,
            parent,
            task,
            from,
            to,
            target_level: self.decision_level(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixations_deepen_the_path() {
        let mut tree = SearchTree::new(3);
        tree.apply(Observation::Fixed { task: 0, value: 0 }).unwrap();
        let t = tree.apply(Observation::Fixed { task: 2, value: 4 }).unwrap();
        assert_eq!(
            t,
            vec![Transition::Decided {
                node: NodeId::new(2),
                parent: NodeId::new(1),
                task: 2,
                value: 4,
                level: 2,
            }]
        );
        assert_eq!(tree.decision_level(), 2);
    }

    #[test]
    fn refixation_prunes_active_node_and_opens_sibling() {
        let mut tree = SearchTree::new(2);
        tree.apply(Observation::Fixed { task: 1, value: 0 }).unwrap();
        tree.apply(Observation::Fixed { task: 0, value: 2 }).unwrap();

        let t = tree
            .apply(Observation::Refixed { task: 0, previous: 2, value: 5 })
            .unwrap();
        assert_eq!(
            t[0],
            Transition::Abandoned {
                node: NodeId::new(2),
                parent: Some(NodeId::new(1)),
                task: 0,
                from: 2,
                to: 5,
                target_level: 1,
            }
        );
        assert_eq!(
            t[1],
            Transition::Decided {
                node: NodeId::new(3),
                parent: NodeId::new(1),
                task: 0,
                value: 5,
                level: 2,
            }
        );
        assert_eq!(tree.node(NodeId::new(2)).unwrap().status, NodeStatus::Pruned);
        assert_eq!(tree.nodes().len(), 4);
    }

    #[test]
    fn narrowing_keeps_the_path() {
        let mut tree = SearchTree::new(2);
        tree.apply(Observation::Fixed { task: 0, value: 1 }).unwrap();
        let t = tree
            .apply(Observation::Narrowed { task: 1, bounds: Bounds::new(4, 9) })
            .unwrap();
        assert!(matches!(t[0], Transition::Narrowed { node, level: 1, .. } if node == NodeId::new(1)));
        assert_eq!(tree.decision_level(), 1);
    }

    #[test]
    fn invalid_observations_are_rejected() {
        let mut tree = SearchTree::new(1);
        assert_eq!(
            tree.apply(Observation::Fixed { task: 7, value: 0 }),
            Err(TreeError::UnknownTask(7))
        );
        assert_eq!(
            tree.apply(Observation::Refixed { task: 0, previous: 1, value: 2 }),
            Err(TreeError::StackUnderflow)
        );
        tree.apply(Observation::Fixed { task: 0, value: 1 }).unwrap();
        assert_eq!(
            tree.apply(Observation::Fixed { task: 0, value: 1 }),
            Err(TreeError::RepeatedDecision(0))
        );
    }
}
