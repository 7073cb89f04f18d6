// src/model/problem.rs

use std::collections::HashMap;

use crate::config::model::InstanceFile;
use crate::model::graph::PrecedenceGraph;
use crate::types::{TaskId, TaskIndex};

/// Immutable task description supplied to the tracing core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub duration: i64,
    /// Successor ids in declaration order.
    pub successors: Vec<TaskId>,
    /// Demand per resource, one entry per resource of the problem.
    pub demands: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub capacity: i64,
}

/// A resource-constrained scheduling problem with a fixed task order.
///
/// Tasks are addressed by dense [`TaskIndex`] everywhere inside the crate;
/// the id map is only consulted at the boundary where external ids arrive.
#[derive(Debug, Clone)]
pub struct Problem {
    name: String,
    tasks: Vec<Task>,
    resources: Vec<Resource>,
    horizon: i64,
    index_by_id: HashMap<TaskId, TaskIndex>,
    graph: PrecedenceGraph,
}

impl Problem {
    /// Build a problem from a validated instance.
    pub fn from_instance(inst: &InstanceFile) -> Self {
        let n_resources = inst.resources().len();

        let tasks: Vec<Task> = inst
            .tasks()
            .iter()
            .map(|tc| Task {
                id: tc.id,
                name: tc.effective_name(),
                duration: tc.duration,
                successors: tc.successors.clone(),
                demands: (0..n_resources).map(|r| tc.demand_on(r)).collect(),
            })
            .collect();

        let resources = inst
            .resources()
            .iter()
            .enumerate()
            .map(|(r, rc)| Resource {
                name: rc.effective_name(r),
                capacity: rc.capacity,
            })
            .collect();

        let index_by_id: HashMap<TaskId, TaskIndex> =
            tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

        // Validation guarantees every successor id is known.
        let successor_indices: Vec<Vec<TaskIndex>> = tasks
            .iter()
            .map(|t| {
                t.successors
                    .iter()
                    .filter_map(|id| index_by_id.get(id).copied())
                    .collect()
            })
            .collect();

        Self {
            name: inst.name().to_string(),
            tasks,
            resources,
            horizon: inst.effective_horizon(),
            index_by_id,
            graph: PrecedenceGraph::from_successors(&successor_indices),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, index: TaskIndex) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn n_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    pub fn graph(&self) -> &PrecedenceGraph {
        &self.graph
    }

    /// Dense index of an external task id.
    pub fn index_of(&self, id: TaskId) -> Option<TaskIndex> {
        self.index_by_id.get(&id).copied()
    }

    /// Ids of the tasks that must finish before `index` starts.
    pub fn predecessor_ids(&self, index: TaskIndex) -> Vec<TaskId> {
        self.graph
            .predecessors_of(index)
            .iter()
            .map(|&p| self.tasks[p].id)
            .collect()
    }

    /// Makespan of a full assignment of start times (index-aligned).
    pub fn makespan_of(&self, starts: &[i64]) -> i64 {
        self.tasks
            .iter()
            .zip(starts)
            .map(|(t, s)| s + t.duration)
            .max()
            .unwrap_or(0)
    }
}
