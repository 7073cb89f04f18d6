#![allow(dead_code)]

use std::sync::Arc;

use searchtrace::config::{InstanceFile, InstanceSection, RawInstanceFile, ResourceConfig, TaskConfig};
use searchtrace::errors::Result;
use searchtrace::model::Problem;
use searchtrace::types::TaskId;

/// Builder for `InstanceFile` to simplify test setup.
pub struct InstanceBuilder {
    raw: RawInstanceFile,
}

impl InstanceBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            raw: RawInstanceFile {
                instance: InstanceSection {
                    name: name.to_string(),
                    horizon: None,
                },
                resources: vec![],
                tasks: vec![],
            },
        }
    }

    pub fn horizon(mut self, horizon: i64) -> Self {
        self.raw.instance.horizon = Some(horizon);
        self
    }

    pub fn resource(mut self, name: &str, capacity: i64) -> Self {
        self.raw.resources.push(ResourceConfig {
            name: Some(name.to_string()),
            capacity,
        });
        self
    }

    pub fn task(mut self, task: TaskConfig) -> Self {
        self.raw.tasks.push(task);
        self
    }

    pub fn raw(self) -> RawInstanceFile {
        self.raw
    }

    pub fn try_build(self) -> Result<InstanceFile> {
        InstanceFile::try_from(self.raw)
    }

    pub fn build(self) -> InstanceFile {
        self.try_build()
            .expect("Failed to build valid instance from builder")
    }

    pub fn build_problem(self) -> Arc<Problem> {
        Arc::new(Problem::from_instance(&self.build()))
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(id: TaskId, duration: i64) -> Self {
        Self {
            task: TaskConfig {
                id,
                name: None,
                duration,
                successors: vec![],
                demands: vec![],
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = Some(name.to_string());
        self
    }

    pub fn before(mut self, successor: TaskId) -> Self {
        self.task.successors.push(successor);
        self
    }

    pub fn demands(mut self, demands: &[i64]) -> Self {
        self.task.demands = demands.to_vec();
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Tasks A (duration 3) and B (duration 4), A before B, sharing one
/// unit-capacity machine.
pub fn pair_problem() -> Arc<Problem> {
    InstanceBuilder::new("pair")
        .resource("machine", 1)
        .task(TaskConfigBuilder::new(0, 3).name("A").before(1).demands(&[1]).build())
        .task(TaskConfigBuilder::new(1, 4).name("B").demands(&[1]).build())
        .build_problem()
}

/// `n` independent unit tasks with no resources.
pub fn independent_problem(n: usize) -> Arc<Problem> {
    let mut builder = InstanceBuilder::new("independent");
    for id in 0..n {
        builder = builder.task(TaskConfigBuilder::new(id as TaskId, 1).build());
    }
    builder.build_problem()
}
