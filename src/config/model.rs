// src/config/model.rs

use serde::Deserialize;

use crate::types::TaskId;

/// Problem instance as read from a TOML file, before validation.
///
/// ```toml
/// [instance]
/// name = "demo"
/// horizon = 20
///
/// [[resource]]
/// name = "crew"
/// capacity = 3
///
/// [[task]]
/// id = 0
/// name = "Excavate"
/// duration = 3
/// successors = [1]
/// demands = [2]
/// ```
///
/// All sections except `[[task]]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInstanceFile {
    #[serde(default)]
    pub instance: InstanceSection,

    /// All resources from `[[resource]]`, in declaration order.
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceConfig>,

    /// All tasks from `[[task]]`, in declaration order.
    ///
    /// Declaration order is the fixed iteration order used for tracing.
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskConfig>,
}

/// `[instance]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceSection {
    #[serde(default = "default_instance_name")]
    pub name: String,

    /// Latest completion time any task may have. Defaults to the sum of all
    /// durations, which always admits a serial schedule.
    #[serde(default)]
    pub horizon: Option<i64>,
}

/// Largest horizon (and task duration) accepted. Start-time arithmetic adds
/// a few of these together and must stay inside `i64`.
pub const MAX_HORIZON: i64 = 1 << 60;

/// Sum of all durations, `None` on overflow.
pub fn total_duration(tasks: &[TaskConfig]) -> Option<i64> {
    tasks
        .iter()
        .try_fold(0i64, |acc, t| acc.checked_add(t.duration))
}

fn default_instance_name() -> String {
    "unnamed".to_string()
}

impl Default for InstanceSection {
    fn default() -> Self {
        Self {
            name: default_instance_name(),
            horizon: None,
        }
    }
}

/// `[[resource]]` entry: a renewable resource with a fixed capacity.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub capacity: i64,
}

/// `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub id: TaskId,

    #[serde(default)]
    pub name: Option<String>,

    pub duration: i64,

    /// Tasks that may only start once this one has finished.
    #[serde(default)]
    pub successors: Vec<TaskId>,

    /// Demand per resource, index-aligned with `[[resource]]`.
    ///
    /// Shorter vectors are padded with zeros.
    #[serde(default)]
    pub demands: Vec<i64>,
}

impl TaskConfig {
    pub fn effective_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Task {}", self.id))
    }

    /// Demand on resource `r`, zero when not listed.
    pub fn demand_on(&self, r: usize) -> i64 {
        self.demands.get(r).copied().unwrap_or(0)
    }
}

impl ResourceConfig {
    pub fn effective_name(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("R{index}"))
    }
}

/// A validated instance. Only obtainable through
/// `InstanceFile::try_from(RawInstanceFile)`.
#[derive(Debug, Clone)]
pub struct InstanceFile {
    instance: InstanceSection,
    resources: Vec<ResourceConfig>,
    tasks: Vec<TaskConfig>,
}

impl InstanceFile {
    pub(crate) fn new_unchecked(
        instance: InstanceSection,
        resources: Vec<ResourceConfig>,
        tasks: Vec<TaskConfig>,
    ) -> Self {
        Self {
            instance,
            resources,
            tasks,
        }
    }

    pub fn name(&self) -> &str {
        &self.instance.name
    }

    pub fn resources(&self) -> &[ResourceConfig] {
        &self.resources
    }

    pub fn tasks(&self) -> &[TaskConfig] {
        &self.tasks
    }

    pub fn effective_horizon(&self) -> i64 {
        // Validation bounds the total by MAX_HORIZON.
        self.instance
            .horizon
            .unwrap_or_else(|| total_duration(&self.tasks).unwrap_or(MAX_HORIZON))
    }
}
