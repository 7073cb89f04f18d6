// src/config/builtin.rs

//! Named instances shipped with the binary.
//!
//! Built-ins are declared column-wise (names, durations, successors,
//! demands) and then go through the same validation as instance files.

use crate::config::model::{InstanceFile, InstanceSection, RawInstanceFile, ResourceConfig, TaskConfig};
use crate::errors::{Result, TraceError};
use crate::types::TaskId;

const BUILTIN_NAMES: &[&str] = &["simple", "pair", "software"];

pub fn builtin_names() -> &'static [&'static str] {
    BUILTIN_NAMES
}

/// Look up a built-in instance by name.
pub fn builtin_instance(name: &str) -> Result<InstanceFile> {
    match name.trim().to_lowercase().as_str() {
        "simple" => simple(),
        "pair" => pair(),
        "software" => software(),
        other => Err(TraceError::UnknownInstance(format!(
            "'{other}' (available: {})",
            BUILTIN_NAMES.join(", ")
        ))),
    }
}

/// Five tasks in a chain over two resources.
fn simple() -> Result<InstanceFile> {
    from_columns(
        "simple",
        Some(20),
        &[("R0", 3), ("R1", 2)],
        &["Task 0", "Task 1", "Task 2", "Task 3", "Task 4"],
        &[3, 4, 2, 5, 3],
        &[&[1], &[2], &[3], &[4], &[]],
        &[&[2, 1], &[1, 2], &[2, 1], &[1, 1], &[2, 0]],
    )
}

/// Two tasks, one precedence, one unary resource.
fn pair() -> Result<InstanceFile> {
    from_columns(
        "pair",
        None,
        &[("machine", 1)],
        &["A", "B"],
        &[3, 4],
        &[&[1], &[]],
        &[&[1], &[1]],
    )
}

/// A small software project with contended developer and QA capacity.
fn software() -> Result<InstanceFile> {
    from_columns(
        "software",
        None,
        &[("developers", 2), ("qa", 1)],
        &[
            "Requirements",
            "Backend",
            "Frontend",
            "Database",
            "Integration",
            "Testing",
            "Documentation",
            "Release",
        ],
        &[2, 4, 3, 2, 2, 3, 2, 1],
        &[&[1, 2, 3], &[4], &[4], &[4], &[5, 6], &[7], &[7], &[]],
        &[
            &[1, 0],
            &[1, 0],
            &[1, 0],
            &[1, 0],
            &[2, 0],
            &[0, 1],
            &[1, 0],
            &[1, 1],
        ],
    )
}

/// Assemble an instance from index-aligned columns. Task ids are the column
/// positions.
pub(crate) fn from_columns(
    name: &str,
    horizon: Option<i64>,
    resources: &[(&str, i64)],
    names: &[&str],
    durations: &[i64],
    successors: &[&[TaskId]],
    demands: &[&[i64]],
) -> Result<InstanceFile> {
    let n = names.len();
    if durations.len() != n || successors.len() != n || demands.len() != n {
        return Err(TraceError::ConfigError(format!(
            "instance '{name}': column lengths differ (names {n}, durations {}, successors {}, demands {})",
            durations.len(),
            successors.len(),
            demands.len()
        )));
    }

    let tasks = (0..n)
        .map(|i| TaskConfig {
            id: i as TaskId,
            name: Some(names[i].to_string()),
            duration: durations[i],
            successors: successors[i].to_vec(),
            demands: demands[i].to_vec(),
        })
        .collect();

    let raw = RawInstanceFile {
        instance: InstanceSection {
            name: name.to_string(),
            horizon,
        },
        resources: resources
            .iter()
            .map(|(res_name, capacity)| ResourceConfig {
                name: Some(res_name.to_string()),
                capacity: *capacity,
            })
            .collect(),
        tasks,
    };

    InstanceFile::try_from(raw)
}
