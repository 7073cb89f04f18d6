// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{InstanceFile, MAX_HORIZON, RawInstanceFile, total_duration};
use crate::errors::{Result, TraceError};
use crate::types::TaskId;

impl TryFrom<RawInstanceFile> for InstanceFile {
    type Error = TraceError;

    fn try_from(raw: RawInstanceFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_instance(&raw)?;
        Ok(InstanceFile::new_unchecked(raw.instance, raw.resources, raw.tasks))
    }
}

pub fn validate_raw_instance(cfg: &RawInstanceFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global(cfg)?;
    validate_tasks(cfg)?;
    validate_successors(cfg)?;
    validate_precedence_graph(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawInstanceFile) -> Result<()> {
    if cfg.tasks.is_empty() {
        return Err(TraceError::ConfigError(
            "instance must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global(cfg: &RawInstanceFile) -> Result<()> {
    match cfg.instance.horizon {
        Some(horizon) if horizon < 0 => {
            return Err(TraceError::ConfigError(format!(
                "[instance].horizon must be >= 0 (got {horizon})"
            )));
        }
        Some(horizon) if horizon > MAX_HORIZON => {
            return Err(TraceError::ConfigError(format!(
                "[instance].horizon must be <= {MAX_HORIZON} (got {horizon})"
            )));
        }
        Some(_) => {}
        None => match total_duration(&cfg.tasks) {
            Some(total) if total <= MAX_HORIZON => {}
            _ => {
                return Err(TraceError::ConfigError(format!(
                    "no [instance].horizon given and the total task duration exceeds {MAX_HORIZON}"
                )));
            }
        },
    }

    for (r, res) in cfg.resources.iter().enumerate() {
        if res.capacity < 0 {
            return Err(TraceError::ConfigError(format!(
                "resource '{}' has negative capacity {}",
                res.effective_name(r),
                res.capacity
            )));
        }
    }

    Ok(())
}

fn validate_tasks(cfg: &RawInstanceFile) -> Result<()> {
    let mut seen: HashSet<TaskId> = HashSet::new();

    for task in cfg.tasks.iter() {
        if !seen.insert(task.id) {
            return Err(TraceError::ConfigError(format!(
                "task id {} is declared more than once",
                task.id
            )));
        }
        if task.duration < 0 {
            return Err(TraceError::ConfigError(format!(
                "task {} has negative duration {}",
                task.id, task.duration
            )));
        }
        if task.duration > MAX_HORIZON {
            return Err(TraceError::ConfigError(format!(
                "task {} has duration {} above the limit {MAX_HORIZON}",
                task.id, task.duration
            )));
        }
        if task.demands.len() > cfg.resources.len() {
            return Err(TraceError::ConfigError(format!(
                "task {} lists {} demands but only {} resources are declared",
                task.id,
                task.demands.len(),
                cfg.resources.len()
            )));
        }
        if let Some(d) = task.demands.iter().find(|d| **d < 0) {
            return Err(TraceError::ConfigError(format!(
                "task {} has negative demand {}",
                task.id, d
            )));
        }
    }

    Ok(())
}

fn validate_successors(cfg: &RawInstanceFile) -> Result<()> {
    let ids: HashSet<TaskId> = cfg.tasks.iter().map(|t| t.id).collect();

    for task in cfg.tasks.iter() {
        for succ in task.successors.iter() {
            if *succ == task.id {
                return Err(TraceError::ConfigError(format!(
                    "task {} cannot be its own successor",
                    task.id
                )));
            }
            if !ids.contains(succ) {
                return Err(TraceError::ConfigError(format!(
                    "task {} has unknown successor {}",
                    task.id, succ
                )));
            }
        }
    }
    Ok(())
}

fn validate_precedence_graph(cfg: &RawInstanceFile) -> Result<()> {
    // Edge direction: task -> successor.
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();

    for task in cfg.tasks.iter() {
        graph.add_node(task.id);
    }

    for task in cfg.tasks.iter() {
        for succ in task.successors.iter() {
            graph.add_edge(task.id, *succ, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(TraceError::PrecedenceCycle(format!(
            "cycle detected in precedence graph involving task {}",
            cycle.node_id()
        ))),
    }
}
