// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in precedence graph: {0}")]
    PrecedenceCycle(String),

    #[error("Unknown instance: {0}")]
    UnknownInstance(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Internal reconstruction state became inconsistent; continuing would
    /// corrupt the trace.
    #[error("Invariant violation: {message} (task {task:?}, event {kind}, stack depth {depth})")]
    InvariantViolation {
        message: String,
        task: Option<TaskId>,
        kind: &'static str,
        depth: usize,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TraceError {
    pub fn invariant(
        message: impl Into<String>,
        task: Option<TaskId>,
        kind: &'static str,
        depth: usize,
    ) -> Self {
        TraceError::InvariantViolation {
            message: message.into(),
            task,
            kind,
            depth,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TraceError>;
