// src/config/mod.rs

//! Instance loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed instance model (`model.rs`).
//! - Load an instance file through the filesystem abstraction (`loader.rs`).
//! - Validate ids, demands and precedence acyclicity (`validate.rs`).
//! - Provide the built-in named instances (`builtin.rs`).

pub mod builtin;
pub mod loader;
pub mod model;
pub mod validate;

pub use builtin::{builtin_instance, builtin_names};
pub use loader::{load_and_validate, load_from_path, parse_instance};
pub use model::{
    InstanceFile, InstanceSection, MAX_HORIZON, RawInstanceFile, ResourceConfig, TaskConfig,
};
pub use validate::validate_raw_instance;
