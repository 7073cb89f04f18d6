// src/config/loader.rs

use std::path::Path;

use crate::config::model::{InstanceFile, RawInstanceFile};
use crate::errors::Result;
use crate::fs::FileSystem;

/// Load an instance file from a given path and return the raw `RawInstanceFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawInstanceFile> {
    let contents = fs.read_to_string(path.as_ref())?;
    parse_instance(&contents)
}

/// Parse TOML text into a raw instance.
pub fn parse_instance(contents: &str) -> Result<RawInstanceFile> {
    let raw: RawInstanceFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load an instance file from path and validate it.
///
/// Checks for:
/// - unknown or self-referencing successors,
/// - precedence cycles,
/// - duplicate ids, negative durations/capacities/demands.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<InstanceFile> {
    let raw = load_from_path(fs, &path)?;
    InstanceFile::try_from(raw)
}
