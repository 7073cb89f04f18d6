// src/trace/reader.rs

//! Reading traces back, including ones cut short by a crash.

use std::path::Path;

use tracing::warn;

use crate::errors::{Result, TraceError};
use crate::fs::FileSystem;
use crate::trace::event::{EventRecord, TraceDocument};

const EVENTS_OPEN: &str = "\"events\": [";

/// Parse a complete trace document.
pub fn parse_trace(text: &str) -> Result<TraceDocument> {
    Ok(serde_json::from_str(text)?)
}

/// Parse a trace, repairing one that lacks its closing delimiters.
///
/// Everything up to the opening of the events array must be intact. After
/// that, each line holding a complete event record is kept; the first line
/// that does not parse (a record torn mid-write) ends the recovery.
pub fn recover_trace(text: &str) -> Result<TraceDocument> {
    if let Ok(doc) = parse_trace(text) {
        return Ok(doc);
    }

    let header_end = text
        .find(EVENTS_OPEN)
        .map(|i| i + EVENTS_OPEN.len())
        .ok_or_else(|| TraceError::ConfigError("trace header is incomplete".into()))?;

    let mut doc = parse_trace(&format!("{}]}}", &text[..header_end]))?;

    for line in text[header_end..].lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with(']') {
            break;
        }
        match serde_json::from_str::<EventRecord>(line.trim_end_matches(',')) {
            Ok(record) => doc.events.push(record),
            Err(_) => break,
        }
    }

    Ok(doc)
}

/// Read a trace from disk, tolerating a missing footer.
pub fn read_trace(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<TraceDocument> {
    let text = fs.read_to_string(path.as_ref())?;
    match parse_trace(&text) {
        Ok(doc) => Ok(doc),
        Err(err) => {
            warn!(path = ?path.as_ref(), error = %err, "trace is not well-formed; recovering prefix");
            recover_trace(&text)
        }
    }
}
