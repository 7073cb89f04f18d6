// src/trace/emitter.rs

//! Append-only, flush-per-event trace writer.
//!
//! File layout:
//!
//! ```text
//! {
//!   "version": "1.0",
//!   "metadata": {...},
//!   "events": [
//!     {...},
//!     {...}
//!   ]
//! }
//! ```
//!
//! Every event is flushed as soon as it is written, so a killed process
//! leaves a valid prefix that only lacks the closing `\n  ]\n}\n`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::trace::event::{Event, TraceMetadata};

pub const TRACE_VERSION: &str = "1.0";

/// Delimiters that close the events array and the document.
pub const TRACE_FOOTER: &str = "\n  ]\n}\n";

enum Sink {
    Open(Box<dyn Write + Send>),
    Disabled,
}

/// Outcome of a traced run from the emitter's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSummary {
    pub path: PathBuf,
    pub events_written: u64,
    pub events_dropped: u64,
    /// The sink failed to open or failed mid-run.
    pub degraded: bool,
    /// Closing delimiters were written.
    pub complete: bool,
}

pub struct TraceEmitter {
    sink: Sink,
    path: PathBuf,
    events_written: u64,
    events_dropped: u64,
    last_timestamp: u64,
    degraded: bool,
    complete: bool,
}

impl TraceEmitter {
    /// Create the trace file and write its header.
    ///
    /// Never fails: an unopenable sink is logged once and the emitter turns
    /// into a no-op so the solve is unaffected.
    pub fn open(fs: &dyn FileSystem, path: impl AsRef<Path>, metadata: &TraceMetadata) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut emitter = Self {
            sink: Sink::Disabled,
            path,
            events_written: 0,
            events_dropped: 0,
            last_timestamp: 0,
            degraded: false,
            complete: false,
        };

        match fs.create(&emitter.path) {
            Ok(writer) => {
                emitter.sink = Sink::Open(writer);
                let header = match serde_json::to_string(metadata) {
                    Ok(meta) => format!(
                        "{{\n  \"version\": \"{TRACE_VERSION}\",\n  \"metadata\": {meta},\n  \"events\": [\n"
                    ),
                    Err(err) => {
                        emitter.degrade(&err);
                        return emitter;
                    }
                };
                emitter.write_all(header.as_bytes());
                debug!(path = ?emitter.path, "trace sink opened");
            }
            Err(err) => {
                warn!(
                    path = ?emitter.path,
                    error = %err,
                    "cannot open trace sink; tracing disabled for this run"
                );
                emitter.degraded = true;
            }
        }

        emitter
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.sink, Sink::Open(_))
    }

    /// Append one record and flush. Timestamps lower than the previous
    /// event's are raised to keep the file non-decreasing.
    pub fn emit(&mut self, mut event: Event) {
        if !self.is_enabled() {
            self.events_dropped += 1;
            return;
        }

        event.timestamp_ms = event.timestamp_ms.max(self.last_timestamp);
        self.last_timestamp = event.timestamp_ms;

        let json = match serde_json::to_string(&event.to_record()) {
            Ok(json) => json,
            Err(err) => {
                self.degrade(&err);
                self.events_dropped += 1;
                return;
            }
        };

        let separator = if self.events_written == 0 { "" } else { ",\n" };
        let line = format!("{separator}    {json}");
        if self.write_all(line.as_bytes()) {
            self.events_written += 1;
        } else {
            self.events_dropped += 1;
        }
    }

    pub fn emit_all(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Write the closing delimiters. Idempotent.
    pub fn close(&mut self) -> TraceSummary {
        if self.is_enabled() && self.write_all(TRACE_FOOTER.as_bytes()) {
            self.complete = true;
            debug!(path = ?self.path, events = self.events_written, "trace sink closed");
        }
        self.sink = Sink::Disabled;
        self.summary()
    }

    pub fn summary(&self) -> TraceSummary {
        TraceSummary {
            path: self.path.clone(),
            events_written: self.events_written,
            events_dropped: self.events_dropped,
            degraded: self.degraded,
            complete: self.complete,
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> bool {
        let Sink::Open(writer) = &mut self.sink else {
            return false;
        };
        let result = writer.write_all(bytes).and_then(|_| writer.flush());
        match result {
            Ok(()) => true,
            Err(err) => {
                self.degrade(&err);
                false
            }
        }
    }

    fn degrade(&mut self, err: &dyn std::error::Error) {
        if !self.degraded {
            warn!(
                path = ?self.path,
                error = %err,
                "trace sink failed; dropping further events"
            );
        }
        self.degraded = true;
        self.sink = Sink::Disabled;
    }
}

impl Drop for TraceEmitter {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::trace::event::EventKind;
    use crate::trace::reader::parse_trace;

    fn meta() -> TraceMetadata {
        TraceMetadata {
            project_name: "unit".into(),
            total_tasks: 1,
            solver: "test".into(),
        }
    }

    fn event(ts: u64) -> Event {
        Event::new(EventKind::Assigned, ts, 0, "Task 0", "Start variable fixed to 1")
    }

    #[test]
    fn closed_trace_parses_with_metadata() {
        let fs = MockFileSystem::new();
        let mut emitter = TraceEmitter::open(&fs, "out.json", &meta());
        emitter.emit(event(1));
        emitter.emit(event(2));
        let summary = emitter.close();
        assert!(summary.complete);
        assert_eq!(summary.events_written, 2);

        let doc = parse_trace(&fs.contents_string("out.json").unwrap()).unwrap();
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.metadata, meta());
        assert_eq!(doc.events.len(), 2);
    }

    #[test]
    fn timestamps_never_decrease() {
        let fs = MockFileSystem::new();
        let mut emitter = TraceEmitter::open(&fs, "out.json", &meta());
        emitter.emit(event(10));
        emitter.emit(event(4));
        emitter.close();

        let doc = parse_trace(&fs.contents_string("out.json").unwrap()).unwrap();
        let stamps: Vec<u64> = doc.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![10, 10]);
    }

    #[test]
    fn denied_sink_becomes_no_op() {
        let fs = MockFileSystem::new();
        fs.deny("out.json");
        let mut emitter = TraceEmitter::open(&fs, "out.json", &meta());
        assert!(!emitter.is_enabled());
        emitter.emit(event(1));
        let summary = emitter.close();
        assert!(summary.degraded);
        assert_eq!(summary.events_dropped, 1);
        assert!(fs.contents("out.json").is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let fs = MockFileSystem::new();
        let mut emitter = TraceEmitter::open(&fs, "out.json", &meta());
        emitter.close();
        emitter.close();
        drop(emitter);
        let text = fs.contents_string("out.json").unwrap();
        assert_eq!(text.matches(TRACE_FOOTER).count(), 1);
    }
}
