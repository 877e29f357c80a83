/*!
 * Structured pipeline events.
 *
 * The pipeline reports what it is doing through an optional event sink:
 * requests issued, responses received, retries, terminal aborts,
 * verification rounds. The controller captures these and writes an issues
 * file when a run ends badly; tests use the capture to assert on pipeline
 * behavior.
 */

use std::fmt;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde_json::Value;

/// Kind of a pipeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Info,
    Request,
    Response,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Info => "info",
            EventKind::Request => "request",
            EventKind::Response => "response",
            EventKind::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// One structured event emitted by the pipeline
#[derive(Debug, Clone)]
pub struct PipelineEvent {
    /// When the event was emitted
    pub timestamp: DateTime<Local>,
    /// Event kind
    pub kind: EventKind,
    /// Human-readable message
    pub message: String,
    /// Optional structured payload
    pub payload: Option<Value>,
}

impl PipelineEvent {
    /// Create an event without payload
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            message: message.into(),
            payload: None,
        }
    }

    /// Create an event with a structured payload
    pub fn with_payload(kind: EventKind, message: impl Into<String>, payload: Value) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            message: message.into(),
            payload: Some(payload),
        }
    }

    /// Render the event as one log line
    pub fn format_line(&self) -> String {
        let timestamp = self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        match &self.payload {
            Some(payload) => format!("[{}] [{}] {} {}", timestamp, self.kind, self.message, payload),
            None => format!("[{}] [{}] {}", timestamp, self.kind, self.message),
        }
    }
}

/// Sink for pipeline events
pub trait EventSink: Send + Sync {
    /// Record one event
    fn record(&self, event: PipelineEvent);
}

/// In-memory event capture used by the controller and by tests
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<PipelineEvent>>,
}

impl EventLog {
    /// Create an empty event log
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all captured events, in emission order
    pub fn snapshot(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    /// Number of captured events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether anything was captured
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Number of error events captured
    pub fn error_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == EventKind::Error)
            .count()
    }

    /// Render all events as issue-file lines
    pub fn render(&self) -> String {
        let events = self.events.lock();
        let mut out = String::new();
        for event in events.iter() {
            out.push_str(&event.format_line());
            out.push('\n');
        }
        out
    }
}

impl EventSink for EventLog {
    fn record(&self, event: PipelineEvent) {
        self.events.lock().push(event);
    }
}
