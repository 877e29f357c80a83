/*!
 * Run-scoped shared state.
 *
 * One `RunContext` exists per translation run. It owns the progress
 * counters, the cooperative cancellation flag, and the terminal-failure
 * record, and fans progress/events out to the caller's sinks. Keeping this
 * per-run (instead of process-global) lets several files translate
 * concurrently without stepping on each other's cancellation.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::pipeline::events::{EventKind, EventSink, PipelineEvent};

/// Progress callback: percentage (0-100) plus a status message
pub type ProgressCallback = dyn Fn(u8, &str) + Send + Sync;

/// Record of the failure that halted a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalFailure {
    /// Provider message describing the failure
    pub message: String,
}

/// Shared state for one translation run
pub struct RunContext {
    total_lines: usize,
    completed_lines: AtomicUsize,
    active_lines: AtomicUsize,
    cancelled: AtomicBool,
    terminal_failure: Mutex<Option<TerminalFailure>>,
    progress: Option<Arc<ProgressCallback>>,
    events: Option<Arc<dyn EventSink>>,
}

impl RunContext {
    /// Create a context for a run over `total_lines` lines
    pub fn new(total_lines: usize) -> Self {
        Self {
            total_lines,
            completed_lines: AtomicUsize::new(0),
            active_lines: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            terminal_failure: Mutex::new(None),
            progress: None,
            events: None,
        }
    }

    /// Attach a progress callback
    pub fn with_progress(mut self, callback: Arc<ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Attach an event sink
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Total number of lines in this run
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Lines processed so far (translated or not)
    pub fn completed_lines(&self) -> usize {
        self.completed_lines.load(Ordering::SeqCst)
    }

    /// Lines currently claimed by workers
    pub fn active_lines(&self) -> usize {
        self.active_lines.load(Ordering::SeqCst)
    }

    /// Request cooperative cancellation of this run
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Record a terminal failure and stop the run. The first failure wins;
    /// later calls only keep the cancellation flag set.
    pub fn abort_terminal(&self, message: impl Into<String>) {
        let message = message.into();
        {
            let mut failure = self.terminal_failure.lock();
            if failure.is_none() {
                *failure = Some(TerminalFailure { message: message.clone() });
            }
        }
        self.cancelled.store(true, Ordering::SeqCst);
        self.emit(EventKind::Error, format!("Terminal failure, stopping run: {}", message));
    }

    /// The terminal failure that stopped this run, if any
    pub fn terminal_failure(&self) -> Option<TerminalFailure> {
        self.terminal_failure.lock().clone()
    }

    /// Account for lines handed to a worker
    pub fn lines_dispatched(&self, count: usize) {
        self.active_lines.fetch_add(count, Ordering::SeqCst);
    }

    /// Account for lines a worker finished with (translated or not) and
    /// report the new progress. Callers pair this with `lines_dispatched`
    /// using the same count.
    pub fn lines_processed(&self, count: usize, message: &str) {
        self.active_lines.fetch_sub(count, Ordering::SeqCst);
        self.completed_lines.fetch_add(count, Ordering::SeqCst);
        self.report_progress(message);
    }

    /// Current progress percentage, rounded; 100 once everything is processed
    pub fn percentage(&self) -> u8 {
        if self.total_lines == 0 {
            return 100;
        }
        let completed = self.completed_lines();
        (((completed * 100) + self.total_lines / 2) / self.total_lines).min(100) as u8
    }

    /// Invoke the progress callback with the current percentage
    pub fn report_progress(&self, message: &str) {
        if let Some(progress) = &self.progress {
            progress(self.percentage(), message);
        }
    }

    /// Emit an event to the sink, if one is attached
    pub fn emit(&self, kind: EventKind, message: impl Into<String>) {
        if let Some(events) = &self.events {
            events.record(PipelineEvent::new(kind, message));
        }
    }

    /// Emit an event with a structured payload
    pub fn emit_with_payload(&self, kind: EventKind, message: impl Into<String>, payload: Value) {
        if let Some(events) = &self.events {
            events.record(PipelineEvent::with_payload(kind, message, payload));
        }
    }
}
