/*!
 * Concurrent chunk processing with bounded retries.
 *
 * A fixed set of workers drains a shared queue of chunks. Each chunk moves
 * through an explicit state machine: Pending -> Attempting(n) -> one of
 * Resolved, Exhausted or Aborted. Partial replies bank whatever arrived and
 * only the still-missing lines go out again on the next attempt. Transient
 * provider failures cost an attempt and back off linearly; a terminal
 * failure aborts the entire run.
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;

use crate::pipeline::chunk::TranslationChunk;
use crate::pipeline::events::EventKind;
use crate::pipeline::run_context::RunContext;
use crate::providers::{RequestLine, TranslationRequest, Translator};
use crate::subtitle_processor::SubtitleEntry;

/// Retry policy for chunk attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per chunk, first try included
    pub max_attempts: u32,

    /// Base backoff in milliseconds; the sleep after attempt n is n * base
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1000,
        }
    }
}

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent workers
    pub concurrency: usize,

    /// Retry policy applied to every chunk
    pub retry: RetryPolicy,

    /// Pause before dispatching any chunk after the first, in milliseconds
    pub rate_limit_delay_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            retry: RetryPolicy::default(),
            rate_limit_delay_ms: 500,
        }
    }
}

/// Lifecycle of one chunk inside the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Queued, no attempt started yet
    Pending,
    /// Attempt n (1-based) is about to run
    Attempting(u32),
    /// Every line has a translation
    Resolved,
    /// Attempts used up with lines still missing
    Exhausted,
    /// A run-level stop ended the chunk early
    Aborted,
}

/// How a chunk left the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Every line resolved
    Resolved,
    /// Lines still missing after the final attempt
    Exhausted,
    /// Cancelled or terminally failed before completion
    Aborted,
}

/// Result of processing one chunk
#[derive(Debug)]
pub struct ChunkResult {
    /// Chunk position in the plan
    pub index: usize,

    /// Human-readable chunk label
    pub label: String,

    /// Number of lines the chunk owns
    pub line_count: usize,

    /// How the chunk ended
    pub outcome: ChunkOutcome,

    /// Attempts actually started
    pub attempts: u32,

    /// Translations collected across attempts, keyed by line id.
    /// The pool drains this map into its merged result.
    pub resolved: HashMap<usize, String>,
}

/// Lines in `chunk` that still need a translation, counting both what the
/// input already carried and what earlier attempts resolved.
fn pending_lines<'a>(
    chunk: &'a TranslationChunk,
    resolved: &HashMap<usize, String>,
) -> Vec<&'a SubtitleEntry> {
    chunk
        .entries
        .iter()
        .filter(|e| e.is_untranslated() && !resolved.contains_key(&e.id))
        .collect()
}

/// Drive one chunk through its state machine until it settles
///
/// A chunk whose lines are all translated already resolves without a single
/// provider call, which is what makes re-running an interrupted file cheap.
pub async fn process_chunk(
    chunk: &TranslationChunk,
    translator: &dyn Translator,
    template: &TranslationRequest,
    budgets: &HashMap<usize, u64>,
    ctx: &RunContext,
    policy: &RetryPolicy,
) -> ChunkResult {
    let mut state = ChunkState::Pending;
    let mut resolved: HashMap<usize, String> = HashMap::new();
    let mut attempts = 0u32;

    let outcome = loop {
        state = match state {
            ChunkState::Pending => {
                if pending_lines(chunk, &resolved).is_empty() {
                    debug!("{}: nothing to translate", chunk.label());
                    ChunkState::Resolved
                } else if ctx.is_cancelled() {
                    ChunkState::Aborted
                } else {
                    ChunkState::Attempting(1)
                }
            }

            ChunkState::Attempting(attempt) => {
                if ctx.is_cancelled() {
                    ChunkState::Aborted
                } else {
                    attempts = attempt;
                    run_attempt(chunk, translator, template, budgets, ctx, &mut resolved, attempt)
                        .await;

                    if pending_lines(chunk, &resolved).is_empty() {
                        ChunkState::Resolved
                    } else if ctx.is_cancelled() {
                        ChunkState::Aborted
                    } else if attempt >= policy.max_attempts {
                        ChunkState::Exhausted
                    } else {
                        ctx.report_progress(&format!(
                            "Retrying {} (attempt {}/{})",
                            chunk.label(),
                            attempt + 1,
                            policy.max_attempts
                        ));
                        let delay_ms = policy.backoff_ms * attempt as u64;
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        ChunkState::Attempting(attempt + 1)
                    }
                }
            }

            ChunkState::Resolved => break ChunkOutcome::Resolved,
            ChunkState::Exhausted => {
                error!(
                    "{}: {} lines still missing after {} attempts",
                    chunk.label(),
                    pending_lines(chunk, &resolved).len(),
                    attempts
                );
                break ChunkOutcome::Exhausted;
            }
            ChunkState::Aborted => break ChunkOutcome::Aborted,
        };
    };

    ChunkResult {
        index: chunk.index,
        label: chunk.label(),
        line_count: chunk.line_count(),
        outcome,
        attempts,
        resolved,
    }
}

/// Run a single attempt: send the still-pending lines, bank whatever the
/// reply resolves. Terminal provider failures abort the run here.
async fn run_attempt(
    chunk: &TranslationChunk,
    translator: &dyn Translator,
    template: &TranslationRequest,
    budgets: &HashMap<usize, u64>,
    ctx: &RunContext,
    resolved: &mut HashMap<usize, String>,
    attempt: u32,
) {
    let pending = pending_lines(chunk, resolved);
    let lines: Vec<RequestLine> = pending
        .iter()
        .map(|e| RequestLine::for_entry(e, budgets.get(&e.id).copied()))
        .collect();

    let request = template.for_lines(lines, chunk.previous_context.clone());
    let requested = request.line_ids();

    debug!(
        "{}: attempt {} with {} pending lines",
        chunk.label(),
        attempt,
        requested.len()
    );
    ctx.emit_with_payload(
        EventKind::Request,
        format!("{}: attempt {}", chunk.label(), attempt),
        json!({ "lines": requested.len() }),
    );

    match translator.translate_lines(&request).await {
        Ok(outcome) => {
            let missing = outcome.missing_from(&requested);
            for (id, text) in outcome.resolved {
                if requested.contains(&id) && !text.trim().is_empty() {
                    resolved.insert(id, text);
                }
            }

            if missing.is_empty() {
                ctx.emit(
                    EventKind::Response,
                    format!("{}: attempt {} resolved all lines", chunk.label(), attempt),
                );
            } else {
                warn!(
                    "{}: reply missing {} of {} lines",
                    chunk.label(),
                    missing.len(),
                    requested.len()
                );
                ctx.emit_with_payload(
                    EventKind::Response,
                    format!("{}: attempt {} left lines unresolved", chunk.label(), attempt),
                    json!({ "missing": missing }),
                );
            }
        }

        Err(err) if err.is_terminal() => {
            error!("{}: terminal provider failure: {}", chunk.label(), err);
            ctx.abort_terminal(err.to_string());
        }

        Err(err) => {
            warn!("{}: attempt {} failed: {}", chunk.label(), attempt, err);
            ctx.emit(
                EventKind::Error,
                format!("{}: attempt {} failed: {}", chunk.label(), attempt, err),
            );
        }
    }
}

/// Concurrent pool that drains a queue of chunks
pub struct ChunkWorkerPool {
    /// Provider client shared by all workers
    translator: Arc<dyn Translator>,

    /// Pool configuration
    config: PoolConfig,
}

impl ChunkWorkerPool {
    /// Create a pool over the given translator
    pub fn new(translator: Arc<dyn Translator>, config: PoolConfig) -> Self {
        Self { translator, config }
    }

    /// Process every chunk and merge the translations
    ///
    /// Workers pop chunks from a shared queue so a slow chunk never blocks
    /// the others. Results flow through a channel into this task, the only
    /// owner of the merged map; per-chunk results come back sorted by index.
    pub async fn run(
        &self,
        chunks: Vec<TranslationChunk>,
        budgets: &HashMap<usize, u64>,
        template: &TranslationRequest,
        ctx: &Arc<RunContext>,
    ) -> (HashMap<usize, String>, Vec<ChunkResult>) {
        if chunks.is_empty() {
            return (HashMap::new(), Vec::new());
        }

        let worker_count = self.config.concurrency.max(1).min(chunks.len());
        let queue: Arc<Mutex<VecDeque<TranslationChunk>>> =
            Arc::new(Mutex::new(VecDeque::from(chunks)));
        let (tx, mut rx) = mpsc::unbounded_channel::<ChunkResult>();

        debug!("starting {} workers", worker_count);
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let translator = Arc::clone(&self.translator);
            let ctx = Arc::clone(ctx);
            let template = template.clone();
            let budgets = budgets.clone();
            let policy = self.config.retry.clone();
            let stagger_ms = self.config.rate_limit_delay_ms;

            handles.push(tokio::spawn(async move {
                loop {
                    let Some(chunk) = queue.lock().pop_front() else {
                        break;
                    };

                    // Stagger dispatch so a burst of workers does not slam
                    // the service all at once; the first chunk goes out
                    // immediately. Cancelled chunks skip the wait and fall
                    // through to an immediate abort.
                    if stagger_ms > 0 && chunk.index > 0 && !ctx.is_cancelled() {
                        tokio::time::sleep(Duration::from_millis(stagger_ms)).await;
                    }

                    ctx.lines_dispatched(chunk.line_count());
                    let result = process_chunk(
                        &chunk,
                        translator.as_ref(),
                        &template,
                        &budgets,
                        &ctx,
                        &policy,
                    )
                    .await;

                    if tx.send(result).is_err() {
                        break;
                    }
                }
                debug!("worker {} finished", worker_id);
            }));
        }
        drop(tx);

        let mut merged: HashMap<usize, String> = HashMap::new();
        let mut results: Vec<ChunkResult> = Vec::new();
        while let Some(mut result) = rx.recv().await {
            let message = match result.outcome {
                ChunkOutcome::Resolved => format!("Translated {}", result.label),
                ChunkOutcome::Exhausted => format!(
                    "Gave up on {} after {} attempts",
                    result.label, result.attempts
                ),
                ChunkOutcome::Aborted => format!("Stopped {}", result.label),
            };
            ctx.lines_processed(result.line_count, &message);

            for (id, text) in result.resolved.drain() {
                merged.insert(id, text);
            }
            results.push(result);
        }

        for handle in handles {
            let _ = handle.await;
        }

        results.sort_by_key(|r| r.index);
        (merged, results)
    }
}
