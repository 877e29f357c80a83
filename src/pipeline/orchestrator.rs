/*!
 * The run orchestrator for one subtitle file.
 *
 * Budgets the timeline, plans chunks, drives the worker pool, runs the
 * verification sweep and derives the final run status. The orchestrator
 * owns no state of its own beyond configuration; everything run-scoped
 * lives in the `RunContext` it is handed.
 */

use std::sync::Arc;

use log::{info, warn};

use crate::pipeline::chunk::plan_chunks;
use crate::pipeline::events::EventKind;
use crate::pipeline::run_context::RunContext;
use crate::pipeline::verification::{VerificationConfig, VerificationSweep};
use crate::pipeline::worker_pool::{ChunkResult, ChunkWorkerPool, PoolConfig};
use crate::providers::{TranslationRequest, Translator};
use crate::subtitle_processor::SubtitleEntry;
use crate::timing::compute_budgets;

/// Configuration for a translation run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum lines per chunk
    pub chunk_size: usize,

    /// Preceding lines carried as read-only context per chunk
    pub context_window: usize,

    /// Worker pool settings
    pub pool: PoolConfig,

    /// Verification sweep settings
    pub verification: VerificationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 40,
            context_window: 5,
            pool: PoolConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every line translated
    Completed,
    /// A terminal provider failure halted the run
    Stopped {
        /// Provider message describing the failure
        message: String,
    },
    /// The user cancelled mid-run
    Cancelled,
    /// The run finished with lines still missing
    Incomplete {
        /// Number of untranslated lines
        missing: usize,
    },
}

/// Summary of one translation run
#[derive(Debug)]
pub struct RunReport {
    /// How the run ended
    pub status: RunStatus,

    /// Lines the run covered
    pub total_lines: usize,

    /// Lines carrying a translation when the run ended
    pub translated_lines: usize,

    /// Lines still untranslated when the run ended
    pub missing_lines: usize,

    /// Per-chunk results, sorted by chunk index
    pub chunks: Vec<ChunkResult>,
}

impl RunReport {
    /// Whether the run translated everything it set out to
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// One-line outcome for progress displays and logs
    pub fn summary(&self) -> String {
        match &self.status {
            RunStatus::Completed => {
                format!("Completed: {} lines translated", self.translated_lines)
            }
            RunStatus::Stopped { message } => format!("Stopped: {}", message),
            RunStatus::Cancelled => "Cancelled".to_string(),
            RunStatus::Incomplete { missing } => format!("Failed: {} lines missing", missing),
        }
    }
}

/// End-to-end translation pipeline for one line sequence
pub struct TranslationPipeline {
    /// Provider client shared by the pool and the sweep
    translator: Arc<dyn Translator>,

    /// Run configuration
    config: PipelineConfig,
}

impl TranslationPipeline {
    /// Create a pipeline over the given translator
    pub fn new(translator: Arc<dyn Translator>, config: PipelineConfig) -> Self {
        Self { translator, config }
    }

    /// Translate `entries` in place and report how it went
    ///
    /// Lines that already carry a translation are left untouched and cost
    /// no provider calls, so re-running a partially translated file only
    /// pays for what is still missing.
    pub async fn run(
        &self,
        entries: &mut [SubtitleEntry],
        template: &TranslationRequest,
        ctx: &Arc<RunContext>,
    ) -> RunReport {
        let total = entries.len();
        ctx.emit(EventKind::Info, format!("run started: {} lines", total));

        if total == 0 {
            ctx.report_progress("Nothing to translate");
            return RunReport {
                status: RunStatus::Completed,
                total_lines: 0,
                translated_lines: 0,
                missing_lines: 0,
                chunks: Vec::new(),
            };
        }

        ctx.report_progress("Starting translation");

        // Duration budgets come from the fixed timeline, before anything
        // is sent out, so every request can carry its length hints.
        let budgets = compute_budgets(entries);

        let chunks = plan_chunks(entries, self.config.chunk_size, self.config.context_window);
        info!("planned {} chunks over {} lines", chunks.len(), total);

        let pool = ChunkWorkerPool::new(Arc::clone(&self.translator), self.config.pool.clone());
        let (merged, chunk_results) = pool.run(chunks, &budgets, template, ctx).await;

        // Bank the pool's translations. Lines that arrived translated are
        // never clobbered.
        for entry in entries.iter_mut() {
            if entry.is_untranslated() {
                if let Some(text) = merged.get(&entry.id) {
                    entry.translated_text = Some(text.clone());
                }
            }
        }

        let missing = if ctx.is_cancelled() {
            entries.iter().filter(|e| e.is_untranslated()).count()
        } else {
            let sweep = VerificationSweep::new(
                Arc::clone(&self.translator),
                self.config.verification.clone(),
            );
            sweep.run(entries, &budgets, template, ctx).await
        };

        let translated = entries.iter().filter(|e| !e.is_untranslated()).count();

        let status = if let Some(failure) = ctx.terminal_failure() {
            RunStatus::Stopped {
                message: failure.message,
            }
        } else if ctx.is_cancelled() {
            RunStatus::Cancelled
        } else if missing > 0 {
            RunStatus::Incomplete { missing }
        } else {
            RunStatus::Completed
        };

        let report = RunReport {
            status,
            total_lines: total,
            translated_lines: translated,
            missing_lines: missing,
            chunks: chunk_results,
        };

        let summary = report.summary();
        if report.is_success() {
            info!("{}", summary);
        } else {
            warn!("{}", summary);
        }
        ctx.emit(EventKind::Info, summary.clone());
        ctx.report_progress(&summary);

        report
    }
}
