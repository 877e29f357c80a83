/*!
 * Concurrent translation pipeline.
 *
 * This module turns an ordered sequence of subtitle lines into a set of
 * bounded work units and drives them through a translation provider. It is
 * split into several submodules:
 *
 * - `chunk`: Chunk planning over the line sequence
 * - `run_context`: Run-scoped progress, cancellation and failure state
 * - `events`: Structured event records for run diagnostics
 * - `worker_pool`: Concurrent chunk processing with retries
 * - `verification`: Post-pass recovery of missing lines
 * - `orchestrator`: The end-to-end run driver
 */

// Re-export main types for easier usage
pub use self::chunk::{ContextLine, TranslationChunk, plan_chunks};
pub use self::events::{EventKind, EventLog, EventSink, PipelineEvent};
pub use self::orchestrator::{PipelineConfig, RunReport, RunStatus, TranslationPipeline};
pub use self::run_context::{ProgressCallback, RunContext, TerminalFailure};
pub use self::verification::{VerificationConfig, VerificationSweep};
pub use self::worker_pool::{
    ChunkOutcome, ChunkResult, ChunkState, ChunkWorkerPool, PoolConfig, RetryPolicy,
};

// Submodules
pub mod chunk;
pub mod events;
pub mod orchestrator;
pub mod run_context;
pub mod verification;
pub mod worker_pool;
