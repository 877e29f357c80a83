use anyhow::{Result, anyhow};
use log::{error, warn, info};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};
use parking_lot::Mutex;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::pipeline::{
    EventKind, EventLog, EventSink, PipelineConfig, PipelineEvent, PoolConfig, ProgressCallback,
    RetryPolicy, RunContext, RunReport, RunStatus, TranslationPipeline, VerificationConfig,
};
use crate::providers::{TranslationRequest, create_translator};
use crate::subtitle_processor::SubtitleCollection;
use crate::timing::{TimingOptimizer, TimingOptimizerConfig, validate_timeline};

// @module: Application controller for subtitle translation runs

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Context of the run currently in flight, so Ctrl-C can reach it
    active_run: Arc<Mutex<Option<Arc<RunContext>>>>,

    // @field: Set once cancellation is requested; folder runs stop between files
    shutdown: Arc<AtomicBool>,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let controller = Self {
            config,
            active_run: Arc::new(Mutex::new(None)),
            shutdown: Arc::new(AtomicBool::new(false)),
        };

        Ok(controller)
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    /// Request cooperative cancellation of all controller work.
    ///
    /// The run in flight stops dispatching new chunks; queued files in
    /// folder mode are skipped. In-flight provider calls are not aborted.
    pub fn request_cancel(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(ctx) = self.active_run.lock().as_ref() {
            ctx.cancel();
        }
        info!("Cancellation requested, stopping after in-flight work");
    }

    /// Whether cancellation has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Test version of run method that simulates the process without actual file operations
    pub async fn test_run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        // For testing purposes, just validate the configuration and simulate success
        info!("Test run initiated for file: {:?}", input_file);
        info!("Output directory: {:?}", output_dir);
        info!("Force overwrite: {}", force_overwrite);

        // Validate that we have a proper configuration
        if !self.is_initialized() {
            return Err(anyhow!("Controller not properly initialized"));
        }

        // Simulate successful completion
        Ok(())
    }

    /// Test version of run_folder method that simulates folder processing
    pub async fn test_run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        // For testing purposes, just validate the configuration and simulate success
        info!("Test run folder initiated for directory: {:?}", input_dir);
        info!("Force overwrite: {}", force_overwrite);

        // Validate that we have a proper configuration
        if !self.is_initialized() {
            return Err(anyhow!("Controller not properly initialized"));
        }

        // Simulate successful completion
        Ok(())
    }

    /// Run the main workflow with an input subtitle file and output directory
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, output_dir, &multi_progress, force_overwrite)
            .await
            .map(|_| ())
    }

    /// Run the controller with progress reporting
    async fn run_with_progress(&self, input_file: PathBuf, output_dir: PathBuf, multi_progress: &MultiProgress, force_overwrite: bool) -> Result<RunStatus> {
        // Check if the input file exists
        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        // Only SRT subtitle files are supported as input
        let is_srt = input_file
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("srt"))
            .unwrap_or(false);
        if !is_srt {
            return Err(anyhow!("Input is not an SRT subtitle file: {:?}", input_file));
        }

        // Ensure the output directory exists
        FileManager::ensure_dir(&output_dir)?;

        // Check if translation already exists
        let output_path = output_dir.join(self.translated_output_filename(&input_file));
        if output_path.exists() && !force_overwrite {
            // Skip if translation already exists and no force flag
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(RunStatus::Completed);
        }

        // Parse the subtitle file
        let mut subtitles = SubtitleCollection::from_srt_file(&input_file, &self.config.source_language)?;
        if subtitles.entries.is_empty() {
            warn!("No subtitle entries found in {:?}, nothing to do", input_file);
            return Ok(RunStatus::Completed);
        }

        // Probe the provider once per process, in the background
        static INIT_TEST: Once = Once::new();
        INIT_TEST.call_once(|| {
            let translation_config = self.config.translation.clone();
            tokio::spawn(async move {
                if let Ok(translator) = create_translator(&translation_config) {
                    if let Err(e) = translator.test_connection().await {
                        warn!("Provider connection check failed: {}", e);
                    }
                }
            });
        });

        // Translate the subtitles
        let (report, events, translation_elapsed) =
            self.translate_subtitles_with_progress(&mut subtitles, multi_progress).await?;

        // Re-derive display durations from the translated text, then audit
        if self.config.subtitle.adjust_timing {
            let optimizer = TimingOptimizer::new();
            let adjusted = optimizer.optimize(&mut subtitles.entries, true);
            if adjusted > 0 {
                info!("Adjusted display timing of {} lines", adjusted);
            }
        }
        for issue in validate_timeline(&subtitles.entries, &TimingOptimizerConfig::default()) {
            warn!("Timeline audit: {}", issue);
        }

        // Write the output tracks. A run that translated nothing writes
        // nothing, so a cancelled run never leaves a source-only copy behind.
        if report.translated_lines > 0 {
            subtitles.write_translated_srt(&output_path)?;
            info!("Success: {}", output_path.display());

            if self.config.subtitle.dual_output {
                let dual_path = output_dir.join(self.dual_output_filename(&input_file));
                subtitles.write_dual_srt(&dual_path)?;
                info!("Dual track: {}", dual_path.display());
            }
        }

        // Persist the event capture when the run ended badly
        if !report.is_success() || events.error_count() > 0 {
            let log_file_path = output_dir.join("dualsub.issues.log");
            let context = format!("{} - {} ({})",
                self.config.translation.provider.display_name(),
                self.config.translation.get_model(),
                report.summary());

            if let Err(e) = self.write_issues_file(&events, &context, &log_file_path) {
                warn!("Failed to write issues log: {}", e);
            } else {
                info!("Issues written to {}", log_file_path.display());
            }
        }

        info!(
            "Translation completed in {}.",
            Self::format_duration(translation_elapsed)
        );

        match report.status {
            RunStatus::Completed => Ok(RunStatus::Completed),
            RunStatus::Cancelled => {
                info!("Run cancelled, partial output preserved");
                Ok(RunStatus::Cancelled)
            }
            RunStatus::Stopped { ref message } => Err(anyhow!("Stopped: {}", message)),
            RunStatus::Incomplete { missing } => Err(anyhow!("Failed: {} lines missing", missing)),
        }
    }

    /// Internal method to translate subtitles with a progress bar from the provided MultiProgress
    async fn translate_subtitles_with_progress(
        &self,
        subtitles: &mut SubtitleCollection,
        multi_progress: &MultiProgress,
    ) -> Result<(RunReport, Arc<EventLog>, std::time::Duration)> {
        // Start timing the translation process
        let translation_start_time = std::time::Instant::now();

        let total_lines = subtitles.entries.len() as u64;

        // Create a progress bar for translation tracking
        let progress_bar = multi_progress.add(ProgressBar::new(total_lines));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        // Log that we're starting translation with provider and model info
        info!("🚀 dualsub: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model());

        // Log that we're translating
        info!("Translating, please wait…");
        progress_bar.set_message("Translating");

        // Build the provider client and the request template
        let translator = create_translator(&self.config.translation)?;
        let template = self.request_template();

        let common = &self.config.translation.common;
        let pipeline_config = PipelineConfig {
            chunk_size: common.chunk_size,
            context_window: common.context_window,
            pool: PoolConfig {
                concurrency: self.config.translation.optimal_concurrent_requests(),
                retry: RetryPolicy {
                    max_attempts: common.retry_count,
                    backoff_ms: common.retry_backoff_ms,
                },
                rate_limit_delay_ms: common.rate_limit_delay_ms,
            },
            verification: VerificationConfig {
                rounds: common.verification_rounds,
                batch_size: common.verification_batch_size,
                pause_ms: common.verification_pause_ms,
            },
        };
        let pipeline = TranslationPipeline::new(translator, pipeline_config);

        // Wire the run context to the progress bar and the event capture
        let events = Arc::new(EventLog::new());
        let pb = progress_bar.clone();
        let progress: Arc<ProgressCallback> = Arc::new(move |percent: u8, message: &str| {
            pb.set_position(u64::from(percent) * total_lines / 100);
            pb.set_message(message.to_string());
        });
        let ctx = Arc::new(
            RunContext::new(subtitles.entries.len())
                .with_progress(progress)
                .with_events(Arc::clone(&events) as _),
        );

        // Expose the context for Ctrl-C, honoring a cancel that arrived early
        *self.active_run.lock() = Some(Arc::clone(&ctx));
        if self.shutdown.load(Ordering::SeqCst) {
            ctx.cancel();
        }

        let report = pipeline.run(&mut subtitles.entries, &template, &ctx).await;

        self.active_run.lock().take();

        // Finish and clear the progress bar instead of just finishing it
        // This ensures only the folder progress bar remains visible when processing multiple files
        progress_bar.finish_and_clear();

        let provider_errors = events.error_count();
        if provider_errors > 0 {
            info!("Translation completed with {} provider errors.", provider_errors);
        }

        let translation_elapsed = translation_start_time.elapsed();
        Ok((report, events, translation_elapsed))
    }

    /// Build the run-wide request template from the configuration.
    ///
    /// Languages are rendered as display names when the code is known, so
    /// prompts read "from English to French" rather than "from en to fr".
    fn request_template(&self) -> TranslationRequest {
        let source_name = language_utils::get_language_name(&self.config.source_language)
            .unwrap_or_else(|_| self.config.source_language.clone());
        let target_name = language_utils::get_language_name(&self.config.target_language)
            .unwrap_or_else(|_| self.config.target_language.clone());

        let common = &self.config.translation.common;
        TranslationRequest::template(
            source_name,
            target_name,
            common.program_context.clone(),
            common.glossary.clone(),
        )
    }

    /// Write captured pipeline events to an issues file
    pub fn write_issues_file(&self, events: &EventLog, context: &str, file_path: &Path) -> Result<()> {
        let mut log_content = String::new();

        // Add header
        log_content.push_str(&format!("Translation issues - {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        log_content.push_str(&format!("Context: {}\n\n", context));

        // Add each captured event
        log_content.push_str(&events.render());

        // Write to file
        FileManager::write_to_file(file_path, &log_content)?;

        Ok(())
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Run the workflow in folder mode, translating all subtitle files in a directory
    /// Files that already have translated subtitles will be skipped
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        // Start timing the process
        let start_time = std::time::Instant::now();

        // Check if the input directory exists
        if !input_dir.exists() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        // Find all subtitle files in the directory (recursive), leaving out
        // files this tool generated earlier
        let mut subtitle_files: Vec<PathBuf> = FileManager::find_files(&input_dir, "srt")?
            .into_iter()
            .filter(|path| !self.is_generated_output(path))
            .collect();
        subtitle_files.sort();

        // If no subtitle files found, return error
        if subtitle_files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        // Create multi-progress instance for multiple file processing
        let multi_progress = MultiProgress::new();

        // Create a progress bar for folder processing
        let folder_pb = multi_progress.add(ProgressBar::new(subtitle_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        // Track success and failure counts
        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;

        // Process each subtitle file
        for subtitle_file in subtitle_files.iter() {
            // Stop dispatching new files once cancellation is requested
            if self.shutdown.load(Ordering::SeqCst) {
                info!("Cancellation requested, skipping remaining files");
                break;
            }

            // Get the file name for display
            let file_name = subtitle_file.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            // Update the folder progress bar to show current file
            folder_pb.set_message(format!("Processing: {}", file_name));

            // Get output directory (use the file's own directory)
            let output_dir = match subtitle_file.parent() {
                Some(parent) => parent.to_path_buf(),
                None => input_dir.clone(),
            };

            // Check if translation already exists
            let output_path = output_dir.join(self.translated_output_filename(subtitle_file));
            if output_path.exists() && !force_overwrite {
                // Skip if translation already exists and no force flag
                warn!("Skipping file, translation already exists (use -f to force overwrite)");
                skip_count += 1;
                folder_pb.inc(1);
                continue;
            }

            // Run the translation for this file; every file gets a fresh
            // run context so a stopped run never poisons the next one
            match self.run_with_progress(subtitle_file.clone(), output_dir, &multi_progress, force_overwrite).await {
                Ok(RunStatus::Cancelled) => {
                    skip_count += 1;
                },
                Ok(_) => {
                    success_count += 1;
                },
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    error_count += 1;
                }
            }

            // Update the folder progress bar
            folder_pb.inc(1);
        }

        // Finish the folder progress bar
        folder_pb.finish_with_message("Folder processing complete");

        // Calculate and display the total elapsed time
        let duration = start_time.elapsed();

        // Give summary results - important for batch operations
        let summary_message = format!("Folder processing completed: {} processed, {} skipped, {} errors",
             success_count, skip_count, error_count);
        info!("{} - Duration: {}", summary_message, Self::format_duration(duration));

        // Persist the summary when anything went wrong
        if error_count > 0 {
            let log_file_path = input_dir.join("dualsub.issues.log");
            let context = format!("Folder processing: {}", input_dir.display());
            let summary_events = EventLog::new();
            summary_events.record(PipelineEvent::new(
                EventKind::Info,
                format!("{} - Duration: {}", summary_message, Self::format_duration(duration)),
            ));

            if let Err(e) = self.write_issues_file(&summary_events, &context, &log_file_path) {
                warn!("Failed to write folder issues log: {}", e);
            } else {
                info!("Folder processing summary written to {}", log_file_path.display());
            }
        }

        Ok(())
    }

    /// Short language token used in output filenames ("fr", or "fra" when
    /// no two-letter code exists)
    fn target_language_token(&self) -> String {
        language_utils::normalize_to_part1_or_part2t(&self.config.target_language)
            .unwrap_or_else(|_| self.config.target_language.clone())
    }

    fn source_language_token(&self) -> String {
        language_utils::normalize_to_part1_or_part2t(&self.config.source_language)
            .unwrap_or_else(|_| self.config.source_language.clone())
    }

    /// Filename token marking the stacked dual-language track
    fn dual_language_token(&self) -> String {
        format!("{}-{}", self.target_language_token(), self.source_language_token())
    }

    /// Expected output filename for the translated track
    pub fn translated_output_filename(&self, input_file: &Path) -> String {
        self.subtitle_output_filename(input_file, &self.target_language_token())
    }

    /// Expected output filename for the dual-language track
    pub fn dual_output_filename(&self, input_file: &Path) -> String {
        self.subtitle_output_filename(input_file, &self.dual_language_token())
    }

    /// Derive an output filename from the input, stamping in a language token
    fn subtitle_output_filename(&self, input_file: &Path, lang_token: &str) -> String {
        if let Some(filename) = input_file.file_name().map(|f| f.to_string_lossy()) {
            // Split the filename by dots
            let parts: Vec<&str> = filename.split('.').collect();

            if parts.len() >= 3 {
                // Format with multiple dots: "show.s01e01.en.srt"
                // Replace the language token (second to last part)
                let mut new_parts = parts.clone();
                new_parts[parts.len() - 2] = lang_token;
                return new_parts.join(".");
            } else if parts.len() == 2 {
                // Simple case: "movie.srt"
                // Append the language token before the extension
                return format!("{}.{}.srt", parts[0], lang_token);
            }
        }

        // Fallback: use the file stem if available, or a default name
        if let Some(stem) = input_file.file_stem() {
            format!("{}.{}.srt", stem.to_string_lossy(), lang_token)
        } else {
            format!("output.{}.srt", lang_token)
        }
    }

    /// Whether a subtitle file looks like one of this tool's own outputs
    fn is_generated_output(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().map(|f| f.to_string_lossy()) else {
            return false;
        };
        let parts: Vec<&str> = filename.split('.').collect();
        if parts.len() < 3 {
            return false;
        }

        let token = parts[parts.len() - 2];
        if language_utils::language_codes_match(token, &self.config.target_language) {
            return true;
        }
        token.eq_ignore_ascii_case(&self.dual_language_token())
    }
}
