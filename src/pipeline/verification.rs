/*!
 * Final verification sweeps over lines that still lack a translation.
 *
 * After the parallel pass the remaining gaps get a bounded number of
 * sequential recovery rounds. Each round re-requests the missing lines in
 * small batches with a fixed pause between calls, gently enough that an
 * already-struggling service is not hammered again. The sweep never fails
 * the run by itself; whatever deficit survives it is reported upward.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::pipeline::events::EventKind;
use crate::pipeline::run_context::RunContext;
use crate::providers::{RequestLine, TranslationRequest, Translator};
use crate::subtitle_processor::SubtitleEntry;

/// Configuration for the verification sweep
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Number of recovery rounds
    pub rounds: u32,

    /// Maximum lines per recovery request
    pub batch_size: usize,

    /// Fixed pause between consecutive recovery requests, in milliseconds
    pub pause_ms: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            rounds: 2,
            batch_size: 50,
            pause_ms: 500,
        }
    }
}

/// Sequential recovery pass over untranslated lines
pub struct VerificationSweep {
    /// Provider client used for recovery requests
    translator: Arc<dyn Translator>,

    /// Sweep configuration
    config: VerificationConfig,
}

impl VerificationSweep {
    /// Create a sweep over the given translator
    pub fn new(translator: Arc<dyn Translator>, config: VerificationConfig) -> Self {
        Self { translator, config }
    }

    /// Run the sweep, applying recovered translations directly to `entries`
    ///
    /// Returns the number of lines still untranslated afterwards. Rounds
    /// recompute the missing set from scratch, so a line recovered in round
    /// one is never re-requested in round two.
    pub async fn run(
        &self,
        entries: &mut [SubtitleEntry],
        budgets: &HashMap<usize, u64>,
        template: &TranslationRequest,
        ctx: &RunContext,
    ) -> usize {
        let mut made_request = false;

        'rounds: for round in 1..=self.config.rounds {
            let missing: Vec<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.is_untranslated())
                .map(|(i, _)| i)
                .collect();

            if missing.is_empty() || ctx.is_cancelled() {
                break;
            }

            info!(
                "verification round {}/{}: {} lines missing",
                round,
                self.config.rounds,
                missing.len()
            );
            ctx.report_progress(&format!(
                "Final verification... (round {}/{}, {} missing)",
                round,
                self.config.rounds,
                missing.len()
            ));
            ctx.emit(
                EventKind::Info,
                format!(
                    "verification round {} started with {} missing lines",
                    round,
                    missing.len()
                ),
            );

            let mut recovered_this_round = 0usize;
            for group in missing.chunks(self.config.batch_size.max(1)) {
                if ctx.is_cancelled() {
                    break 'rounds;
                }

                if made_request && self.config.pause_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(self.config.pause_ms)).await;
                }
                made_request = true;

                let lines: Vec<RequestLine> = group
                    .iter()
                    .map(|&i| {
                        RequestLine::for_entry(&entries[i], budgets.get(&entries[i].id).copied())
                    })
                    .collect();
                let request = template.for_lines(lines, Vec::new());

                match self.translator.translate_lines(&request).await {
                    Ok(outcome) => {
                        for &i in group {
                            let id = entries[i].id;
                            if let Some(text) = outcome.resolved.get(&id) {
                                if !text.trim().is_empty() {
                                    entries[i].translated_text = Some(text.clone());
                                    recovered_this_round += 1;
                                }
                            }
                        }
                    }

                    Err(err) if err.is_terminal() => {
                        warn!("verification hit a terminal provider failure: {}", err);
                        ctx.abort_terminal(err.to_string());
                        break 'rounds;
                    }

                    Err(err) => {
                        warn!("verification request failed: {}", err);
                        ctx.emit(EventKind::Error, format!("verification request failed: {}", err));
                    }
                }
            }

            debug!(
                "verification round {} recovered {} lines",
                round, recovered_this_round
            );
        }

        let deficit = entries.iter().filter(|e| e.is_untranslated()).count();
        if deficit > 0 {
            warn!("{} lines still missing after verification", deficit);
        }
        deficit
    }
}
