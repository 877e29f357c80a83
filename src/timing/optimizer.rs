/*!
 * Post-translation timing optimization.
 *
 * Translated text is routinely longer than the source, so final end
 * timestamps are rederived from the text the viewer will actually read.
 * Start timestamps are never touched: they carry the sync to the audio.
 */

use log::{debug, info};

use crate::subtitle_processor::SubtitleEntry;
use crate::timing::{
    visible_char_count, FALLBACK_DURATION_MS, MAX_DURATION_MS, MIN_DURATION_MS, MIN_GAP_MS,
    READING_SPEED_CPS,
};

/// Configuration for timing optimization
#[derive(Debug, Clone)]
pub struct TimingOptimizerConfig {
    /// Reading speed in characters per second
    pub reading_speed_cps: f64,
    /// Minimum display duration in ms
    pub min_duration_ms: u64,
    /// Maximum display duration in ms
    pub max_duration_ms: u64,
    /// Minimum gap to the next line in ms
    pub min_gap_ms: u64,
    /// Duration used when neighbors leave no room at all
    pub fallback_duration_ms: u64,
}

impl Default for TimingOptimizerConfig {
    fn default() -> Self {
        Self {
            reading_speed_cps: READING_SPEED_CPS,
            min_duration_ms: MIN_DURATION_MS,
            max_duration_ms: MAX_DURATION_MS,
            min_gap_ms: MIN_GAP_MS,
            fallback_duration_ms: FALLBACK_DURATION_MS,
        }
    }
}

/// Rederives end timestamps for a completed (or partially completed) line
/// sequence so that display durations fit the text length without breaking
/// the non-overlap rule.
pub struct TimingOptimizer {
    config: TimingOptimizerConfig,
}

impl TimingOptimizer {
    /// Create an optimizer with default configuration
    pub fn new() -> Self {
        Self {
            config: TimingOptimizerConfig::default(),
        }
    }

    /// Create an optimizer with custom configuration
    pub fn with_config(config: TimingOptimizerConfig) -> Self {
        Self { config }
    }

    /// Adjust end timestamps in place. Returns the number of lines whose
    /// end moved. No-op when `enabled` is false.
    ///
    /// Per line: required display time comes from the longer of source and
    /// translated text (markup stripped) at the configured reading speed.
    /// The target duration is the original duration extended to that
    /// requirement, clamped into the min/max window, then cut back so the
    /// line ends at least `min_gap_ms` before the next line starts. When a
    /// successor starts so close that no positive duration survives the
    /// cut, the line keeps a small fallback duration instead of a zero or
    /// negative interval.
    pub fn optimize(&self, entries: &mut [SubtitleEntry], enabled: bool) -> usize {
        if !enabled || entries.is_empty() {
            return 0;
        }

        let mut adjusted = 0;

        for i in 0..entries.len() {
            let next_start = entries.get(i + 1).map(|next| next.start_time_ms);
            let entry = &mut entries[i];

            let original_duration = entry.end_time_ms.saturating_sub(entry.start_time_ms);
            let required = self.required_duration_ms(entry);

            let target = original_duration
                .max(required)
                .clamp(self.config.min_duration_ms, self.config.max_duration_ms);

            let mut new_end = entry.start_time_ms + target;

            if let Some(next_start) = next_start {
                let limit = next_start.saturating_sub(self.config.min_gap_ms);
                if new_end > limit {
                    new_end = limit;
                }
                if new_end <= entry.start_time_ms {
                    // Pathologically dense input: keep a positive interval
                    // even though the gap to the next line cannot be honored
                    new_end = entry.start_time_ms + self.config.fallback_duration_ms;
                }
            }

            if new_end != entry.end_time_ms {
                debug!(
                    "Line {}: end {}ms -> {}ms (required {}ms)",
                    entry.id, entry.end_time_ms, new_end, required
                );
                entry.end_time_ms = new_end;
                adjusted += 1;
            }
        }

        if adjusted > 0 {
            info!("Timing optimization adjusted {} of {} lines", adjusted, entries.len());
        }

        adjusted
    }

    /// Display time needed to read the longer of the line's two texts
    fn required_duration_ms(&self, entry: &SubtitleEntry) -> u64 {
        let source_chars = visible_char_count(&entry.source_text);
        let translated_chars = entry
            .translated_text
            .as_deref()
            .map_or(0, visible_char_count);

        let chars = source_chars.max(translated_chars) as f64;
        (chars / self.config.reading_speed_cps * 1000.0).ceil() as u64
    }
}

impl Default for TimingOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
