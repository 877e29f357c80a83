/*!
 * Timing engine for the subtitle pipeline.
 *
 * Two concerns live here:
 * - `budget`: pre-translation duration budgets, fed into translation
 *   requests as conciseness constraints
 * - `optimizer`: post-translation end-timestamp rederivation from text
 *   length at a fixed reading speed
 *
 * Both enforce the same rule: a line never runs into its successor's
 * start minus the minimum gap.
 */

use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::subtitle_processor::SubtitleEntry;

pub mod budget;
pub mod optimizer;

pub use budget::{compute_budgets, max_chars_for_budget};
pub use optimizer::{TimingOptimizer, TimingOptimizerConfig};

/// Hard cap on the duration budget of a single line in milliseconds
pub const HARD_CAP_MS: u64 = 6000;

/// Minimum gap enforced between consecutive lines in milliseconds
pub const MIN_GAP_MS: u64 = 50;

/// Reading speed used for duration estimates, characters per second
pub const READING_SPEED_CPS: f64 = 20.0;

/// Minimum display duration for a line in milliseconds
pub const MIN_DURATION_MS: u64 = 1000;

/// Maximum display duration for a line in milliseconds
pub const MAX_DURATION_MS: u64 = 6000;

/// Smallest positive duration used when neighbors leave no room
pub const FALLBACK_DURATION_MS: u64 = 100;

// Formatting tags (<i>, {\an8}) and explicit line-break markers are not
// read by the viewer, so they are stripped before counting characters.
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]*>|\{[^}]*\}").unwrap()
});

static LINE_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\N|\\n|\n").unwrap()
});

/// Count the characters a viewer actually reads in a subtitle text
pub fn visible_char_count(text: &str) -> usize {
    let without_markup = MARKUP_REGEX.replace_all(text, "");
    let flattened = LINE_BREAK_REGEX.replace_all(&without_markup, " ");
    flattened.trim().chars().count()
}

/// Issues found when auditing a finished timeline
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineIssue {
    /// A line ends too close to (or past) the next line's start
    GapTooSmall {
        id: usize,
        next_id: usize,
        gap_ms: i64,
    },
    /// Display duration below the configured minimum
    DurationTooShort {
        id: usize,
        duration_ms: u64,
    },
    /// Display duration above the configured maximum
    DurationTooLong {
        id: usize,
        duration_ms: u64,
    },
    /// Reading speed above the configured limit
    ReadingSpeedTooHigh {
        id: usize,
        cps: f64,
    },
}

impl fmt::Display for TimelineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineIssue::GapTooSmall { id, next_id, gap_ms } => {
                write!(f, "Line {} ends {}ms before line {} starts", id, gap_ms, next_id)
            }
            TimelineIssue::DurationTooShort { id, duration_ms } => {
                write!(f, "Line {} duration too short: {}ms", id, duration_ms)
            }
            TimelineIssue::DurationTooLong { id, duration_ms } => {
                write!(f, "Line {} duration too long: {}ms", id, duration_ms)
            }
            TimelineIssue::ReadingSpeedTooHigh { id, cps } => {
                write!(f, "Line {} reading speed too high: {:.1} CPS", id, cps)
            }
        }
    }
}

/// Audit a timeline against the gap/duration/reading-speed rules.
///
/// This is advisory: the optimizer keeps its own invariants, but dense
/// source timelines can leave lines that no adjustment could fix, and
/// those are reported here rather than silently accepted.
pub fn validate_timeline(entries: &[SubtitleEntry], config: &TimingOptimizerConfig) -> Vec<TimelineIssue> {
    let mut issues = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        let duration = entry.duration_ms();

        if duration < config.min_duration_ms {
            issues.push(TimelineIssue::DurationTooShort {
                id: entry.id,
                duration_ms: duration,
            });
        }
        if duration > config.max_duration_ms {
            issues.push(TimelineIssue::DurationTooLong {
                id: entry.id,
                duration_ms: duration,
            });
        }

        let chars = visible_char_count(entry.output_text()) as f64;
        if duration > 0 {
            let cps = chars / (duration as f64 / 1000.0);
            if cps > config.reading_speed_cps * 2.0 {
                issues.push(TimelineIssue::ReadingSpeedTooHigh { id: entry.id, cps });
            }
        }

        if let Some(next) = entries.get(i + 1) {
            let gap = next.start_time_ms as i64 - entry.end_time_ms as i64;
            if gap < config.min_gap_ms as i64 {
                issues.push(TimelineIssue::GapTooSmall {
                    id: entry.id,
                    next_id: next.id,
                    gap_ms: gap,
                });
            }
        }
    }

    debug!("Timeline audit: {} entries, {} issues", entries.len(), issues.len());

    issues
}
