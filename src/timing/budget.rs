/*!
 * Duration budgets: how long each line may stay on screen without
 * colliding with its successor or exceeding the hard cap.
 *
 * Budgets are computed once per run from the pre-translation timeline and
 * handed to the translation requests so the model can be asked for shorter
 * text where time is short.
 */

use std::collections::HashMap;

use crate::subtitle_processor::SubtitleEntry;
use crate::timing::{HARD_CAP_MS, MIN_GAP_MS, READING_SPEED_CPS};

/// Compute the maximum safe display duration for every line.
///
/// For line i the ceiling is `start + HARD_CAP_MS`, clamped to
/// `next_start - MIN_GAP_MS` when a following line sits closer than that.
/// The budget is the distance from the line's own start to the ceiling,
/// floored at zero. One entry per input line, the last line using only the
/// hard cap. The input is not modified.
pub fn compute_budgets(entries: &[SubtitleEntry]) -> HashMap<usize, u64> {
    let mut budgets = HashMap::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let mut ceiling = entry.start_time_ms + HARD_CAP_MS;

        if let Some(next) = entries.get(i + 1) {
            let neighbor_limit = next.start_time_ms.saturating_sub(MIN_GAP_MS);
            if neighbor_limit < ceiling {
                ceiling = neighbor_limit;
            }
        }

        let budget = ceiling.saturating_sub(entry.start_time_ms);
        budgets.insert(entry.id, budget);
    }

    budgets
}

/// Character count readable within a budget at the fixed reading speed.
/// Used to derive per-line conciseness hints for translation requests.
pub fn max_chars_for_budget(budget_ms: u64) -> usize {
    (budget_ms as f64 / 1000.0 * READING_SPEED_CPS).floor() as usize
}
