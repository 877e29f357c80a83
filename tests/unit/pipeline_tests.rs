/*!
 * Tests for chunk planning, duration budgets and timing adjustment
 * through the public library surface
 */

use dualsub::pipeline::plan_chunks;
use dualsub::subtitle_processor::SubtitleEntry;
use dualsub::timing::{
    compute_budgets, max_chars_for_budget, validate_timeline, TimelineIssue, TimingOptimizer,
    TimingOptimizerConfig, HARD_CAP_MS, MIN_GAP_MS,
};

fn entries_every_3s(count: usize) -> Vec<SubtitleEntry> {
    (0..count)
        .map(|i| {
            SubtitleEntry::new(
                i + 1,
                i as u64 * 3000,
                i as u64 * 3000 + 2000,
                format!("Line number {}", i + 1),
            )
        })
        .collect()
}

/// Test that chunk planning covers the input exactly once, in order
#[test]
fn test_plan_chunks_withTypicalEpisode_shouldPartitionInOrder() {
    let entries = entries_every_3s(130);

    let chunks = plan_chunks(&entries, 40, 5);

    assert_eq!(chunks.len(), 4);
    let flattened: Vec<usize> = chunks
        .iter()
        .flat_map(|c| c.entries.iter().map(|e| e.id))
        .collect();
    assert_eq!(flattened, (1..=130).collect::<Vec<usize>>());
}

/// Test that non-first chunks carry trailing context from their predecessor
#[test]
fn test_plan_chunks_contextLines_shouldComeFromPrecedingChunk() {
    let entries = entries_every_3s(90);

    let chunks = plan_chunks(&entries, 40, 5);

    assert!(chunks[0].previous_context.is_empty());
    let second_context: Vec<&str> = chunks[1]
        .previous_context
        .iter()
        .map(|c| c.source_text.as_str())
        .collect();
    assert_eq!(second_context.len(), 5);
    assert_eq!(second_context[4], "Line number 40");
}

/// Test duration budgets against both the hard cap and a close neighbor
#[test]
fn test_compute_budgets_shouldRespectCapAndNeighbor() {
    let entries = vec![
        SubtitleEntry::new(1, 1000, 4000, "First".to_string()),
        SubtitleEntry::new(2, 4100, 8000, "Second".to_string()),
        SubtitleEntry::new(3, 30_000, 33_000, "Third, far away".to_string()),
    ];

    let budgets = compute_budgets(&entries);

    // Line 1 is clamped by line 2: 4100 - 50 - 1000
    assert_eq!(budgets[&1], 3050);
    // Line 2's neighbor is distant, so only the cap applies
    assert_eq!(budgets[&2], HARD_CAP_MS);
    // The last line always gets the cap
    assert_eq!(budgets[&3], HARD_CAP_MS);
}

/// Test the character allowance derived from a budget
#[test]
fn test_max_chars_for_budget_shouldFollowReadingSpeed() {
    assert_eq!(max_chars_for_budget(1000), 20);
    assert_eq!(max_chars_for_budget(6000), 120);
    assert_eq!(max_chars_for_budget(0), 0);
}

/// Test end-timestamp adjustment after translation lengthened the text
#[test]
fn test_timing_optimizer_withLongTranslations_shouldExtendWithoutOverlap() {
    let optimizer = TimingOptimizer::new();
    let mut entries = entries_every_3s(10);
    for entry in entries.iter_mut() {
        entry.translated_text = Some("x".repeat(90));
    }

    let adjusted = optimizer.optimize(&mut entries, true);

    assert!(adjusted > 0);
    for pair in entries.windows(2) {
        assert!(pair[0].end_time_ms + MIN_GAP_MS <= pair[1].start_time_ms);
    }
}

/// Test that a clean adjusted timeline passes the audit
#[test]
fn test_validate_timeline_afterOptimization_shouldReportNoIssues() {
    let optimizer = TimingOptimizer::new();
    let mut entries = entries_every_3s(20);
    for entry in entries.iter_mut() {
        entry.translated_text = Some("Une traduction de longueur normale".to_string());
    }
    optimizer.optimize(&mut entries, true);

    let issues = validate_timeline(&entries, &TimingOptimizerConfig::default());

    assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
}

/// Test that the audit flags lines no adjustment could fix
#[test]
fn test_validate_timeline_withDenseSource_shouldFlagGap() {
    let entries = vec![
        SubtitleEntry::new(1, 0, 2000, "First".to_string()),
        SubtitleEntry::new(2, 2010, 4000, "Second, starting too soon".to_string()),
    ];

    let issues = validate_timeline(&entries, &TimingOptimizerConfig::default());

    assert!(issues
        .iter()
        .any(|i| matches!(i, TimelineIssue::GapTooSmall { id: 1, next_id: 2, .. })));
}
