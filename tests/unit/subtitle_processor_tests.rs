/*!
 * Tests for subtitle processing functionality
 */

use std::fs;
use std::path::PathBuf;
use std::fmt::Write;
use anyhow::Result;
use dualsub::subtitle_processor::{SubtitleEntry, SubtitleCollection};
use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let ms = SubtitleEntry::parse_timestamp(ts).unwrap();
    assert_eq!(ms, 5025678);

    let formatted = SubtitleEntry::format_timestamp(ms);
    assert_eq!(formatted, ts);
}

/// Test timestamp parsing rejects malformed input
#[test]
fn test_timestamp_parsing_withInvalidTimestamp_shouldFail() {
    assert!(SubtitleEntry::parse_timestamp("not a timestamp").is_err());
    assert!(SubtitleEntry::parse_timestamp("01:75:00,000").is_err());
}

/// Test subtitle entry display formatting
#[test]
fn test_subtitle_entry_display_withValidEntry_shouldFormatCorrectly() {
    let entry = SubtitleEntry::new(1, 5000, 10000, "Test subtitle".to_string());
    let mut output = String::new();
    write!(output, "{}", entry).unwrap();

    assert!(output.contains("1"));
    assert!(output.contains("00:00:05,000"));
    assert!(output.contains("00:00:10,000"));
    assert!(output.contains("Test subtitle"));
}

/// Test subtitle entry properties and methods
#[test]
fn test_subtitle_entry_properties_withValidEntry_shouldHaveCorrectValues() {
    let entry = SubtitleEntry::new(
        42,
        61234,
        65432,
        "Hello\nWorld".to_string()
    );

    // Check properties
    assert_eq!(entry.id, 42);
    assert_eq!(entry.start_time_ms, 61234);
    assert_eq!(entry.end_time_ms, 65432);
    assert_eq!(entry.source_text, "Hello\nWorld");
    assert_eq!(entry.duration_ms(), 4198);
    assert!(entry.is_untranslated());

    // Check formatting
    assert_eq!(entry.format_start_time(), "00:01:01,234");
    assert_eq!(entry.format_end_time(), "00:01:05,432");
}

/// Test the untranslated/translated state transitions of an entry
#[test]
fn test_subtitle_entry_translation_state_shouldTrackResolution() {
    let mut entry = SubtitleEntry::new(1, 0, 2000, "Hello".to_string());

    // Untranslated lines render their source text
    assert!(entry.is_untranslated());
    assert_eq!(entry.output_text(), "Hello");

    // A blank translation does not count as resolved
    entry.translated_text = Some("   ".to_string());
    assert!(entry.is_untranslated());
    assert_eq!(entry.output_text(), "Hello");

    // A real translation does
    entry.translated_text = Some("Bonjour".to_string());
    assert!(!entry.is_untranslated());
    assert_eq!(entry.output_text(), "Bonjour");
}

/// Test entry validation rejects broken time ranges and empty text
#[test]
fn test_new_validated_withInvalidEntries_shouldFail() {
    assert!(SubtitleEntry::new_validated(1, 5000, 5000, "text".to_string()).is_err());
    assert!(SubtitleEntry::new_validated(1, 5000, 4000, "text".to_string()).is_err());
    assert!(SubtitleEntry::new_validated(1, 0, 1000, "   ".to_string()).is_err());
    assert!(SubtitleEntry::new_validated(1, 0, 1000, "text".to_string()).is_ok());
}

/// Test in-memory subtitle collection
#[test]
fn test_in_memory_subtitle_collection_withValidEntries_shouldStoreCorrectly() {
    // Create a collection
    let source_file = PathBuf::from("test.srt");
    let mut collection = SubtitleCollection::new(source_file.clone(), "en".to_string());

    // Add some entries
    collection.entries.push(SubtitleEntry::new(
        1, 0, 5000, "First subtitle".to_string()
    ));
    collection.entries.push(SubtitleEntry::new(
        2, 5500, 10000, "Second subtitle".to_string()
    ));

    // Check properties
    assert_eq!(collection.source_file, source_file);
    assert_eq!(collection.source_language, "en");
    assert_eq!(collection.entries.len(), 2);

    // Check bookkeeping
    assert_eq!(collection.translated_count(), 0);
    assert_eq!(collection.untranslated_ids(), vec![1, 2]);

    collection.entries[0].translated_text = Some("Premier sous-titre".to_string());
    assert_eq!(collection.translated_count(), 1);
    assert_eq!(collection.untranslated_ids(), vec![2]);
}

/// Test parsing SRT string content
#[test]
fn test_parse_srt_string_withValidContent_shouldParseCorrectly() -> Result<()> {
    let srt_content = "1\n00:00:01,000 --> 00:00:04,000\nHello world\n\n2\n00:00:05,000 --> 00:00:08,000\nTest subtitle\nSecond line\n\n";

    let entries = SubtitleCollection::parse_srt_string(srt_content)?;

    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[0].start_time_ms, 1000);
    assert_eq!(entries[0].end_time_ms, 4000);
    assert_eq!(entries[0].source_text, "Hello world");

    assert_eq!(entries[1].id, 2);
    assert_eq!(entries[1].start_time_ms, 5000);
    assert_eq!(entries[1].end_time_ms, 8000);
    assert_eq!(entries[1].source_text, "Test subtitle\nSecond line");

    Ok(())
}

/// Test that parsing sorts by start time and renumbers sequentially
#[test]
fn test_parse_srt_string_withOutOfOrderCues_shouldSortAndRenumber() -> Result<()> {
    let srt_content = "7\n00:00:10,000 --> 00:00:12,000\nSecond on screen\n\n3\n00:00:01,000 --> 00:00:04,000\nFirst on screen\n\n";

    let entries = SubtitleCollection::parse_srt_string(srt_content)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source_text, "First on screen");
    assert_eq!(entries[1].source_text, "Second on screen");

    // Ids are reassigned in timeline order, independent of the file's numbering
    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[1].id, 2);

    Ok(())
}

/// Test that invalid cues are skipped instead of failing the whole file
#[test]
fn test_parse_srt_string_withOneBrokenCue_shouldKeepTheRest() -> Result<()> {
    // The second cue has an inverted time range and gets dropped
    let srt_content = "1\n00:00:01,000 --> 00:00:04,000\nGood cue\n\n2\n00:00:08,000 --> 00:00:05,000\nBroken cue\n\n3\n00:00:10,000 --> 00:00:12,000\nAnother good cue\n\n";

    let entries = SubtitleCollection::parse_srt_string(srt_content)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source_text, "Good cue");
    assert_eq!(entries[1].source_text, "Another good cue");

    Ok(())
}

/// Test that content with no valid cues is an error
#[test]
fn test_parse_srt_string_withNoValidCues_shouldFail() {
    assert!(SubtitleCollection::parse_srt_string("just some prose, no cues").is_err());
    assert!(SubtitleCollection::parse_srt_string("").is_err());
}

/// Test loading a collection from an SRT file on disk
#[test]
fn test_from_srt_file_withValidFile_shouldLoadEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let subtitle_path = common::create_test_subtitle(&temp_dir.path().to_path_buf(), "test.srt")?;

    let collection = SubtitleCollection::from_srt_file(&subtitle_path, "en")?;

    assert_eq!(collection.source_language, "en");
    assert_eq!(collection.source_file, subtitle_path);
    assert_eq!(collection.entries.len(), 3);

    Ok(())
}

/// Test writing the translated track and reading it back
#[test]
fn test_write_translated_srt_shouldRoundTripThroughDisk() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output_path = temp_dir.path().join("out.fr.srt");

    let mut collection = SubtitleCollection::new(PathBuf::from("in.srt"), "en".to_string());
    collection.entries.push(SubtitleEntry::new(1, 0, 2000, "Hello".to_string()));
    collection.entries.push(SubtitleEntry::new(2, 2500, 4500, "Goodbye".to_string()));
    collection.entries[0].translated_text = Some("Bonjour".to_string());
    // Entry 2 stays unresolved and falls back to its source text

    collection.write_translated_srt(&output_path)?;

    let written = SubtitleCollection::parse_srt_string(&fs::read_to_string(&output_path)?)?;
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].source_text, "Bonjour");
    assert_eq!(written[1].source_text, "Goodbye");

    Ok(())
}

/// Test writing the stacked dual-language track
#[test]
fn test_write_dual_srt_shouldStackTranslationOverSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output_path = temp_dir.path().join("out.fr-en.srt");

    let mut collection = SubtitleCollection::new(PathBuf::from("in.srt"), "en".to_string());
    collection.entries.push(SubtitleEntry::new(1, 0, 2000, "Hello".to_string()));
    collection.entries.push(SubtitleEntry::new(2, 2500, 4500, "Goodbye".to_string()));
    collection.entries[0].translated_text = Some("Bonjour".to_string());

    collection.write_dual_srt(&output_path)?;

    let content = fs::read_to_string(&output_path)?;

    // Resolved lines carry both languages, translation first
    assert!(content.contains("Bonjour\nHello"));

    // Unresolved lines carry the source text once, not twice
    assert!(content.contains("Goodbye"));
    assert!(!content.contains("Goodbye\nGoodbye"));

    Ok(())
}
