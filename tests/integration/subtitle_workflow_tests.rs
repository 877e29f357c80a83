/*!
 * Integration tests for the subtitle file workflow
 */

use anyhow::Result;
use dualsub::subtitle_processor::SubtitleCollection;
use dualsub::file_utils::FileManager;
use crate::common;

/// Test the full load, translate, write and reload workflow
#[test]
fn test_subtitleWorkflow_withTranslatedEntries_shouldRoundTripThroughFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source_path = common::create_test_subtitle(&temp_dir.path().to_path_buf(), "movie.srt")?;

    // Load the source track
    let mut collection = SubtitleCollection::from_srt_file(&source_path, "en")?;
    assert_eq!(collection.entries.len(), 3);
    assert_eq!(collection.translated_count(), 0);
    assert_eq!(collection.untranslated_ids(), vec![1, 2, 3]);

    // Simulate a completed translation run
    for entry in &mut collection.entries {
        entry.translated_text = Some(format!("[fr] {}", entry.source_text));
    }
    assert_eq!(collection.translated_count(), 3);
    assert!(collection.untranslated_ids().is_empty());

    // Write the translated track and parse it back
    let output_path = temp_dir.path().join("movie.fr.srt");
    collection.write_translated_srt(&output_path)?;

    let written = FileManager::read_to_string(&output_path)?;
    let reloaded = SubtitleCollection::parse_srt_string(&written)?;

    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded[0].source_text, "[fr] This is a test subtitle.");
    assert_eq!(reloaded[0].start_time_ms, 1000);
    assert_eq!(reloaded[2].source_text, "[fr] For testing purposes.");
    Ok(())
}

/// Test that a partially translated track still writes a renderable file
#[test]
fn test_subtitleWorkflow_withPartialTranslation_shouldFallBackToSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source_path = common::create_test_subtitle(&temp_dir.path().to_path_buf(), "movie.srt")?;

    let mut collection = SubtitleCollection::from_srt_file(&source_path, "en")?;
    collection.entries[0].translated_text = Some("Ceci est un sous-titre de test.".to_string());

    let output_path = temp_dir.path().join("movie.fr.srt");
    collection.write_translated_srt(&output_path)?;

    let written = FileManager::read_to_string(&output_path)?;
    let reloaded = SubtitleCollection::parse_srt_string(&written)?;

    assert_eq!(reloaded[0].source_text, "Ceci est un sous-titre de test.");
    // Untranslated lines keep their source text instead of going blank
    assert_eq!(reloaded[1].source_text, "It contains multiple entries.");
    Ok(())
}

/// Test the dual-language output stacks translation above source
#[test]
fn test_subtitleWorkflow_withDualOutput_shouldStackBothLanguages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source_path = common::create_test_subtitle(&temp_dir.path().to_path_buf(), "movie.srt")?;

    let mut collection = SubtitleCollection::from_srt_file(&source_path, "en")?;
    for entry in &mut collection.entries {
        entry.translated_text = Some(format!("[fr] {}", entry.source_text));
    }

    let output_path = temp_dir.path().join("movie.fr-en.srt");
    collection.write_dual_srt(&output_path)?;

    let written = FileManager::read_to_string(&output_path)?;
    assert!(written.contains("[fr] This is a test subtitle.\nThis is a test subtitle."));
    Ok(())
}

/// Test that output timestamps survive the write unchanged
#[test]
fn test_subtitleWorkflow_afterWrite_shouldPreserveTimestamps() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source_path = common::create_test_subtitle(&temp_dir.path().to_path_buf(), "movie.srt")?;

    let collection = SubtitleCollection::from_srt_file(&source_path, "en")?;
    let output_path = temp_dir.path().join("copy.srt");
    collection.write_translated_srt(&output_path)?;

    let reloaded = SubtitleCollection::from_srt_file(&output_path, "en")?;
    for (original, copy) in collection.entries.iter().zip(reloaded.entries.iter()) {
        assert_eq!(original.start_time_ms, copy.start_time_ms);
        assert_eq!(original.end_time_ms, copy.end_time_ms);
    }
    Ok(())
}

/// Test loading a file that does not exist
#[test]
fn test_subtitleWorkflow_withMissingFile_shouldFail() {
    let result = SubtitleCollection::from_srt_file("/nonexistent/path/movie.srt", "en");
    assert!(result.is_err());
}
