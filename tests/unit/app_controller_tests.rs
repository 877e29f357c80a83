/*!
 * Tests for application controller functionality
 */

use std::path::Path;
use anyhow::Result;
use dualsub::app_config::Config;
use dualsub::app_controller::Controller;
use dualsub::file_utils::FileManager;
use dualsub::pipeline::{EventKind, EventLog, EventSink, PipelineEvent};
use crate::common;

/// Test creating a controller with the default configuration
#[test]
fn test_new_with_default_config_shouldSucceed() -> Result<()> {
    let controller = Controller::new_for_test()?;
    assert!(controller.is_initialized());
    Ok(())
}

/// Test creating a controller with a specific configuration
#[test]
fn test_with_config_withValidConfig_shouldCreateController() -> Result<()> {
    let mut config = Config::default();
    config.target_language = "de".to_string();
    let controller = Controller::with_config(config)?;
    assert!(controller.is_initialized());
    Ok(())
}

/// Test that cancellation requests are visible through the controller
#[test]
fn test_requestCancel_shouldSetShutdownFlag() -> Result<()> {
    let controller = Controller::new_for_test()?;
    assert!(!controller.is_shutdown_requested());

    controller.request_cancel();

    assert!(controller.is_shutdown_requested());
    Ok(())
}

/// Test output filename generation for a simple input name
#[test]
fn test_translatedOutputFilename_withSimpleName_shouldAppendLanguageToken() -> Result<()> {
    let controller = Controller::new_for_test()?;

    let filename = controller.translated_output_filename(Path::new("movie.srt"));

    assert_eq!(filename, "movie.fr.srt");
    Ok(())
}

/// Test output filename generation when the input already carries a language token
#[test]
fn test_translatedOutputFilename_withLanguageToken_shouldReplaceToken() -> Result<()> {
    let controller = Controller::new_for_test()?;

    let filename = controller.translated_output_filename(Path::new("show.s01e01.en.srt"));

    assert_eq!(filename, "show.s01e01.fr.srt");
    Ok(())
}

/// Test output filename generation follows the configured target language
#[test]
fn test_translatedOutputFilename_withCustomTarget_shouldUseConfiguredLanguage() -> Result<()> {
    let mut config = Config::default();
    config.target_language = "de".to_string();
    let controller = Controller::with_config(config)?;

    let filename = controller.translated_output_filename(Path::new("movie.srt"));

    assert_eq!(filename, "movie.de.srt");
    Ok(())
}

/// Test dual-language output filename generation
#[test]
fn test_dualOutputFilename_withSimpleName_shouldUsePairedToken() -> Result<()> {
    let controller = Controller::new_for_test()?;

    let filename = controller.dual_output_filename(Path::new("movie.srt"));

    assert_eq!(filename, "movie.fr-en.srt");
    Ok(())
}

/// Test writing captured pipeline events to an issues file
#[test]
fn test_writeIssuesFile_withCapturedEvents_shouldWriteHeaderAndEvents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test()?;

    let events = EventLog::new();
    events.record(PipelineEvent::new(EventKind::Error, "Chunk 2 failed after 3 attempts"));
    events.record(PipelineEvent::new(EventKind::Info, "Verification pass 1 recovered 4 lines"));

    let issues_path = temp_dir.path().join("movie.issues.log");
    controller.write_issues_file(&events, "movie.srt", &issues_path)?;

    let content = FileManager::read_to_string(&issues_path)?;
    assert!(content.starts_with("Translation issues - "));
    assert!(content.contains("Context: movie.srt"));
    assert!(content.contains("Chunk 2 failed after 3 attempts"));
    assert!(content.contains("Verification pass 1 recovered 4 lines"));
    Ok(())
}
