/*!
 * Tests for file utility functions
 */

use std::fs;
use anyhow::Result;
use dualsub::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    // Create a temporary test file
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(&temp_dir.path().to_path_buf(), "test_file_exists.tmp", "test content")?;

    // Test that file_exists works correctly
    assert!(FileManager::file_exists(test_file.to_str().unwrap()));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that dir_exists returns true for existing directories
#[test]
fn test_dir_exists_withExistingDir_shouldReturnTrue() -> Result<()> {
    // Use the current directory which definitely exists
    let current_dir = ".";

    // Test that dir_exists works correctly
    assert!(FileManager::dir_exists(current_dir));

    Ok(())
}

/// Test that dir_exists returns false for non-existent directories
#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
}

/// Test that ensure_dir creates directories as needed
#[test]
fn test_ensure_dir_withNonExistentDir_shouldCreateDirectory() -> Result<()> {
    // Create a temporary directory for testing
    let temp_dir = common::create_temp_dir()?;
    let test_subdir = temp_dir.path().join("test_subdir");

    // Ensure the subdirectory exists (should create it)
    FileManager::ensure_dir(test_subdir.to_str().unwrap())?;

    // Verify the directory was created
    assert!(test_subdir.exists());
    assert!(test_subdir.is_dir());

    Ok(())
}

/// Test that read_to_string returns file content correctly
#[test]
fn test_read_to_string_withValidFile_shouldReturnContent() -> Result<()> {
    // Create a temporary test file
    let temp_dir = common::create_temp_dir()?;
    let content = "Hello, World!";
    let test_file = common::create_test_file(&temp_dir.path().to_path_buf(), "test_read_file.tmp", content)?;

    // Test read_to_string
    let read_content = FileManager::read_to_string(test_file.to_str().unwrap())?;
    assert_eq!(read_content, content);

    Ok(())
}

/// Test that read_to_string fails for missing files
#[test]
fn test_read_to_string_withMissingFile_shouldReturnError() {
    assert!(FileManager::read_to_string("non_existent_file.tmp").is_err());
}

/// Test that write_to_file creates file with content correctly
#[test]
fn test_write_to_file_withValidInput_shouldCreateFileWithContent() -> Result<()> {
    // Create a temporary directory for testing
    let temp_dir = common::create_temp_dir()?;
    let test_file = temp_dir.path().join("test_write_file.tmp");
    let content = "Test write content";

    // Test write_to_file
    FileManager::write_to_file(test_file.to_str().unwrap(), content)?;

    // Verify file was created with correct content
    assert!(test_file.exists());
    let read_content = fs::read_to_string(&test_file)?;
    assert_eq!(read_content, content);

    Ok(())
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withMissingParentDir_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested_file = temp_dir.path().join("nested").join("dir").join("out.log");

    FileManager::write_to_file(nested_file.to_str().unwrap(), "nested content")?;

    assert!(nested_file.exists());
    assert_eq!(fs::read_to_string(&nested_file)?, "nested content");

    Ok(())
}

/// Test that find_files locates files by extension, recursively
#[test]
fn test_find_files_withSrtFiles_shouldFindThemRecursively() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    let sub = root.join("season1");
    fs::create_dir_all(&sub)?;

    common::create_test_subtitle(&root, "movie.srt")?;
    common::create_test_subtitle(&sub, "episode1.srt")?;
    common::create_test_file(&root, "notes.txt", "not a subtitle")?;

    let mut found = FileManager::find_files(&root, "srt")?;
    found.sort();

    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|p| p.ends_with("movie.srt")));
    assert!(found.iter().any(|p| p.ends_with("episode1.srt")));

    Ok(())
}

/// Test that find_files matches extensions case-insensitively
#[test]
fn test_find_files_withUppercaseExtension_shouldStillMatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    common::create_test_subtitle(&root, "SHOUTING.SRT")?;

    let found = FileManager::find_files(&root, "srt")?;

    assert_eq!(found.len(), 1);

    Ok(())
}
