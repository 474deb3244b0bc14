/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::Path;
use anyhow::Result;
use layoutlingo::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "paper.pdf", "%PDF-1.7")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

#[test]
fn test_is_pdf_path_shouldIgnoreCase() {
    assert!(FileManager::is_pdf_path("paper.pdf"));
    assert!(FileManager::is_pdf_path("PAPER.PDF"));
    assert!(!FileManager::is_pdf_path("paper.txt"));
    assert!(!FileManager::is_pdf_path("paper"));
}

#[test]
fn test_check_input_pdf_withMissingOrWrongFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let text_file = common::create_test_file(temp_dir.path(), "notes.txt", "hello")?;

    assert!(FileManager::check_input_pdf(temp_dir.path().join("missing.pdf")).is_err());
    assert!(FileManager::check_input_pdf(&text_file).is_err());
    Ok(())
}

#[test]
fn test_default_output_dir_shouldUseStemAndLanguage() {
    let output = FileManager::default_output_dir("/tmp/papers/attention.pdf", "ja");
    assert_eq!(output, Path::new("/tmp/papers/attention_ja"));
}

#[test]
fn test_page_file_name_shouldSortInPageOrder() {
    assert_eq!(FileManager::page_file_name(0), "000.pdf");
    assert_eq!(FileManager::page_file_name(12), "012.pdf");

    let mut names: Vec<String> = [10, 2, 1].iter().map(|i| FileManager::page_file_name(*i)).collect();
    names.sort();
    assert_eq!(names, vec!["001.pdf", "002.pdf", "010.pdf"]);
}

/// Test that ensure_dir creates directories as needed
#[test]
fn test_ensure_dir_withNonExistentDir_shouldCreateDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;

    assert!(nested.is_dir());
    Ok(())
}

#[test]
fn test_append_to_log_file_shouldAppendTimestampedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = temp_dir.path().join("logs").join("run.log");

    FileManager::append_to_log_file(&log_path, "first")?;
    FileManager::append_to_log_file(&log_path, "second")?;

    let content = fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("] second"));
    Ok(())
}
