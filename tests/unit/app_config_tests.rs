/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use layoutlingo::app_config::{Config, LogLevel, OutputLayout};
use layoutlingo::translation::MatchMode;
use crate::common;

/// Test that the default configuration passes validation
#[test]
fn test_default_config_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "ja");
    assert!(config.merge);
    assert_eq!(config.pipeline.dpi, 300);
    assert_eq!(config.pipeline.chunk_char_limit, 450);
    assert_eq!(config.pipeline.output_layout, OutputLayout::Replace);
    assert_eq!(config.guard.min_pattern_len, 10);
    assert_eq!(config.guard.min_occurrences, 15);
    assert_eq!(config.guard.match_mode, MatchMode::WholeWord);
}

/// Test that a missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.target_language, "ja");
    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.services.translation.model, config.services.translation.model);
    Ok(())
}

/// Test that a partial config file gets defaults for the missing sections
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "source_language": "en",
            "target_language": "zh",
            "pipeline": { "batch_size": 2, "output_layout": "side_by_side" },
            "guard": { "match_mode": "substring" },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.target_language, "zh");
    assert_eq!(config.pipeline.batch_size, 2);
    assert_eq!(config.pipeline.dpi, 300);
    assert_eq!(config.pipeline.output_layout, OutputLayout::SideBySide);
    assert_eq!(config.guard.match_mode, MatchMode::Substring);
    assert_eq!(config.guard.min_occurrences, 15);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.merge);
    assert_eq!(config.services.layout.endpoint, "http://localhost:8501");
    Ok(())
}

/// Test that a malformed config file is reported
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_validate_withInvalidLanguage_shouldFail() {
    let mut config = Config::default();
    config.target_language = "xx".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withInvalidEndpoint_shouldFail() {
    let mut config = Config::default();
    config.services.ocr.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withOutOfRangeSettings_shouldFail() {
    let mut config = Config::default();
    config.pipeline.min_confidence = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.pipeline.chunk_char_limit = 1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.guard.min_occurrences = 1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.services.translation.model = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withExcessiveRetryCount_shouldFail() {
    let mut config = Config::default();
    config.services.translation.service.retry_count = 64;
    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("retry_count"));

    let mut config = Config::default();
    config.services.layout.retry_count = 10;
    assert!(config.validate().is_ok());
}

#[test]
fn test_log_level_shouldMapToLevelFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
}
