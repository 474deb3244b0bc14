use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::translation::GuardConfig;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Merge the per-page files into one document at the end of the run
    #[serde(default = "default_true")]
    pub merge: bool,

    /// Page processing settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Degenerate output detection
    #[serde(default)]
    pub guard: GuardConfig,

    /// Model services
    #[serde(default)]
    pub services: ServicesConfig,

    /// Fonts used to render translations
    #[serde(default)]
    pub fonts: FontsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How translated pages are laid out in the output
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// The translated page replaces the original
    #[default]
    Replace,
    /// Original and translated page side by side on one double-width page
    SideBySide,
}

/// Page processing settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Rasterization resolution
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Pages sent to the layout detector per call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Minimum detector score for a region to be used
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Chunks sent to the translator are shorter than this many characters
    #[serde(default = "default_chunk_char_limit")]
    pub chunk_char_limit: usize,

    /// Pages are scaled to this height before layout detection
    #[serde(default = "default_detection_height")]
    pub detection_height: u32,

    /// Horizontal margin added around text regions, in pixels
    #[serde(default = "default_crop_margin_x")]
    pub crop_margin_x: u32,

    /// Vertical margin added around text regions, in pixels
    #[serde(default = "default_crop_margin_y")]
    pub crop_margin_y: u32,

    /// Regions with fewer OCR lines are left untouched
    #[serde(default = "default_min_ocr_lines")]
    pub min_ocr_lines: usize,

    /// Untranslated pages are scaled to this height before writing
    #[serde(default = "default_passthrough_height")]
    pub passthrough_height: u32,

    #[serde(default)]
    pub output_layout: OutputLayout,

    /// Name of the merged document in the output directory
    #[serde(default = "default_merged_file_name")]
    pub merged_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            batch_size: default_batch_size(),
            min_confidence: default_min_confidence(),
            chunk_char_limit: default_chunk_char_limit(),
            detection_height: default_detection_height(),
            crop_margin_x: default_crop_margin_x(),
            crop_margin_y: default_crop_margin_y(),
            min_ocr_lines: default_min_ocr_lines(),
            passthrough_height: default_passthrough_height(),
            output_layout: OutputLayout::default(),
            merged_file_name: default_merged_file_name(),
        }
    }
}

/// Connection settings shared by every HTTP model service
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Service endpoint URL
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl ServiceConfig {
    fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Translation engine settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationServiceConfig {
    #[serde(flatten)]
    pub service: ServiceConfig,

    /// Model name (e.g., "llama3", "mistral")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationServiceConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::with_endpoint(DEFAULT_OLLAMA_ENDPOINT),
            model: default_ollama_model(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
        }
    }
}

/// Model service endpoints
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServicesConfig {
    /// Layout detection service
    pub layout: ServiceConfig,

    /// OCR service
    pub ocr: ServiceConfig,

    /// Translation engine
    pub translation: TranslationServiceConfig,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            layout: ServiceConfig::with_endpoint(DEFAULT_LAYOUT_ENDPOINT),
            ocr: ServiceConfig::with_endpoint(DEFAULT_OCR_ENDPOINT),
            translation: TranslationServiceConfig::default(),
        }
    }
}

/// A font file and the pixel size it is drawn at
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FontConfig {
    pub path: String,
    pub size: u32,
}

/// Fonts per script
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FontsConfig {
    /// Used for Chinese, Japanese and Korean targets
    pub fullwidth: FontConfig,

    /// Used for every other target
    pub latin: FontConfig,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            fullwidth: FontConfig {
                path: "fonts/SourceHanSerifCN-Light.otf".to_string(),
                size: 28,
            },
            latin: FontConfig {
                path: "fonts/AlegreyaSans-Regular.otf".to_string(),
                size: 34,
            },
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

const DEFAULT_LAYOUT_ENDPOINT: &str = "http://localhost:8501";
const DEFAULT_OCR_ENDPOINT: &str = "http://localhost:8502";
const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

fn default_dpi() -> u32 {
    300
}

fn default_batch_size() -> usize {
    8
}

fn default_min_confidence() -> f32 {
    0.7
}

fn default_chunk_char_limit() -> usize {
    450
}

fn default_detection_height() -> u32 {
    1000
}

fn default_crop_margin_x() -> u32 {
    20
}

fn default_crop_margin_y() -> u32 {
    10
}

fn default_min_ocr_lines() -> usize {
    2
}

fn default_passthrough_height() -> u32 {
    1400
}

fn default_merged_file_name() -> String {
    "translated.pdf".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Upper bound on service retries; backoff doubles on each one
const MAX_RETRY_COUNT: u32 = 10;

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional translator of scientific papers. Translate the following text from {source_language} to {target_language}. Reply with the translation only.".to_string()
}

impl Config {
    /// Load the configuration from `path`, writing a default one first when
    /// the file does not exist.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path));
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        let pipeline = &self.pipeline;
        if pipeline.dpi == 0 {
            return Err(anyhow!("pipeline.dpi must be greater than 0"));
        }
        if pipeline.batch_size == 0 {
            return Err(anyhow!("pipeline.batch_size must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&pipeline.min_confidence) {
            return Err(anyhow!(
                "pipeline.min_confidence must be between 0 and 1, got {}",
                pipeline.min_confidence
            ));
        }
        if pipeline.chunk_char_limit < 2 {
            return Err(anyhow!("pipeline.chunk_char_limit must be at least 2"));
        }
        if pipeline.detection_height == 0 || pipeline.passthrough_height == 0 {
            return Err(anyhow!("pipeline detection and pass-through heights must be greater than 0"));
        }
        if pipeline.merged_file_name.trim().is_empty() {
            return Err(anyhow!("pipeline.merged_file_name must not be empty"));
        }

        if self.guard.min_pattern_len == 0 || self.guard.min_occurrences < 2 {
            return Err(anyhow!(
                "guard.min_pattern_len must be positive and guard.min_occurrences at least 2"
            ));
        }

        for (name, service) in [
            ("layout", &self.services.layout),
            ("ocr", &self.services.ocr),
            ("translation", &self.services.translation.service),
        ] {
            url::Url::parse(&service.endpoint)
                .with_context(|| format!("Invalid {} endpoint: {}", name, service.endpoint))?;
            if service.retry_count > MAX_RETRY_COUNT {
                return Err(anyhow!(
                    "{} retry_count must be at most {}, got {}",
                    name,
                    MAX_RETRY_COUNT,
                    service.retry_count
                ));
            }
        }

        if self.services.translation.model.trim().is_empty() {
            return Err(anyhow!("Translation model name is required"));
        }

        if self.fonts.fullwidth.size == 0 || self.fonts.latin.size == 0 {
            return Err(anyhow!("Font sizes must be greater than 0"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "ja".to_string(),
            merge: true,
            pipeline: PipelineConfig::default(),
            guard: GuardConfig::default(),
            services: ServicesConfig::default(),
            fonts: FontsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
