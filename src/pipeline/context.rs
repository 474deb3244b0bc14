/*!
 * Everything a run needs, passed explicitly from the driver down.
 */

use std::sync::Arc;

use log::info;

use crate::app_config::{Config, OutputLayout};
use crate::errors::AppError;
use crate::language_utils::LanguageProfile;
use crate::providers::{LayoutDetector, OcrEngine, TextTranslator};
use crate::render::TextPainter;
use crate::translation::{DegeneracyGuard, GuardConfig};

/// Numeric knobs of the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub dpi: u32,
    pub batch_size: usize,
    pub min_confidence: f32,
    pub chunk_char_limit: usize,
    pub detection_height: u32,
    pub crop_margin_x: u32,
    pub crop_margin_y: u32,
    pub min_ocr_lines: usize,
    pub passthrough_height: u32,
    pub output_layout: OutputLayout,
    /// Merge per-page files into one document
    pub merge: bool,
    pub merged_file_name: String,
    pub guard: GuardConfig,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        let pipeline = &config.pipeline;
        Self {
            dpi: pipeline.dpi,
            batch_size: pipeline.batch_size,
            min_confidence: pipeline.min_confidence,
            chunk_char_limit: pipeline.chunk_char_limit,
            detection_height: pipeline.detection_height,
            crop_margin_x: pipeline.crop_margin_x,
            crop_margin_y: pipeline.crop_margin_y,
            min_ocr_lines: pipeline.min_ocr_lines,
            passthrough_height: pipeline.passthrough_height,
            output_layout: pipeline.output_layout,
            merge: config.merge,
            merged_file_name: pipeline.merged_file_name.clone(),
            guard: config.guard.clone(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Where the scan of the document stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionState {
    /// Body text, keep translating
    #[default]
    Scanning,
    /// A references heading was seen; nothing after it is translated
    ReferencesReached,
}

/// State threaded from page to page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineState {
    pub section: SectionState,
}

impl PipelineState {
    pub fn reached_references(&self) -> bool {
        self.section == SectionState::ReferencesReached
    }
}

/// Collaborators, settings and target language of one run
pub struct PipelineContext {
    pub detector: Arc<dyn LayoutDetector>,
    pub ocr: Arc<dyn OcrEngine>,
    pub translator: Arc<dyn TextTranslator>,
    pub painter: Arc<dyn TextPainter>,
    pub settings: PipelineSettings,
    pub profile: LanguageProfile,
    pub guard: DegeneracyGuard,
}

impl PipelineContext {
    pub fn new(
        detector: Arc<dyn LayoutDetector>,
        ocr: Arc<dyn OcrEngine>,
        translator: Arc<dyn TextTranslator>,
        painter: Arc<dyn TextPainter>,
        settings: PipelineSettings,
        profile: LanguageProfile,
    ) -> Self {
        let guard = DegeneracyGuard::new(settings.guard.clone());
        Self {
            detector,
            ocr,
            translator,
            painter,
            settings,
            profile,
            guard,
        }
    }

    /// Check every external service; any failure aborts the run
    pub async fn check_services(&self) -> Result<(), AppError> {
        self.detector
            .check()
            .await
            .map_err(|e| AppError::Startup(format!("Layout detector unavailable: {}", e)))?;
        self.ocr
            .check()
            .await
            .map_err(|e| AppError::Startup(format!("OCR engine unavailable: {}", e)))?;
        self.translator
            .check()
            .await
            .map_err(|e| AppError::Startup(format!("Translator unavailable: {}", e)))?;

        info!("Layout, OCR and translation services are reachable");
        Ok(())
    }
}
