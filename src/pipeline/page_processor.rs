/*!
 * Per-page processing and the section state machine.
 *
 * Titles are read first, in detector order. A references heading fixes a
 * cut-off in detector order: text regions detected before it are translated,
 * everything after it is left alone, and the run stays in
 * `ReferencesReached` for the rest of the document. An abstract heading
 * marks the band above it (title, authors) to be restored from the original
 * page once all translations are painted.
 */

use image::imageops::{self, FilterType};
use image::RgbImage;
use log::{debug, warn};

use crate::errors::{PageError, ProviderError};
use crate::layout::{Region, RegionExtractor, RegionRole};
use crate::pdf::Page;
use crate::pipeline::region_translator::{crop, RegionOutcome, RegionTranslator};
use crate::pipeline::{PipelineContext, PipelineState, SectionState};

/// Meaning of a title region's first OCR line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    References,
    Abstract,
    Other,
}

impl Heading {
    pub fn classify(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "references" | "reference" => Self::References,
            "abstract" => Self::Abstract,
            _ => Self::Other,
        }
    }
}

/// What happened to the regions of one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageReport {
    pub translated: usize,
    /// Regions drawn with their source text after a degenerate translation
    pub source_fallbacks: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Text regions after the references heading
    pub after_cutoff: usize,
    /// Figures, tables, lists and background left as rendered
    pub preserved: usize,
    /// Human readable per-region problems
    pub issues: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub image: RgbImage,
    pub state: PipelineState,
    pub report: PageReport,
}

pub struct PageProcessor<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> PageProcessor<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    /// Copy of the page scaled to the detection height, and the scale used
    fn detection_input(&self, page: &Page) -> (RgbImage, f32) {
        let target = self.ctx.settings.detection_height;
        let (width, height) = page.image.dimensions();
        if height == target || height == 0 {
            return (page.image.clone(), 1.0);
        }

        let scale = target as f32 / height as f32;
        let scaled_width = ((width as f32 * scale).round() as u32).max(1);
        let resized = imageops::resize(&page.image, scaled_width, target, FilterType::Triangle);
        (resized, scale)
    }

    /// Detect regions on several pages with one batched detector call,
    /// falling back to one call per page when the batch call fails.
    pub async fn detect(&self, pages: &[&Page]) -> Vec<Result<Vec<Region>, PageError>> {
        let inputs: Vec<(RgbImage, f32)> = pages.iter().map(|p| self.detection_input(p)).collect();
        let images: Vec<RgbImage> = inputs.iter().map(|(image, _)| image.clone()).collect();

        let raw: Vec<Result<_, ProviderError>> = match self.ctx.detector.detect_batch(&images).await {
            Ok(results) if results.len() == images.len() => results.into_iter().map(Ok).collect(),
            outcome => {
                match outcome {
                    Ok(results) => warn!(
                        "{}; detecting pages one by one",
                        PageError::DetectionCount { expected: images.len(), got: results.len() }
                    ),
                    Err(e) => warn!("Batch layout detection failed: {}; detecting pages one by one", e),
                }
                let mut results = Vec::with_capacity(images.len());
                for image in &images {
                    results.push(self.ctx.detector.detect(image).await);
                }
                results
            }
        };

        raw.into_iter()
            .zip(pages.iter().zip(inputs.iter()))
            .map(|(result, (page, (_, scale)))| -> Result<Vec<Region>, PageError> {
                let detections = result?;
                let regions = Region::from_detections(
                    &detections,
                    *scale,
                    page.image.width(),
                    page.image.height(),
                );
                debug!("Page {}: {} regions detected", page.index, regions.len());
                Ok(regions)
            })
            .collect()
    }

    /// First OCR line of a title region
    async fn read_heading(&self, title: &Region, page: &RgbImage) -> Result<Heading, ProviderError> {
        let bounds = RegionTranslator::new(self.ctx).crop_bounds(title, page);
        if bounds.is_empty() {
            return Ok(Heading::Other);
        }
        let lines = self.ctx.ocr.recognize(&crop(page, &bounds)).await?;
        Ok(lines.first().map(|line| Heading::classify(line)).unwrap_or(Heading::Other))
    }

    /// Translate one page. Region failures are recorded in the report and
    /// never abort the page.
    pub async fn process(&self, page: &Page, regions: &[Region], state: PipelineState) -> PageOutcome {
        let mut state = state;
        let mut report = PageReport::default();
        let mut working = page.image.clone();

        if state.reached_references() {
            return PageOutcome { image: working, state, report };
        }

        let min_confidence = self.ctx.settings.min_confidence;
        let mut cutoff: Option<usize> = None;
        let mut abstract_bands: Vec<u32> = Vec::new();

        report.preserved = RegionExtractor::by_role(regions, RegionRole::Preserve, min_confidence).len();

        for title in RegionExtractor::by_role(regions, RegionRole::SectionMarker, min_confidence) {
            match self.read_heading(&title, &page.image).await {
                Ok(Heading::References) => {
                    debug!("Page {}: references heading at region {}", page.index, title.order);
                    cutoff = Some(title.order);
                    state.section = SectionState::ReferencesReached;
                    break;
                }
                Ok(Heading::Abstract) => abstract_bands.push(title.bounds.y0),
                Ok(Heading::Other) => {}
                Err(e) => {
                    report.failed += 1;
                    report.issues.push(format!("title region {}: OCR failed: {}", title.order, e));
                }
            }
        }

        let translator = RegionTranslator::new(self.ctx);
        for region in RegionExtractor::by_role(regions, RegionRole::Translate, min_confidence) {
            if cutoff.is_some_and(|c| region.order > c) {
                report.after_cutoff += 1;
                continue;
            }

            match translator.process(&region, &page.image).await {
                Ok(RegionOutcome::Repainted(repainted)) => {
                    imageops::replace(
                        &mut working,
                        &repainted.image,
                        repainted.bounds.x0 as i64,
                        repainted.bounds.y0 as i64,
                    );
                    report.translated += 1;
                    if repainted.used_source_text {
                        report.source_fallbacks += 1;
                        report.issues.push(format!(
                            "text region {}: degenerate translation, source text kept",
                            region.order
                        ));
                    }
                }
                Ok(RegionOutcome::Skipped(reason)) => {
                    debug!("Page {}: region {} skipped: {}", page.index, region.order, reason);
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!("Page {}: region {} left untranslated: {}", page.index, region.order, e);
                    report.failed += 1;
                    report.issues.push(format!("text region {}: {}", region.order, e));
                }
            }
        }

        for band_bottom in abstract_bands {
            let height = band_bottom.min(page.image.height());
            if height == 0 {
                continue;
            }
            let band = imageops::crop_imm(&page.image, 0, 0, page.image.width(), height).to_image();
            imageops::replace(&mut working, &band, 0, 0);
        }

        PageOutcome { image: working, state, report }
    }
}
