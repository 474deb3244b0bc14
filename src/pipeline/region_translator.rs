/*!
 * Translation of a single text region: OCR, chunking, translation, clean-up,
 * reflow and rendering onto a canvas the size of the region.
 */

use image::imageops;
use image::{Rgb, RgbImage};
use log::{debug, warn};

use crate::errors::{RegionError, SkipReason};
use crate::layout::{BoundingBox, Reflow, Region};
use crate::pipeline::PipelineContext;
use crate::translation::{TextChunker, TextCleaner};

/// OCR text of a region and the box it will be repainted into
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub text: String,
    /// Margin-expanded, page-clamped bounds
    pub bounds: BoundingBox,
    pub contains_url: bool,
}

/// A rendered replacement for a region
#[derive(Debug, Clone)]
pub struct RepaintedRegion {
    pub bounds: BoundingBox,
    /// Exactly `bounds.width()` × `bounds.height()`
    pub image: RgbImage,
    /// The translation looked degenerate and the source text was drawn instead
    pub used_source_text: bool,
}

#[derive(Debug, Clone)]
pub enum RegionOutcome {
    Repainted(RepaintedRegion),
    Skipped(SkipReason),
}

/// Crop of `page` under `bounds`
pub(crate) fn crop(page: &RgbImage, bounds: &BoundingBox) -> RgbImage {
    imageops::crop_imm(page, bounds.x0, bounds.y0, bounds.width(), bounds.height()).to_image()
}

pub struct RegionTranslator<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> RegionTranslator<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    /// Margin-expanded bounds of a region, clamped to the page
    pub fn crop_bounds(&self, region: &Region, page: &RgbImage) -> BoundingBox {
        let settings = &self.ctx.settings;
        region.bounds.expand(
            settings.crop_margin_x,
            settings.crop_margin_y,
            page.width(),
            page.height(),
        )
    }

    /// OCR a region and build its translation unit. The inner `Err` carries
    /// the reason a region is not worth translating.
    pub async fn extract(
        &self,
        region: &Region,
        page: &RgbImage,
    ) -> Result<Result<TranslationUnit, SkipReason>, RegionError> {
        let bounds = self.crop_bounds(region, page);
        if bounds.is_empty() {
            return Ok(Err(SkipReason::EmptyBox));
        }

        let lines = self
            .ctx
            .ocr
            .recognize(&crop(page, &bounds))
            .await
            .map_err(RegionError::Ocr)?;

        if lines.len() < self.ctx.settings.min_ocr_lines {
            return Ok(Err(SkipReason::TooFewLines(lines.len())));
        }

        let text = TextCleaner::sanitize(&lines.join(" "));
        Ok(Ok(TranslationUnit {
            contains_url: TextCleaner::contains_url(&text),
            text,
            bounds,
        }))
    }

    /// Translate a unit's text chunk by chunk and clean the engine output
    pub async fn translate_text(&self, unit: &TranslationUnit) -> Result<String, RegionError> {
        let profile = &self.ctx.profile;
        let mut pieces = Vec::new();

        for chunk in TextChunker::split(&unit.text, self.ctx.settings.chunk_char_limit) {
            if chunk.trim().is_empty() {
                continue;
            }
            // Only regions holding a URL somewhere need the per-chunk check
            if unit.contains_url && TextCleaner::contains_url(&chunk) {
                pieces.push(chunk.trim().to_string());
                continue;
            }

            let translated = self
                .ctx
                .translator
                .translate(&chunk)
                .await
                .map_err(RegionError::Translation)?;

            match TextCleaner::clean_chunk(profile, &translated) {
                Some(cleaned) => pieces.push(cleaned),
                None => debug!("Dropped engine boilerplate chunk: {}", translated),
            }
        }

        Ok(TextCleaner::sanitize(&pieces.join(" ")).trim().to_string())
    }

    /// Full treatment of one text region. The page image is only read.
    pub async fn process(&self, region: &Region, page: &RgbImage) -> Result<RegionOutcome, RegionError> {
        let unit = match self.extract(region, page).await? {
            Ok(unit) => unit,
            Err(reason) => return Ok(RegionOutcome::Skipped(reason)),
        };

        let translated = self.translate_text(&unit).await?;
        if translated.is_empty() {
            return Ok(RegionOutcome::Skipped(SkipReason::EmptyTranslation));
        }

        let profile = &self.ctx.profile;
        if TextCleaner::is_script_mismatch(profile, &translated) {
            return Ok(RegionOutcome::Skipped(SkipReason::ScriptMismatch));
        }

        let (text, used_source_text) = if self.ctx.guard.is_degenerate(&translated) {
            warn!(
                "Degenerate translation for region {} ({} chars), keeping source text",
                region.order,
                translated.chars().count()
            );
            (unit.text.trim().to_string(), true)
        } else {
            (translated, false)
        };

        let script = profile.script;
        let painter = &self.ctx.painter;
        let width = Reflow::column_budget(unit.bounds.width(), painter.font_size(script));
        let wrapped = Reflow::wrap(&text, width, script);

        let mut canvas = RgbImage::from_pixel(unit.bounds.width(), unit.bounds.height(), Rgb([255, 255, 255]));
        painter.paint(&mut canvas, &wrapped, script);

        Ok(RegionOutcome::Repainted(RepaintedRegion {
            bounds: unit.bounds,
            image: canvas,
            used_source_text,
        }))
    }
}
