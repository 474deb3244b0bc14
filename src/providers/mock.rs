/*!
 * Mock collaborators for testing.
 *
 * Everything here is deterministic and keyed on pixel colors so tests can
 * script a whole document:
 * - `MockDetector` picks a page's detections by the color of its top-left pixel
 * - `MockOcr` picks a crop's lines by the color of its center pixel
 * - `MockTranslator::working()` / `failing()` / `degenerate()` / `custom()`
 * - `BlockPainter` draws one bar per line instead of glyphs
 * - `MemoryRasterizer` and `MemoryPageSink` keep pages in memory
 */

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::errors::{DocumentError, ProviderError};
use crate::file_utils::FileManager;
use crate::language_utils::Script;
use crate::layout::reflow::text_width;
use crate::layout::Detection;
use crate::pdf::{DocumentRasterizer, DocumentSource, Page, PageLayout, PageSink};
use crate::providers::{LayoutDetector, OcrEngine, TextTranslator};
use crate::render::TextPainter;

fn unavailable(name: &str) -> ProviderError {
    ProviderError::ConnectionError(format!("mock {} is unavailable", name))
}

/// Layout detector returning scripted detections per page marker color
#[derive(Debug, Default)]
pub struct MockDetector {
    pages: HashMap<[u8; 3], Vec<Detection>>,
    failing: HashSet<[u8; 3]>,
    healthy: bool,
    batch_calls: AtomicUsize,
    single_calls: AtomicUsize,
}

impl MockDetector {
    pub fn new() -> Self {
        Self { healthy: true, ..Self::default() }
    }

    /// Detections for pages whose pixel (0, 0) has `marker` color
    pub fn with_page(mut self, marker: [u8; 3], detections: Vec<Detection>) -> Self {
        self.pages.insert(marker, detections);
        self
    }

    /// Fail detection for pages with `marker` color
    pub fn failing_on(mut self, marker: [u8; 3]) -> Self {
        self.failing.insert(marker);
        self
    }

    /// Fail the startup check
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, image: &RgbImage) -> Result<Vec<Detection>, ProviderError> {
        let marker = image.get_pixel(0, 0).0;
        if self.failing.contains(&marker) {
            return Err(ProviderError::RequestFailed(format!("detection failed for page {:?}", marker)));
        }
        Ok(self.pages.get(&marker).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl LayoutDetector for MockDetector {
    async fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, ProviderError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(image)
    }

    async fn detect_batch(&self, images: &[RgbImage]) -> Result<Vec<Vec<Detection>>, ProviderError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        images.iter().map(|image| self.lookup(image)).collect()
    }

    async fn check(&self) -> Result<(), ProviderError> {
        if self.healthy { Ok(()) } else { Err(unavailable("detector")) }
    }
}

/// OCR engine returning scripted lines per region color
#[derive(Debug, Default)]
pub struct MockOcr {
    regions: HashMap<[u8; 3], Vec<String>>,
    failing: HashSet<[u8; 3]>,
    healthy: bool,
    calls: AtomicUsize,
}

impl MockOcr {
    pub fn new() -> Self {
        Self { healthy: true, ..Self::default() }
    }

    /// Lines for crops whose center pixel has `color`
    pub fn with_region(mut self, color: [u8; 3], lines: &[&str]) -> Self {
        self.regions.insert(color, lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Fail recognition for crops whose center pixel has `color`
    pub fn failing_on(mut self, color: [u8; 3]) -> Self {
        self.failing.insert(color);
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn recognize(&self, image: &RgbImage) -> Result<Vec<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }
        let color = image.get_pixel(image.width() / 2, image.height() / 2).0;
        if self.failing.contains(&color) {
            return Err(ProviderError::RequestFailed(format!("OCR failed for region {:?}", color)));
        }
        Ok(self.regions.get(&color).cloned().unwrap_or_default())
    }

    async fn check(&self) -> Result<(), ProviderError> {
        if self.healthy { Ok(()) } else { Err(unavailable("OCR engine")) }
    }
}

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy)]
pub enum TranslatorBehavior {
    /// Prefixes every chunk with `TR:`
    Working,
    /// Always fails with an error
    Failing,
    /// Loops on one phrase
    Degenerate,
    /// Applies a custom function
    Custom(fn(&str) -> String),
}

/// Mock translator for testing translation behavior
#[derive(Debug)]
pub struct MockTranslator {
    behavior: TranslatorBehavior,
    healthy: bool,
    calls: AtomicUsize,
    received: Mutex<Vec<String>>,
}

impl MockTranslator {
    pub fn new(behavior: TranslatorBehavior) -> Self {
        Self {
            behavior,
            healthy: true,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn working() -> Self {
        Self::new(TranslatorBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(TranslatorBehavior::Failing)
    }

    pub fn degenerate() -> Self {
        Self::new(TranslatorBehavior::Degenerate)
    }

    pub fn custom(translate: fn(&str) -> String) -> Self {
        Self::new(TranslatorBehavior::Custom(translate))
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Chunks received so far, in call order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextTranslator for MockTranslator {
    async fn translate(&self, chunk: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push(chunk.to_string());
        }

        match self.behavior {
            TranslatorBehavior::Working => Ok(format!("TR:{}", chunk)),
            TranslatorBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "mock translation failure".to_string(),
            }),
            TranslatorBehavior::Degenerate => Ok("loop again, ".repeat(20)),
            TranslatorBehavior::Custom(translate) => Ok(translate(chunk)),
        }
    }

    async fn check(&self) -> Result<(), ProviderError> {
        if self.healthy { Ok(()) } else { Err(unavailable("translator")) }
    }
}

/// Draws a black bar per line, as wide as the line's columns
#[derive(Debug, Clone)]
pub struct BlockPainter {
    pub fullwidth_size: u32,
    pub latin_size: u32,
}

impl Default for BlockPainter {
    fn default() -> Self {
        Self { fullwidth_size: 28, latin_size: 34 }
    }
}

impl TextPainter for BlockPainter {
    fn font_size(&self, script: Script) -> u32 {
        match script {
            Script::Fullwidth => self.fullwidth_size,
            Script::Latin => self.latin_size,
        }
    }

    fn paint(&self, canvas: &mut RgbImage, text: &str, script: Script) {
        let size = self.font_size(script).max(2);
        let column = size / 2;
        for (i, line) in text.lines().enumerate() {
            let width = (text_width(line) as u32 * column).min(canvas.width());
            if width == 0 {
                continue;
            }
            let rect = Rect::at(0, (i as u32 * size) as i32).of_size(width, column);
            draw_filled_rect_mut(canvas, rect, Rgb([0, 0, 0]));
        }
    }
}

/// Rasterizer serving pre-built page images
#[derive(Debug, Clone, Default)]
pub struct MemoryRasterizer {
    pages: Vec<RgbImage>,
}

impl MemoryRasterizer {
    pub fn new(pages: Vec<RgbImage>) -> Self {
        Self { pages }
    }
}

impl DocumentRasterizer for MemoryRasterizer {
    fn rasterize(&self, _source: &DocumentSource, dpi: u32) -> Result<Vec<Page>, DocumentError> {
        if self.pages.is_empty() {
            return Err(DocumentError::EmptyDocument);
        }
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(index, image)| Page { index, image: image.clone(), dpi })
            .collect())
    }
}

/// A page handed to `MemoryPageSink`
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenPage {
    pub index: usize,
    pub image: RgbImage,
    pub layout: PageLayout,
}

/// Page sink keeping written pages in memory
#[derive(Debug, Default)]
pub struct MemoryPageSink {
    written: Mutex<Vec<WrittenPage>>,
    merged: Mutex<Option<(Vec<PathBuf>, PathBuf)>>,
}

impl MemoryPageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages in write order
    pub fn pages(&self) -> Vec<WrittenPage> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Inputs and target of the last merge
    pub fn merged(&self) -> Option<(Vec<PathBuf>, PathBuf)> {
        self.merged.lock().ok().and_then(|m| m.clone())
    }
}

impl PageSink for MemoryPageSink {
    fn write_page(
        &self,
        index: usize,
        image: &RgbImage,
        layout: &PageLayout,
    ) -> Result<PathBuf, DocumentError> {
        let mut written = self.written.lock().map_err(|e| DocumentError::WriteError {
            page: index,
            message: e.to_string(),
        })?;
        written.push(WrittenPage { index, image: image.clone(), layout: *layout });
        Ok(PathBuf::from(FileManager::page_file_name(index)))
    }

    fn merge(&self, pages: &[PathBuf], output: &Path) -> Result<PathBuf, DocumentError> {
        let mut merged = self
            .merged
            .lock()
            .map_err(|e| DocumentError::MergeError(e.to_string()))?;
        *merged = Some((pages.to_vec(), output.to_path_buf()));
        Ok(output.to_path_buf())
    }
}
