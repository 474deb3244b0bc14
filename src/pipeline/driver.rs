/*!
 * Document-level orchestration: rasterize, detect in batches, process or
 * pass pages through, write every page and merge them in page order.
 */

use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::RgbImage;
use indicatif::ProgressBar;
use log::{info, warn};

use crate::app_config::OutputLayout;
use crate::errors::DocumentError;
use crate::pdf::{DocumentRasterizer, DocumentSource, Page, PageLayout, PageSink};
use crate::pipeline::page_processor::{PageProcessor, PageReport};
use crate::pipeline::{PipelineContext, PipelineState};

/// How a page ended up in the output
#[derive(Debug, Clone, PartialEq)]
pub enum PageDisposition {
    /// Processed, possibly with some regions left untouched
    Translated,
    /// At or after the references section
    PassThrough,
    /// Processing failed; the page was passed through
    Failed(String),
}

/// Outcome of one page
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub index: usize,
    pub disposition: PageDisposition,
    pub path: PathBuf,
    pub report: PageReport,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One record per input page, in page order
    pub pages: Vec<PageRecord>,
    /// The merged document, when merging was requested
    pub merged: Option<PathBuf>,
    pub final_state: PipelineState,
}

impl RunReport {
    pub fn count(&self, predicate: impl Fn(&PageDisposition) -> bool) -> usize {
        self.pages.iter().filter(|p| predicate(&p.disposition)).count()
    }

    pub fn translated_pages(&self) -> usize {
        self.count(|d| *d == PageDisposition::Translated)
    }

    pub fn passthrough_pages(&self) -> usize {
        self.count(|d| *d == PageDisposition::PassThrough)
    }

    pub fn failed_pages(&self) -> usize {
        self.count(|d| matches!(d, PageDisposition::Failed(_)))
    }

    /// One line per page-level or region-level problem
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for page in &self.pages {
            if let PageDisposition::Failed(reason) = &page.disposition {
                issues.push(format!("page {:03}: passed through after failure: {}", page.index, reason));
            }
            for issue in &page.report.issues {
                issues.push(format!("page {:03}: {}", page.index, issue));
            }
        }
        issues
    }
}

/// Runs the pipeline over one document
pub struct PipelineDriver<'a> {
    ctx: &'a PipelineContext,
    rasterizer: &'a dyn DocumentRasterizer,
    sink: &'a dyn PageSink,
    output_dir: PathBuf,
    progress: Option<ProgressBar>,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(
        ctx: &'a PipelineContext,
        rasterizer: &'a dyn DocumentRasterizer,
        sink: &'a dyn PageSink,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ctx,
            rasterizer,
            sink,
            output_dir: output_dir.into(),
            progress: None,
        }
    }

    /// Report page progress on `progress`; its length is set once pages are known
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Page scaled to the pass-through height, on the source page's physical size
    fn passthrough(&self, page: &Page) -> (RgbImage, PageLayout) {
        let target = self.ctx.settings.passthrough_height;
        let (width, height) = page.image.dimensions();
        let image = if height == target || height == 0 {
            page.image.clone()
        } else {
            let scaled_width = ((width as f64 * target as f64 / height as f64) as u32).max(1);
            imageops::resize(&page.image, scaled_width, target, FilterType::Triangle)
        };
        (image, page.layout())
    }

    /// Translated page in the configured output layout
    fn compose(&self, page: &Page, translated: RgbImage) -> (RgbImage, PageLayout) {
        let layout = page.layout();
        match self.ctx.settings.output_layout {
            OutputLayout::Replace => (translated, layout),
            OutputLayout::SideBySide => {
                let (width, height) = page.image.dimensions();
                let mut canvas = RgbImage::new(width * 2, height);
                imageops::replace(&mut canvas, &page.image, 0, 0);
                imageops::replace(&mut canvas, &translated, width as i64, 0);
                let layout = PageLayout {
                    width_pt: layout.width_pt * 2.0,
                    height_pt: layout.height_pt,
                };
                (canvas, layout)
            }
        }
    }

    /// Translate `source` and write every page to the output directory.
    /// Only rasterization and writing errors abort the run.
    pub async fn run(&self, source: &DocumentSource) -> Result<RunReport, DocumentError> {
        let settings = &self.ctx.settings;
        let pages = self.rasterizer.rasterize(source, settings.dpi)?;
        if pages.is_empty() {
            return Err(DocumentError::EmptyDocument);
        }
        info!("Rasterized {} pages at {} dpi", pages.len(), settings.dpi);

        if let Some(progress) = &self.progress {
            progress.set_length(pages.len() as u64);
        }

        let processor = PageProcessor::new(self.ctx);
        let mut state = PipelineState::default();
        let mut report = RunReport::default();

        for batch in pages.chunks(settings.batch_size.max(1)) {
            let mut detections = if state.reached_references() {
                Vec::new()
            } else {
                let refs: Vec<&Page> = batch.iter().collect();
                processor.detect(&refs).await
            }
            .into_iter();

            for page in batch {
                let detected = detections.next();

                let (image, layout, disposition, page_report) = match detected {
                    _ if state.reached_references() => {
                        let (image, layout) = self.passthrough(page);
                        (image, layout, PageDisposition::PassThrough, PageReport::default())
                    }
                    Some(Ok(regions)) => {
                        let outcome = processor.process(page, &regions, state).await;
                        state = outcome.state;
                        let (image, layout) = self.compose(page, outcome.image);
                        (image, layout, PageDisposition::Translated, outcome.report)
                    }
                    Some(Err(e)) => {
                        warn!("Page {} passed through: {}", page.index, e);
                        let (image, layout) = self.passthrough(page);
                        (image, layout, PageDisposition::Failed(e.to_string()), PageReport::default())
                    }
                    None => {
                        let reason = "no detection result".to_string();
                        warn!("Page {} passed through: {}", page.index, reason);
                        let (image, layout) = self.passthrough(page);
                        (image, layout, PageDisposition::Failed(reason), PageReport::default())
                    }
                };

                let path = self.sink.write_page(page.index, &image, &layout)?;
                report.pages.push(PageRecord {
                    index: page.index,
                    disposition,
                    path,
                    report: page_report,
                });

                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
            }
        }

        report.final_state = state;

        if settings.merge {
            let paths: Vec<PathBuf> = report.pages.iter().map(|p| p.path.clone()).collect();
            let output = self.merged_path();
            report.merged = Some(self.sink.merge(&paths, &output)?);
            info!("Merged {} pages into {:?}", paths.len(), output);
        }

        Ok(report)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output_dir.join(&self.ctx.settings.merged_file_name)
    }
}
