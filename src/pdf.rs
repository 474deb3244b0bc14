/*!
 * PDF input and output.
 *
 * Pages are rasterized once at the start of a run; every output page is a
 * single-page PDF holding one full-page image, and the final document is the
 * concatenation of those files in page order.
 */

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use log::debug;
use pdfium_render::prelude::*;

use crate::errors::DocumentError;
use crate::file_utils::FileManager;

/// Points per inch in PDF user space
const POINTS_PER_INCH: f32 = 72.0;

/// Where the input document comes from
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// One rasterized input page
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based position in the input document
    pub index: usize,
    pub image: RgbImage,
    /// Resolution the page was rendered at
    pub dpi: u32,
}

impl Page {
    /// Physical page size in points
    pub fn layout(&self) -> PageLayout {
        let dpi = self.dpi.max(1) as f32;
        PageLayout {
            width_pt: self.image.width() as f32 * POINTS_PER_INCH / dpi,
            height_pt: self.image.height() as f32 * POINTS_PER_INCH / dpi,
        }
    }
}

/// Physical size of an output page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Turns a document into page images
pub trait DocumentRasterizer {
    fn rasterize(&self, source: &DocumentSource, dpi: u32) -> Result<Vec<Page>, DocumentError>;
}

/// Persists output pages and assembles the final document
pub trait PageSink {
    /// Write one page, stretched to `layout`, and return where it went
    fn write_page(
        &self,
        index: usize,
        image: &RgbImage,
        layout: &PageLayout,
    ) -> Result<PathBuf, DocumentError>;

    /// Concatenate previously written pages, in the given order, into `output`
    fn merge(&self, pages: &[PathBuf], output: &Path) -> Result<PathBuf, DocumentError>;
}

/// PDFium-backed rasterizer and writer
pub struct PdfiumBackend {
    pdfium: Pdfium,
    output_dir: PathBuf,
}

impl PdfiumBackend {
    /// Bind to a PDFium library next to the binary or installed system-wide
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib")))
            .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/local/lib")))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| DocumentError::BackendInit(format!("Could not find PDFium library: {}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            output_dir: output_dir.into(),
        })
    }

    fn render_page(&self, page: &PdfPage, index: usize, dpi: u32) -> Result<RgbImage, DocumentError> {
        let scale = dpi as f32 / POINTS_PER_INCH;
        let width_px = (page.width().value * scale) as i32;
        let height_px = (page.height().value * scale) as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_target_height(height_px)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| DocumentError::RenderError {
                page: index,
                message: e.to_string(),
            })?;

        Ok(bitmap.as_image().to_rgb8())
    }
}

impl DocumentRasterizer for PdfiumBackend {
    fn rasterize(&self, source: &DocumentSource, dpi: u32) -> Result<Vec<Page>, DocumentError> {
        let document = match source {
            DocumentSource::Path(path) => self.pdfium.load_pdf_from_file(path, None),
            DocumentSource::Bytes(bytes) => self.pdfium.load_pdf_from_byte_slice(bytes, None),
        }
        .map_err(|e| DocumentError::LoadError(e.to_string()))?;

        if document.pages().len() == 0 {
            return Err(DocumentError::EmptyDocument);
        }

        let mut pages = Vec::with_capacity(document.pages().len() as usize);
        for (index, page) in document.pages().iter().enumerate() {
            let image = self.render_page(&page, index, dpi)?;
            debug!("Rasterized page {} at {}x{}", index, image.width(), image.height());
            pages.push(Page { index, image, dpi });
        }

        Ok(pages)
    }
}

impl PageSink for PdfiumBackend {
    fn write_page(
        &self,
        index: usize,
        image: &RgbImage,
        layout: &PageLayout,
    ) -> Result<PathBuf, DocumentError> {
        let write_error = |e: PdfiumError| DocumentError::WriteError {
            page: index,
            message: e.to_string(),
        };

        FileManager::ensure_dir(&self.output_dir).map_err(|e| DocumentError::WriteError {
            page: index,
            message: e.to_string(),
        })?;

        let width = PdfPoints::new(layout.width_pt);
        let height = PdfPoints::new(layout.height_pt);

        let mut document = self.pdfium.create_new_pdf().map_err(write_error)?;
        {
            let mut page = document
                .pages_mut()
                .create_page_at_end(PdfPagePaperSize::from_points(width, height))
                .map_err(write_error)?;

            let image = DynamicImage::ImageRgb8(image.clone());
            page.objects_mut()
                .create_image_object(
                    PdfPoints::new(0.0),
                    PdfPoints::new(0.0),
                    &image,
                    Some(width),
                    Some(height),
                )
                .map_err(write_error)?;
        }

        let path = self.output_dir.join(FileManager::page_file_name(index));
        document.save_to_file(&path).map_err(write_error)?;

        Ok(path)
    }

    fn merge(&self, pages: &[PathBuf], output: &Path) -> Result<PathBuf, DocumentError> {
        let merge_error = |e: PdfiumError| DocumentError::MergeError(e.to_string());

        let mut merged = self.pdfium.create_new_pdf().map_err(merge_error)?;
        for path in pages {
            let document = self.pdfium.load_pdf_from_file(path, None).map_err(|e| {
                DocumentError::MergeError(format!("{}: {}", path.display(), e))
            })?;
            merged.pages_mut().append(&document).map_err(merge_error)?;
        }
        merged.save_to_file(output).map_err(merge_error)?;

        Ok(output.to_path_buf())
    }
}
