/*!
 * External model collaborators.
 *
 * The pipeline only talks to these traits:
 * - `LayoutDetector`: finds text, title, figure and table regions on a page
 * - `OcrEngine`: reads the lines of a region crop
 * - `TextTranslator`: translates one chunk of text
 *
 * Implementations:
 * - `ollama`: translation through a local Ollama server
 * - `model_service`: layout detection and OCR through HTTP model services
 * - `http`: retrying JSON client shared by the service clients
 * - `mock`: deterministic in-process collaborators for tests
 */

use async_trait::async_trait;
use image::RgbImage;

use crate::errors::ProviderError;
use crate::layout::Detection;

/// Page layout detection
#[async_trait]
pub trait LayoutDetector: Send + Sync {
    /// Detect regions on one page image
    async fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, ProviderError>;

    /// Detect regions on several pages, one result per image in input order
    async fn detect_batch(&self, images: &[RgbImage]) -> Result<Vec<Vec<Detection>>, ProviderError> {
        let mut results = Vec::with_capacity(images.len());
        for image in images {
            results.push(self.detect(image).await?);
        }
        Ok(results)
    }

    /// Verify the detector is reachable before the run starts
    async fn check(&self) -> Result<(), ProviderError>;
}

/// Text recognition on a region crop
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognized lines, top to bottom
    async fn recognize(&self, image: &RgbImage) -> Result<Vec<String>, ProviderError>;

    async fn check(&self) -> Result<(), ProviderError>;
}

/// Chunk translation
#[async_trait]
pub trait TextTranslator: Send + Sync {
    async fn translate(&self, chunk: &str) -> Result<String, ProviderError>;

    async fn check(&self) -> Result<(), ProviderError>;
}

pub mod http;
pub mod mock;
pub mod model_service;
pub mod ollama;
