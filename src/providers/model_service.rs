/*!
 * Clients for the layout detection and OCR model services.
 *
 * Both services take PNG images as base64 strings in a JSON body. The layout
 * service answers with boxes in the coordinates of the image it received.
 */

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::app_config::ServiceConfig;
use crate::errors::ProviderError;
use crate::layout::Detection;
use crate::providers::http::HttpService;
use crate::providers::{LayoutDetector, OcrEngine};

/// Encode an image as base64 PNG
pub fn encode_png_base64(image: &RgbImage) -> Result<String, ProviderError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ProviderError::ImageEncoding(e.to_string()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buffer.into_inner()))
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: String,
}

#[derive(Debug, Serialize)]
struct BatchRequest {
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<Detection>,
}

#[derive(Debug, Deserialize)]
struct BatchDetectResponse {
    results: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    lines: Vec<String>,
}

/// Layout detector served over HTTP (`/detect`, `/detect_batch`, `/health`)
#[derive(Debug)]
pub struct LayoutService {
    http: HttpService,
}

impl LayoutService {
    pub fn new(config: &ServiceConfig) -> Self {
        Self { http: HttpService::new(config) }
    }
}

#[async_trait]
impl LayoutDetector for LayoutService {
    async fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, ProviderError> {
        let request = ImageRequest { image: encode_png_base64(image)? };
        let response: DetectResponse = self.http.post_json("detect", &request).await?;
        Ok(response.detections)
    }

    async fn detect_batch(&self, images: &[RgbImage]) -> Result<Vec<Vec<Detection>>, ProviderError> {
        let images = images
            .iter()
            .map(encode_png_base64)
            .collect::<Result<Vec<_>, _>>()?;
        let expected = images.len();

        let response: BatchDetectResponse = self
            .http
            .post_json("detect_batch", &BatchRequest { images })
            .await?;

        if response.results.len() != expected {
            return Err(ProviderError::ParseError(format!(
                "expected {} detection results, got {}",
                expected,
                response.results.len()
            )));
        }

        Ok(response.results)
    }

    async fn check(&self) -> Result<(), ProviderError> {
        self.http.get_ok("health").await
    }
}

/// OCR engine served over HTTP (`/ocr`, `/health`)
#[derive(Debug)]
pub struct OcrService {
    http: HttpService,
}

impl OcrService {
    pub fn new(config: &ServiceConfig) -> Self {
        Self { http: HttpService::new(config) }
    }
}

#[async_trait]
impl OcrEngine for OcrService {
    async fn recognize(&self, image: &RgbImage) -> Result<Vec<String>, ProviderError> {
        let request = ImageRequest { image: encode_png_base64(image)? };
        let response: OcrResponse = self.http.post_json("ocr", &request).await?;
        Ok(response.lines)
    }

    async fn check(&self) -> Result<(), ProviderError> {
        self.http.get_ok("health").await
    }
}
