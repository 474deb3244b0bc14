/*!
 * Error types for the layoutlingo pipeline.
 *
 * This module contains custom error types for the different layers of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 * Per-region and per-page errors are recoverable and never leave their page;
 * `AppError::Startup` is the only error that aborts a run before any page
 * is processed.
 */

use thiserror::Error;

/// Errors that can occur when calling an external model service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error encoding an image before sending it
    #[error("Image encoding error: {0}")]
    ImageEncoding(String),
}

/// Errors raised while reading, writing or merging PDF documents
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to initialize PDF backend: {0}")]
    BackendInit(String),

    #[error("Failed to load document: {0}")]
    LoadError(String),

    #[error("Failed to render page {page}: {message}")]
    RenderError { page: usize, message: String },

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Failed to write page {page}: {message}")]
    WriteError { page: usize, message: String },

    #[error("Failed to merge pages: {0}")]
    MergeError(String),
}

/// Why a region was deliberately left untranslated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// OCR produced fewer lines than the configured minimum
    TooFewLines(usize),
    /// The translation is mostly made of characters outside the target script
    ScriptMismatch,
    /// Every translated chunk was dropped as engine scaffolding
    EmptyTranslation,
    /// The region box is empty after clamping to the page
    EmptyBox,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewLines(lines) => write!(f, "too few OCR lines ({})", lines),
            Self::ScriptMismatch => write!(f, "translation not in target script"),
            Self::EmptyTranslation => write!(f, "empty translation"),
            Self::EmptyBox => write!(f, "empty region box"),
        }
    }
}

/// Errors that leave a single region untouched
#[derive(Error, Debug)]
pub enum RegionError {
    /// The OCR engine failed on the region crop
    #[error("OCR failed: {0}")]
    Ocr(#[source] ProviderError),

    /// The translation engine failed on one of the chunks
    #[error("Translation failed: {0}")]
    Translation(#[source] ProviderError),
}

/// Errors that turn a page into a pass-through page
#[derive(Error, Debug)]
pub enum PageError {
    /// Layout detection failed for the page
    #[error("Layout detection failed: {0}")]
    Detection(#[from] ProviderError),

    /// The detector returned a different number of results than pages sent
    #[error("Detector returned {got} results for {expected} pages")]
    DetectionCount { expected: usize, got: usize },
}

/// Errors that abort a whole run
#[derive(Error, Debug)]
pub enum AppError {
    /// A required model, service or font could not be loaded
    #[error("Startup failed: {0}")]
    Startup(String),

    /// Error from the PDF backend
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}
