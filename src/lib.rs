/*!
 * # layoutlingo - layout-preserving PDF translation
 *
 * A Rust library that translates the text of a PDF while keeping its layout:
 * every detected text region is replaced in place by its translation, drawn
 * with a font suited to the target language, and everything else on the page
 * is left as rendered.
 *
 * ## Features
 *
 * - Page layout detection and OCR through HTTP model services
 * - Translation through a local Ollama server
 * - Sentence-aware chunking and detection of degenerate, looping output
 * - Fullwidth-aware reflow for Chinese, Japanese and Korean targets
 * - Stops translating at the references section and keeps the title block
 *   above the abstract untouched
 * - Per-page PDFs merged in page order, optionally side by side with the
 *   original
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `pipeline`: The document pipeline:
 *   - `pipeline::driver`: Rasterization, batching, output and merge
 *   - `pipeline::page_processor`: Detection and the section state machine
 *   - `pipeline::region_translator`: Translation of one text region
 * - `translation`: Chunking, output clean-up and degeneracy detection
 * - `layout`: Detected regions and text reflow
 * - `render`: Drawing translated text
 * - `pdf`: PDF rasterization, writing and merging
 * - `providers`: Layout, OCR and translation service clients
 * - `language_utils`: ISO language codes and per-language profiles
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod providers;
pub mod render;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, DocumentError, PageError, ProviderError, RegionError, SkipReason};
pub use language_utils::{get_language_name, LanguageProfile, Script};
pub use pipeline::{PipelineContext, PipelineDriver, PipelineSettings, PipelineState, RunReport};
