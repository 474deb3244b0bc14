/*!
 * Text handling between OCR and rendering.
 *
 * - `chunker`: splits OCR text into engine-sized chunks
 * - `guard`: detects degenerate, looping engine output
 * - `formatting`: sanitation and per-language engine output clean-up
 */

pub use self::chunker::TextChunker;
pub use self::formatting::TextCleaner;
pub use self::guard::{DegeneracyGuard, GuardConfig, MatchMode};

pub mod chunker;
pub mod formatting;
pub mod guard;
