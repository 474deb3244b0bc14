/*!
 * The document translation pipeline.
 *
 * - `context`: collaborators, settings and the state threaded between pages
 * - `region_translator`: OCR → chunk → translate → guard → reflow → render
 * - `page_processor`: detection and the references/abstract state machine
 * - `driver`: rasterization, batching, output pages and merge
 */

pub use self::context::{PipelineContext, PipelineSettings, PipelineState, SectionState};
pub use self::driver::{PageDisposition, PageRecord, PipelineDriver, RunReport};
pub use self::page_processor::{Heading, PageOutcome, PageProcessor, PageReport};
pub use self::region_translator::{RegionOutcome, RegionTranslator, RepaintedRegion, TranslationUnit};

pub mod context;
pub mod driver;
pub mod page_processor;
pub mod region_translator;
