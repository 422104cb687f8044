//! Extraction pipeline
//!
//! Turns a fetched body into an [`ExtractedRecord`]:
//! - `page`: parsing into a queryable document
//! - `extractors`: the per-kind extractor registry and pipeline runner
//! - `record`: selector and record types

mod extractors;
mod page;
mod record;

pub use extractors::{
    run_pipeline, GATHER_MAX_IMAGES, GATHER_MAX_LINKS, GATHER_MAX_PARAGRAPHS,
    GATHER_MIN_PARAGRAPH_CHARS,
};
pub use page::{element_text, ParsedPage};
pub use record::{ExtractedRecord, ImageRef, PageMeta, SelectorKind, SelectorSet, SourceType};
