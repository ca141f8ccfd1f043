//! Single-page data extractor
//!
//! Fetches one URL (plain HTTP or headless Chromium), selects elements with a
//! CSS or XPath selector, extracts text or an attribute from each match and
//! writes the results as CSV or JSON:
//! - `fetch`: static vs. rendering fetch strategies
//! - `selector`: language inference and resolution in document order
//! - `extract`: total per-element field extraction
//! - `output`: CSV/JSON writer (and reader)
//! - `pipeline`: stage-by-stage orchestration and reporting

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod selector;

pub use document::{MatchedElement, NodeIndex, ParsedDocument};
pub use error::{ErrorKind, ExtractError};
pub use extract::{extract, ExtractOptions, ExtractionMode, FieldExtractor};
pub use fetch::{fetch, FetchRequest, FetchResult, FetchStrategy};
pub use output::{OutputFormat, OutputSpec};
pub use pipeline::{run, Pipeline, PipelineError, Report, Stage};
pub use record::{Record, RecordSet};
pub use selector::{resolve, Selector, SelectorLanguage};
