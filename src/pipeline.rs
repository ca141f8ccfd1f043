//! Orchestration: fetch -> parse -> select -> extract -> write
//!
//! Stages run strictly one after another. Any stage error moves the pipeline
//! to `Failed` and nothing is written; once selection has succeeded the
//! remaining stages can only fail on the write itself.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::ParsedDocument;
use crate::error::{ConfigError, ErrorKind, ExtractError};
use crate::extract::{ExtractOptions, ExtractionMode, FieldExtractor};
use crate::fetch::{self, FetchRequest};
use crate::output::{self, OutputSpec};
use crate::record::RecordSet;
use crate::selector::{self, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Fetching,
    Parsing,
    Selecting,
    Extracting,
    Writing,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Parsing => "parsing",
            Stage::Selecting => "selecting",
            Stage::Extracting => "extracting",
            Stage::Writing => "writing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub matched_count: usize,
    pub written_count: usize,
    /// Non-fatal problems met along the way
    pub errors: Vec<String>,
}

/// Fatal error together with the stage that raised it
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ExtractError,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// One invocation of the extractor
#[derive(Debug, Clone)]
pub struct Pipeline {
    request: FetchRequest,
    selector: Selector,
    mode: ExtractionMode,
    output: OutputSpec,
    options: ExtractOptions,
    stage: Stage,
}

impl Pipeline {
    pub fn new(
        request: FetchRequest,
        selector: Selector,
        mode: ExtractionMode,
        output: OutputSpec,
    ) -> Self {
        Self {
            request,
            selector,
            mode,
            output,
            options: ExtractOptions::default(),
            stage: Stage::Idle,
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn output(&self) -> &OutputSpec {
        &self.output
    }

    /// Run every stage once; a pipeline that has finished cannot be rerun
    pub async fn run(&mut self) -> Result<Report, PipelineError> {
        match self.run_stages().await {
            Ok(report) => {
                self.advance(Stage::Done);
                Ok(report)
            }
            Err(source) => {
                let stage = self.stage;
                warn!(%stage, error = %source, "pipeline failed");
                self.advance(Stage::Failed);
                Err(PipelineError { stage, source })
            }
        }
    }

    async fn run_stages(&mut self) -> Result<Report, ExtractError> {
        if self.stage != Stage::Idle {
            return Err(ConfigError::AlreadyRun(self.stage.to_string()).into());
        }
        if let ExtractionMode::Attribute(name) = &self.mode {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyAttribute.into());
            }
        }

        self.advance(Stage::Fetching);
        let fetched = fetch::fetch(&self.request).await?;

        self.advance(Stage::Parsing);
        let document = ParsedDocument::from_fetch(&fetched)?;
        drop(fetched);

        self.advance(Stage::Selecting);
        let matches = selector::resolve(&document, &self.selector)?;
        info!(selector = self.selector.raw(), matches = matches.len(), "selected elements");

        self.advance(Stage::Extracting);
        let mut extractor = FieldExtractor::new(&document, &self.mode, &self.options);
        let mut records = RecordSet::new(extractor.schema());
        for matched in &matches {
            records.push(extractor.record(matched));
        }
        let errors = extractor.into_warnings();

        self.advance(Stage::Writing);
        let written_count = output::write(&records, &self.output)?;

        Ok(Report {
            matched_count: matches.len(),
            written_count,
            errors,
        })
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
    }
}

/// Run a single extraction with default options
pub async fn run(
    request: &FetchRequest,
    selector: &Selector,
    mode: &ExtractionMode,
    output: &OutputSpec,
) -> Result<Report, PipelineError> {
    Pipeline::new(request.clone(), selector.clone(), mode.clone(), output.clone())
        .run()
        .await
}
