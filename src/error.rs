//! Error taxonomy for the extraction engine
//!
//! One enum per failing component. Field extraction has no error type: it is total.

use std::path::PathBuf;
use std::time::Duration;

/// Failures while retrieving the page
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

/// Failures while turning the fetched body into a document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Response is not an HTML document (content type {0})")]
    NonHtmlContent(String),
}

/// Malformed selector for its (inferred or forced) language
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("Selector is empty")]
    Empty,

    #[error("Invalid CSS selector `{selector}`: {reason}")]
    Css { selector: String, reason: String },

    #[error("Invalid XPath expression `{selector}`: {reason}")]
    XPath { selector: String, reason: String },
}

/// Failures while persisting (or reading back) the records
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} does not contain a record array: {reason}", path.display())]
    Format { path: PathBuf, reason: String },
}

/// Invocation parameters the engine refuses to run with
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported output extension for {0} (expected .csv or .json)")]
    UnsupportedOutput(String),

    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Attribute name is empty")]
    EmptyAttribute,

    #[error("Pipeline already ran (stage: {0})")]
    AlreadyRun(String),
}

/// Distinguishable error kind surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Fetch,
    Parse,
    Selector,
    Write,
}

impl ErrorKind {
    /// Process exit code used by the command-line front end
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Fetch => 2,
            ErrorKind::Parse | ErrorKind::Selector => 3,
            ErrorKind::Write => 4,
            ErrorKind::Config => 64,
        }
    }
}

/// Any fatal engine error
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Config(_) => ErrorKind::Config,
            ExtractError::Fetch(_) => ErrorKind::Fetch,
            ExtractError::Parse(_) => ErrorKind::Parse,
            ExtractError::Selector(_) => ErrorKind::Selector,
            ExtractError::Write(_) => ErrorKind::Write,
        }
    }
}
