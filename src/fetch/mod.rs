//! Page retrieval
//!
//! Two independent strategies behind one entry point:
//! - `Static`: a single HTTP GET through reqwest, redirects followed
//! - `Render`: a headless Chromium session that returns the rendered DOM
//!
//! Both produce the same `FetchResult` shape so nothing downstream needs to
//! know which one ran.

mod http;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::config::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::error::{ConfigError, FetchError};

/// Extra knobs for the rendering strategy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Chromium/Chrome binary; auto-detected when `None`
    pub executable: Option<PathBuf>,
    /// Additional command-line switches passed to the browser
    pub args: Vec<String>,
}

/// What to fetch and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: Url,
    render_js: bool,
    timeout: Duration,
    user_agent: Option<String>,
    browser: BrowserOptions,
}

impl FetchRequest {
    /// Build a request for an absolute http(s) URL
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        Ok(Self {
            url: parsed,
            render_js: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            browser: BrowserOptions::default(),
        })
    }

    pub fn with_render_js(mut self, render_js: bool) -> Self {
        self.render_js = render_js;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_browser(mut self, browser: BrowserOptions) -> Self {
        self.browser = browser;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn render_js(&self) -> bool {
        self.render_js
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// User agent sent with the request, falling back to the crate default
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn browser(&self) -> &BrowserOptions {
        &self.browser
    }

    pub fn strategy(&self) -> FetchStrategy {
        if self.render_js {
            FetchStrategy::Render
        } else {
            FetchStrategy::Static
        }
    }
}

/// Raw page as handed to the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub html: String,
    /// URL after redirects (or client-side navigation when rendering)
    pub final_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
}

/// How a page gets retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    Static,
    Render,
}

impl FetchStrategy {
    pub fn name(self) -> &'static str {
        match self {
            FetchStrategy::Static => "static",
            FetchStrategy::Render => "render",
        }
    }
}

/// Retrieve the page using the strategy selected by `render_js`
pub async fn fetch(request: &FetchRequest) -> Result<FetchResult, FetchError> {
    let strategy = request.strategy();
    debug!(url = %request.url(), strategy = strategy.name(), "fetching page");

    let result = match strategy {
        FetchStrategy::Static => http::fetch_static(request).await?,
        FetchStrategy::Render => render::fetch_rendered(request).await?,
    };

    info!(
        url = %result.final_url,
        status = result.status_code,
        bytes = result.html.len(),
        strategy = strategy.name(),
        "fetched page"
    );
    Ok(result)
}

/// Final status must be 2xx or 3xx
fn check_status(status: u16, url: &str) -> Result<(), FetchError> {
    if (200..400).contains(&status) {
        Ok(())
    } else {
        Err(FetchError::Status {
            status,
            url: url.to_string(),
        })
    }
}
