//! Engine defaults and the settings the front end can override

use std::time::Duration;

use crate::error::ConfigError;
use crate::extract::ExtractOptions;
use crate::fetch::{BrowserOptions, FetchRequest};

/// Page load timeout when none is given
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

pub const DEFAULT_USER_AGENT: &str = concat!("site-extractor/", env!("CARGO_PKG_VERSION"));

/// Outer HTML kept per element in the optional `html` field
pub const DEFAULT_HTML_LIMIT: usize = 1000;

/// Everything tunable about one invocation apart from its url/selector/mode/output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub timeout: Duration,
    pub user_agent: String,
    pub render_js: bool,
    pub browser: BrowserOptions,
    pub extract: ExtractOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            render_js: false,
            browser: BrowserOptions::default(),
            extract: ExtractOptions::default(),
        }
    }
}

impl Settings {
    /// Build the fetch request for `url` under these settings
    pub fn fetch_request(&self, url: &str) -> Result<FetchRequest, ConfigError> {
        Ok(FetchRequest::new(url)?
            .with_render_js(self.render_js)
            .with_timeout(self.timeout)
            .with_user_agent(self.user_agent.clone())
            .with_browser(self.browser.clone()))
    }
}
