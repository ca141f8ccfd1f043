//! Rendering strategy: headless Chromium via the DevTools protocol
//!
//! The browser process is owned by a `BrowserSession`. Normal paths close it
//! explicitly; if the owning future is dropped instead (timeout, error, Ctrl-C)
//! the session's `Drop` aborts the protocol handler and dropping the
//! `Browser` kills the child process.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{check_status, FetchRequest, FetchResult};
use crate::error::FetchError;

const READY_POLL: Duration = Duration::from_millis(100);

/// Navigation Timing exposes the document response status (Chrome 109+)
const STATUS_SCRIPT: &str = "(() => { \
    const nav = performance.getEntriesByType('navigation')[0]; \
    return nav && nav.responseStatus ? nav.responseStatus : 0; \
})()";

pub(super) async fn fetch_rendered(request: &FetchRequest) -> Result<FetchResult, FetchError> {
    let timeout = request.timeout();

    let mut session = tokio::time::timeout(timeout, BrowserSession::launch(request))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    let outcome = tokio::time::timeout(timeout, session.render(request)).await;
    session.close().await;

    let result = outcome.map_err(|_| FetchError::Timeout(timeout))??;
    check_status(result.status_code, &result.final_url)?;
    Ok(result)
}

struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(request: &FetchRequest) -> Result<Self, FetchError> {
        let options = request.browser();
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", request.user_agent()))
            .request_timeout(request.timeout());

        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        for arg in &options.args {
            builder = builder.arg(arg.clone());
        }

        let config = builder.build().map_err(FetchError::BrowserLaunch)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("browser launched");
        Ok(Self {
            browser: Some(browser),
            handler,
        })
    }

    async fn render(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| FetchError::Browser("browser already closed".to_string()))?;

        let page = browser
            .new_page(request.url().as_str())
            .await
            .map_err(browser_error)?;
        page.wait_for_navigation().await.map_err(browser_error)?;
        wait_until_ready(&page).await?;

        let html = page.content().await.map_err(browser_error)?;
        let final_url = page
            .url()
            .await
            .map_err(browser_error)?
            .unwrap_or_else(|| request.url().to_string());

        // A zero status means the timing entry had nothing to report
        let status_code = match page.evaluate(STATUS_SCRIPT).await {
            Ok(value) => value.into_value::<u16>().unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "could not read response status from the page");
                0
            }
        };
        let content_type = match page.evaluate("document.contentType").await {
            Ok(value) => value.into_value::<String>().ok(),
            Err(_) => None,
        };

        Ok(FetchResult {
            html,
            final_url,
            status_code: if status_code == 0 { 200 } else { status_code },
            content_type,
        })
    }

    async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "failed to close browser cleanly");
            }
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "failed to reap browser process");
            }
        }
        self.handler.abort();
        debug!("browser closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.browser.is_some() {
            warn!("browser session dropped before close, killing browser process");
        }
    }
}

/// Poll `document.readyState` until the page reports `complete`
async fn wait_until_ready(page: &Page) -> Result<(), FetchError> {
    loop {
        let state = page
            .evaluate("document.readyState")
            .await
            .map_err(browser_error)?
            .into_value::<String>()
            .unwrap_or_default();

        if state == "complete" {
            return Ok(());
        }
        tokio::time::sleep(READY_POLL).await;
    }
}

fn browser_error(error: chromiumoxide::error::CdpError) -> FetchError {
    FetchError::Browser(error.to_string())
}
