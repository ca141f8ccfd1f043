//! Static strategy: plain HTTP GET, no script execution

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};

use super::{check_status, FetchRequest, FetchResult};
use crate::error::FetchError;

const MAX_REDIRECTS: usize = 10;

pub(super) async fn fetch_static(request: &FetchRequest) -> Result<FetchResult, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(request.user_agent())
        .timeout(request.timeout())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let response = client
        .get(request.url().as_str())
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .send()
        .await
        .map_err(|e| classify_error(e, request))?;

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();
    check_status(status_code, &final_url)?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    let html = response.text().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout(request.timeout())
        } else {
            FetchError::Body(e.to_string())
        }
    })?;

    Ok(FetchResult {
        html,
        final_url,
        status_code,
        content_type,
    })
}

fn classify_error(error: reqwest::Error, request: &FetchRequest) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(request.timeout())
    } else {
        FetchError::Network(error.to_string())
    }
}
