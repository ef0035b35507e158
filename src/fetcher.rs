use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{AppError, LookupError, Result};

/// Fetches raw listing-page markup. One shared client, no retries: a page that
/// cannot be fetched now is simply tried again on the next cycle.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,ru;q=0.9,en;q=0.8"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(AppError::Http)?;
        Ok(Self { client })
    }

    /// GET `url` and return the body. Anything other than 200 OK is an error.
    pub async fn fetch(&self, url: &str) -> std::result::Result<String, LookupError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(LookupError::Status(status));
        }
        let body = resp.text().await?;
        debug!(url, bytes = body.len(), "Fetched listing page");
        Ok(body)
    }
}
