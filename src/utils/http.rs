//! HTTP utilities shared by the source clients
//!
//! Builds the reqwest client every source uses and performs a single GET,
//! classifying failures so callers can map them onto their own error kinds.
//! Lookups are never retried.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Transport-level failure of a GET request
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("status: {0}")]
    Status(StatusCode),
    #[error("read failed: {0}")]
    Body(String),
}

impl HttpError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Transport(err.to_string())
        }
    }
}

/// Create a client with the given timeout and user agent
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, String> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))
}

/// GET a URL and return the body as text
///
/// # Returns
/// * `Ok(body)` - For any 2xx response
/// * `Err(HttpError)` - Timeout, connection failure, non-2xx status, or unreadable body
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, HttpError> {
    debug!("GET {}", url);

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(HttpError::from_reqwest)?;

    if !resp.status().is_success() {
        return Err(HttpError::Status(resp.status()));
    }

    resp.text().await.map_err(|e| {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Body(e.to_string())
        }
    })
}
