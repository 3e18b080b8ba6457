use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

/// User agent announced on every request.
pub const USER_AGENT: &str = "FalconGraphCrawler/1.0";

/// A successfully fetched response body with its content type.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: Vec<u8>,
    /// Content-Type of the final response, trimmed, original casing kept.
    pub content_type: String,
}

/// Capability to retrieve a URL. The crawler only depends on this trait so
/// tests can substitute an in-memory transport.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// HTTP fetcher backed by a shared reqwest client.
///
/// Redirects are followed transparently; the timeout bounds the whole
/// request including the body read. Failures are not retried.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout_seconds: f64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs_f64(timeout_seconds.max(0.0)))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .unwrap_or_default();

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
            .to_vec();

        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(FetchedPage { body, content_type })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("empty response body")]
    EmptyBody,

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl FetchError {
    fn from_reqwest_error(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(error.to_string())
        }
    }
}
