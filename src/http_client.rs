//! HTTP transport abstraction for the completion API.
//!
//! The transport only moves bytes: it sends one JSON POST and hands back the
//! status code with the raw body. Interpreting either is the decoder's job.

use crate::error::BoxError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default upper bound for one request, connection included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Trait for HTTP communication with the completion API.
///
/// This abstraction allows injecting mock HTTP clients for testing without
/// making real network requests.
///
/// # Example
///
/// ```ignore
/// use aiterm::http_client::{HttpClient, ReqwestHttpClient};
///
/// let client = ReqwestHttpClient::new()?;
/// let response = client.post_json(
///     "https://api.example.com/endpoint",
///     &[("Authorization", "Bearer sk-test")],
///     &serde_json::json!({"key": "value"}),
/// ).await?;
/// println!("{} {}", response.status, response.body);
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request with a JSON body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to send the request to
    /// * `headers` - Key-value pairs of headers to include
    /// * `body` - The JSON body to send
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, times out, or the
    /// response body cannot be read. Non-2xx statuses are not errors here.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, BoxError>;
}

/// HTTP client implementation using reqwest.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a client with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self, BoxError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client whose requests fail once `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend or system configuration cannot be
    /// initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, BoxError> {
        let client = Client::builder().timeout(timeout).build()?;
        debug!("HTTP client ready with a {:?} timeout", timeout);
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, BoxError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request.json(body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
