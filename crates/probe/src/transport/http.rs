//! reqwest-backed transport.

use super::{Response, Transport};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, LOCATION};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::instrument;

/// Client settings. Every request gets an explicit deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// Deadline for the whole request, body included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}
impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("urldb/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Transport that performs real HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}
impl HttpTransport {
    pub fn new(options: &HttpOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            // Redirects are data here, never something to follow.
            .redirect(Policy::none())
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client })
    }
}

fn header(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .or_raise(|| ErrorKind::Request(url.to_string()))?;
        let status = response.status().as_u16();
        let content_type = header(response.headers(), CONTENT_TYPE);
        let location = header(response.headers(), LOCATION);
        tracing::debug!(status, content_type = ?content_type, location = ?location, "Response received");

        let url = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.or_raise(|| ErrorKind::Body(url.clone())));
        Ok(Response {
            status,
            content_type,
            location,
            body: Box::pin(body),
        })
    }
}
