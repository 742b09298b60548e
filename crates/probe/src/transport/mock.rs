//! In-memory transport for testing.

use super::{Response, Transport};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// Bodies are served in chunks this small so that consumers are exercised
/// with more than one chunk.
const CHUNK_SIZE: usize = 4;

/// A canned response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: Vec<u8>,
    /// Fail the body stream once `body` has been sent, like a connection
    /// dropped mid-transfer.
    pub interrupted: bool,
}
impl MockResponse {
    /// `200 OK` with the given content type and body.
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            location: None,
            body: body.into(),
            interrupted: false,
        }
    }

    /// `200 OK` whose body stream fails after sending `partial`.
    pub fn interrupted(content_type: &str, partial: impl Into<Vec<u8>>) -> Self {
        Self {
            interrupted: true,
            ..Self::ok(content_type, partial)
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            content_type: None,
            location: Some(location.to_string()),
            body: Vec::new(),
            interrupted: false,
        }
    }

    /// A bare status with no headers and an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            location: None,
            body: Vec::new(),
            interrupted: false,
        }
    }
}

/// In-memory transport for testing.
///
/// URLs without a registered response fail the way an unreachable host would:
/// with a [`Request`](ErrorKind::Request) error.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: RwLock<HashMap<String, MockResponse>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<'a>(responses: impl IntoIterator<Item = (&'a str, MockResponse)>) -> Self {
        let responses = responses.into_iter().map(|(url, response)| (url.to_string(), response)).collect();
        Self {
            responses: RwLock::new(responses),
            requests: Mutex::default(),
        }
    }

    /// Register (or replace) the response for `url`.
    ///
    /// Panics if the lock is poisoned; a test that panicked while holding it
    /// has already failed.
    pub fn set(&self, url: &str, response: MockResponse) {
        self.responses.write().unwrap().insert(url.to_string(), response);
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<Response> {
        self.requests.lock().unwrap().push(url.to_string());
        let Some(canned) = self.responses.read().unwrap().get(url).cloned() else {
            exn::bail!(ErrorKind::Request(url.to_string()));
        };
        let mut chunks: Vec<Result<Bytes>> =
            canned.body.chunks(CHUNK_SIZE).map(|chunk| Ok(Bytes::copy_from_slice(chunk))).collect();
        if canned.interrupted {
            chunks.push(Err(ErrorKind::Body(url.to_string()).into()));
        }
        Ok(Response {
            status: canned.status,
            content_type: canned.content_type,
            location: canned.location,
            body: Box::pin(futures::stream::iter(chunks)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_canned_response() {
        let transport = MockTransport::with_responses([("http://example.com/a.json", MockResponse::ok("application/json", "{\"a\": 1}"))]);
        let response = transport.get("http://example.com/a.json").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        let chunks: Vec<Bytes> = response.body.try_collect().await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.concat(), b"{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_interrupted_body() {
        let transport = MockTransport::with_responses([("http://example.com/big", MockResponse::interrupted("application/zip", "PK\x03\x04partial"))]);
        let mut response = transport.get("http://example.com/big").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.try_next().await.unwrap(), Some(Bytes::from_static(b"PK\x03\x04")));
        assert_eq!(response.body.try_next().await.unwrap(), Some(Bytes::from_static(b"part")));
        assert_eq!(response.body.try_next().await.unwrap(), Some(Bytes::from_static(b"ial")));
        let err = response.body.try_next().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Body(url) if url == "http://example.com/big"));
    }

    #[tokio::test]
    async fn test_unknown_url_fails() {
        let transport = MockTransport::new();
        transport.set("http://example.com/", MockResponse::status(204));
        let err = transport.get("http://example.com/missing").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Request(url) if url == "http://example.com/missing"));
        assert!(transport.get("http://example.com/").await.is_ok());
        assert_eq!(transport.requests(), vec!["http://example.com/missing", "http://example.com/"]);
    }
}
