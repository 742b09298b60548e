//! HTTP transport trait and implementations.
//!
//! The integrity checks only need one thing from the network: a single GET
//! that does **not** follow redirects, with the body exposed as a stream.
//! [`Transport`] is that seam. [`HttpTransport`] talks to real servers;
//! [`MockTransport`] (behind the `mock` feature) serves canned responses to
//! tests.

mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::http::{HttpOptions, HttpTransport};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockResponse, MockTransport};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::pin::Pin;
use urldb_store::{Fingerprint, FingerprintHasher};

pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Status codes that carry a `Location` to follow.
const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// A response whose body has not been read yet.
pub struct Response {
    pub status: u16,
    /// Raw `Content-Type` header, parameters included.
    pub content_type: Option<String>,
    /// Raw `Location` header.
    pub location: Option<String>,
    pub body: BodyStream,
}
impl Response {
    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// A redirect status that also names where to go.
    pub fn is_redirect(&self) -> bool {
        REDIRECT_STATUSES.contains(&self.status) && self.location.is_some()
    }

    /// Consume the body, computing its length and SHA-256 chunk by chunk.
    pub async fn fingerprint(mut self) -> Result<Fingerprint> {
        let mut hasher = FingerprintHasher::new();
        while let Some(chunk) = self.body.try_next().await? {
            hasher.update(&chunk);
        }
        Ok(hasher.finish())
    }
}
impl Debug for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Issues GET requests for record URLs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` without following redirects.
    ///
    /// Any status code is a successful return; only failing to get a response
    /// at all is an error.
    async fn get(&self, url: &str) -> Result<Response>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn response(status: u16, location: Option<&str>) -> Response {
        Response {
            status,
            content_type: None,
            location: location.map(str::to_string),
            body: Box::pin(futures::stream::empty()),
        }
    }

    #[rstest]
    #[case(200, None, true, false)]
    #[case(204, None, true, false)]
    #[case(301, Some("/elsewhere"), false, true)]
    #[case(308, Some("/elsewhere"), false, true)]
    #[case(302, None, false, false)]
    #[case(304, None, false, false)]
    #[case(404, None, false, false)]
    fn test_status_classes(
        #[case] status: u16,
        #[case] location: Option<&str>,
        #[case] success: bool,
        #[case] redirect: bool,
    ) {
        let response = response(status, location);
        assert_eq!(response.is_success(), success);
        assert_eq!(response.is_redirect(), redirect);
    }

    #[tokio::test]
    async fn test_fingerprint_streams_chunks() {
        let chunks = ["hello, ", "streaming ", "world"].map(|s| Ok(Bytes::from_static(s.as_bytes())));
        let response = Response {
            status: 200,
            content_type: None,
            location: None,
            body: Box::pin(futures::stream::iter(chunks)),
        };
        assert_eq!(response.fingerprint().await.unwrap(), Fingerprint::of(b"hello, streaming world"));
    }
}
