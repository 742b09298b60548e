//! Probe Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only request-level failures are errors. A response that doesn't match its
//! record is a [`Verdict`](crate::Verdict), not an error.

use derive_more::{Display, Error};

/// A probe error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for probe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed.
    #[display("failed to configure HTTP client")]
    Client,
    /// The request could not be sent or no response was received.
    #[display("request failed: {_0}")]
    Request(#[error(not(source))] String),
    /// The server answered, but with a status that can't be recorded.
    #[display("{url} returned HTTP {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code received.
        status: u16,
    },
    /// The response body could not be read to the end.
    #[display("failed reading response body: {_0}")]
    Body(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Body(_))
    }
}
