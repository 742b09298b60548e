//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Lower-level failures (I/O, YAML) are
//! attached as children of the [`ErrorKind`] that describes them to callers.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A stored record document is missing a required field or has an
    /// inconsistent optional-field pairing. The whole load is aborted.
    #[display("malformed record: {_0}")]
    MalformedRecord(#[error(not(source))] String),
    /// A domain file could not be parsed as a sequence of documents.
    #[display("malformed domain file: {}", _0.display())]
    MalformedDocument(#[error(not(source))] PathBuf),
    /// A network location (or a user-supplied domain filter) does not resolve
    /// to any known domain.
    #[display("unknown domain: {_0}")]
    UnknownDomain(#[error(not(source))] String),
    /// The input could not be parsed as an absolute URL.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Underlying filesystem operation failed.
    #[display("I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The domain file changed between reading and rewriting it; the pending
    /// rewrite was discarded.
    #[display("domain file modified concurrently: {}", _0.display())]
    ConcurrentModification(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConcurrentModification(_))
    }
}
