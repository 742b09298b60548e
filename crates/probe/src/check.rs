//! Content-integrity checks.
//!
//! A check fetches a record's URL once, without following redirects, and
//! decides whether the live response still behaves as recorded:
//!
//! 1. a status that is neither 2xx nor a redirect fails outright,
//! 2. a redirect must carry the recorded redirect status, unless the record is
//!    tagged `redirect-ok`,
//! 3. the base media type must match the recorded one, unless the record is
//!    tagged `content-type-change-ok` or the pair is listed in
//!    [`EQUIVALENT_MEDIA_TYPES`](crate::media::EQUIVALENT_MEDIA_TYPES),
//! 4. a locked fingerprint must match the streamed body in length, then in
//!    digest.

use crate::error::Result;
use crate::media::{base_media_type, equivalent_media_types, same_media_type};
use crate::transport::Transport;
use derive_more::Display;
use tracing::instrument;
use urldb_store::{Category, Record, redirect_marker};

/// How much work a check is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Download and hash the body of records with a locked fingerprint.
    pub verify_content: bool,
}
impl Default for CheckOptions {
    fn default() -> Self {
        Self { verify_content: true }
    }
}

/// Why a record failed its check.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Finding {
    #[display("HTTP {_0}")]
    Status(u16),
    #[display("expected {expected}; got {got}")]
    Redirect { expected: String, got: String },
    #[display("expected content-type {expected}; got {got}")]
    ContentType { expected: String, got: String },
    #[display("expected content-length {expected}; got {got}")]
    Length { expected: u64, got: u64 },
    #[display("expected content-sha256 {expected}; got {got}")]
    Digest { expected: String, got: String },
}

/// Outcome of checking one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The record behaves as recorded. Notes describe tolerated differences.
    Ok(Vec<String>),
    Problem(Finding),
}
impl Verdict {
    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Problem(_))
    }

    /// Human-readable summary, one line.
    pub fn reason(&self) -> String {
        match self {
            Self::Ok(notes) if notes.is_empty() => "OK".to_string(),
            Self::Ok(notes) => format!("OK ({})", notes.join("; ")),
            Self::Problem(finding) => finding.to_string(),
        }
    }
}

/// Check the live response for `url` against `record`.
///
/// Mismatches are returned as [`Verdict::Problem`]; only request-level
/// failures (unreachable host, broken body stream) are errors.
#[instrument(skip(transport, record, options), fields(path = %record.path))]
pub async fn check(transport: &dyn Transport, url: &str, record: &Record, options: CheckOptions) -> Result<Verdict> {
    let response = transport.get(url).await?;
    if !response.is_success() && !response.is_redirect() {
        return Ok(Verdict::Problem(Finding::Status(response.status)));
    }

    let mut notes = Vec::new();
    if response.is_redirect() {
        let marker = redirect_marker(response.status);
        if record.has_category(&Category::RedirectOk) {
            notes.push(format!("redirect accepted ({marker})"));
        } else if marker != record.content_type {
            return Ok(Verdict::Problem(Finding::Redirect {
                expected: record.content_type.clone(),
                got: marker,
            }));
        }
        return Ok(Verdict::Ok(notes));
    }

    let live = base_media_type(response.content_type.as_deref());
    if !record.has_category(&Category::ContentTypeChangeOk) && !same_media_type(&live, &record.content_type) {
        if !equivalent_media_types(&live, &record.content_type) {
            return Ok(Verdict::Problem(Finding::ContentType {
                expected: record.content_type.clone(),
                got: live,
            }));
        }
        tracing::info!(expected = %record.content_type, got = %live, "Equivalent content type accepted");
        notes.push(format!("content-type {live} treated as {}", record.content_type));
    }

    if let Some(expected) = record.fingerprint
        && options.verify_content
    {
        let got = response.fingerprint().await?;
        if got.length != expected.length {
            return Ok(Verdict::Problem(Finding::Length {
                expected: expected.length,
                got: got.length,
            }));
        }
        if got.sha256 != expected.sha256 {
            return Ok(Verdict::Problem(Finding::Digest {
                expected: expected.sha256_hex(),
                got: got.sha256_hex(),
            }));
        }
    }
    Ok(Verdict::Ok(notes))
}
