//! File-backed registry of canonical URLs.
//!
//! The store is a directory holding one YAML file per domain. Each file starts
//! with a metadata header followed by one document per registered URL:
//!
//! ```yaml
//! ---
//! https: true
//! cnames:
//! - www.example.com
//! ---
//! _path: /data/index.json
//! content-length: 17
//! content-sha256: 5c1f...
//! content-type: application/json
//! ```
//!
//! - [`Record`]: metadata for one URL, no I/O.
//! - [`Domain`]: one backing file; lazy record reads and atomic rewrites.
//! - [`Database`]: every domain in a directory, alias resolution and URL
//!   normalization.

mod category;
mod database;
pub mod document;
mod domain;
pub mod error;
mod fingerprint;
mod normalize;
mod record;

pub use crate::category::Category;
pub use crate::database::{Database, RecordFilter};
pub use crate::domain::{DOMAIN_FILE_EXTENSION, Domain};
pub use crate::fingerprint::{Fingerprint, FingerprintHasher, SHA256_LEN};
pub use crate::normalize::{canonicalize, fold_case};
pub use crate::record::{Record, UNKNOWN_CONTENT_TYPE, redirect_marker};
