//! Content fingerprints.
//!
//! A [`Fingerprint`] locks the exact bytes served for a URL: the body length
//! plus its SHA-256 digest. Both are always present together, which is what
//! keeps `content-length` and `content-sha256` paired in the stored document.

use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Length of a SHA-256 digest in bytes.
pub const SHA256_LEN: usize = 32;

/// Byte count and SHA-256 digest of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub length: u64,
    pub sha256: [u8; SHA256_LEN],
}
impl Fingerprint {
    pub fn new(length: u64, sha256: [u8; SHA256_LEN]) -> Self {
        Self { length, sha256 }
    }

    /// Fingerprint an in-memory buffer.
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        let mut hasher = FingerprintHasher::new();
        hasher.update(data.as_ref());
        hasher.finish()
    }

    /// Lowercase hex form of the digest, as stored on disk.
    pub fn sha256_hex(&self) -> String {
        hex::encode(self.sha256)
    }
}
impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} bytes, sha256={}", self.length, self.sha256_hex())
    }
}

/// Incremental fingerprint computation.
///
/// Feed body chunks as they arrive with [`update`](Self::update); memory use
/// does not grow with the size of the body.
#[derive(Debug, Clone, Default)]
pub struct FingerprintHasher {
    length: u64,
    hasher: Sha256,
}
impl FingerprintHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.length += chunk.len() as u64;
        self.hasher.update(chunk);
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint {
            length: self.length,
            sha256: self.hasher.finalize().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_digest() {
        let fp = Fingerprint::of(b"");
        assert_eq!(fp.length, 0);
        assert_eq!(fp.sha256_hex(), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut hasher = FingerprintHasher::new();
        for chunk in data.chunks(5) {
            hasher.update(chunk);
        }
        let fp = hasher.finish();
        assert_eq!(fp, Fingerprint::of(data));
        assert_eq!(fp.length, 43);
        assert_eq!(fp.sha256_hex(), "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592");
    }
}
