//! A single registered URL.
//!
//! Records are plain data: no I/O happens here. They are read from and written
//! to the per-domain files by [`Domain`](crate::Domain) and probed over HTTP by
//! the `urldb-probe` crate.

use crate::category::Category;
use crate::document::sort_keys;
use crate::error::{ErrorKind, Result};
use crate::fingerprint::{Fingerprint, SHA256_LEN};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Content type given to records that have not been fetched yet.
pub const UNKNOWN_CONTENT_TYPE: &str = "UNKNOWN";

const KEY_PATH: &str = "_path";
const KEY_CONTENT_TYPE: &str = "content-type";
const KEY_CONTENT_LENGTH: &str = "content-length";
const KEY_CONTENT_SHA256: &str = "content-sha256";
const KEY_CATEGORIES: &str = "categories";

/// Synthetic content type recorded for URLs that are expected to redirect.
///
/// ```
/// assert_eq!(urldb_store::redirect_marker(301), "X-301-Redirect");
/// ```
pub fn redirect_marker(status: u16) -> String {
    format!("X-{status}-Redirect")
}

/// Metadata for one URL within a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Normalized path (and query string), unique within its domain.
    pub path: String,
    /// Base media type, or a [`redirect_marker`].
    pub content_type: String,
    /// Locked length and digest of the content, if any.
    pub fingerprint: Option<Fingerprint>,
    pub categories: BTreeSet<Category>,
    /// Any other fields from the stored document, never interpreted.
    pub extras: BTreeMap<String, Value>,
}

impl Record {
    /// A record stub that has not been fetched or persisted yet.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_type: UNKNOWN_CONTENT_TYPE.to_string(),
            fingerprint: None,
            categories: BTreeSet::new(),
            extras: BTreeMap::new(),
        }
    }

    pub fn has_category(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    pub fn is_deprecated(&self) -> bool {
        self.has_category(&Category::Deprecated)
    }

    /// Build a record from one stored document.
    ///
    /// `_path` and `content-type` are required. `content-length` and
    /// `content-sha256` must appear together. Every key that isn't recognized
    /// ends up in [`extras`](Self::extras).
    pub fn from_document(doc: Value) -> Result<Self> {
        let Value::Mapping(mapping) = doc else {
            exn::bail!(ErrorKind::MalformedRecord("record document is not a mapping".to_string()));
        };
        let mut fields = BTreeMap::new();
        for (key, value) in mapping {
            match key {
                Value::String(key) => fields.insert(key, value),
                other => exn::bail!(ErrorKind::MalformedRecord(format!("non-string key {other:?}"))),
            };
        }

        let path = take_string(&mut fields, KEY_PATH, None)?;
        let content_type = take_string(&mut fields, KEY_CONTENT_TYPE, Some(&path))?;
        let length = fields.remove(KEY_CONTENT_LENGTH);
        let digest = fields.remove(KEY_CONTENT_SHA256);
        let fingerprint = match (length, digest) {
            (None, None) => None,
            (Some(length), Some(digest)) => Some(parse_fingerprint(&path, length, digest)?),
            (Some(_), None) => exn::bail!(malformed(&path, "`content-length` without `content-sha256`")),
            (None, Some(_)) => exn::bail!(malformed(&path, "`content-sha256` without `content-length`")),
        };
        let categories = match fields.remove(KEY_CATEGORIES) {
            None | Some(Value::Null) => BTreeSet::new(),
            Some(Value::Sequence(items)) => parse_categories(&path, items)?,
            Some(_) => exn::bail!(malformed(&path, "`categories` is not a sequence")),
        };

        Ok(Self {
            path,
            content_type,
            fingerprint,
            categories,
            extras: fields,
        })
    }

    /// Inverse of [`from_document`](Self::from_document).
    ///
    /// Keys (including those nested inside extras) and categories are emitted
    /// in sorted order so that rewriting a file produces a minimal diff.
    pub fn to_document(&self) -> Value {
        let mut fields: BTreeMap<String, Value> = self.extras.clone();
        fields.insert(KEY_PATH.to_string(), Value::String(self.path.clone()));
        fields.insert(KEY_CONTENT_TYPE.to_string(), Value::String(self.content_type.clone()));
        if let Some(fp) = &self.fingerprint {
            fields.insert(KEY_CONTENT_LENGTH.to_string(), Value::Number(fp.length.into()));
            fields.insert(KEY_CONTENT_SHA256.to_string(), Value::String(fp.sha256_hex()));
        }
        if !self.categories.is_empty() {
            let items = self.categories.iter().map(|c| Value::String(c.to_string())).collect();
            fields.insert(KEY_CATEGORIES.to_string(), Value::Sequence(items));
        }
        let mapping: Mapping = fields.into_iter().map(|(k, v)| (Value::String(k), sort_keys(v))).collect();
        Value::Mapping(mapping)
    }
}

fn malformed(path: &str, reason: &str) -> ErrorKind {
    ErrorKind::MalformedRecord(format!("record `{path}`: {reason}"))
}

fn take_string(fields: &mut BTreeMap<String, Value>, key: &str, path: Option<&str>) -> Result<String> {
    let path = path.unwrap_or("<unknown>");
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => exn::bail!(malformed(path, &format!("`{key}` is not a string"))),
        None => exn::bail!(malformed(path, &format!("missing required field `{key}`"))),
    }
}

fn parse_fingerprint(path: &str, length: Value, digest: Value) -> Result<Fingerprint> {
    let Some(length) = length.as_u64() else {
        exn::bail!(malformed(path, "`content-length` is not a non-negative integer"));
    };
    let Value::String(digest) = digest else {
        exn::bail!(malformed(path, "`content-sha256` is not a string"));
    };
    let sha256: [u8; SHA256_LEN] = match hex::decode(&digest).ok().and_then(|bytes| bytes.try_into().ok()) {
        Some(sha256) => sha256,
        None => exn::bail!(malformed(path, "`content-sha256` is not a 32-byte hex digest")),
    };
    Ok(Fingerprint::new(length, sha256))
}

fn parse_categories(path: &str, items: Vec<Value>) -> Result<BTreeSet<Category>> {
    let mut categories = BTreeSet::new();
    for item in items {
        let Value::String(name) = item else {
            exn::bail!(malformed(path, "`categories` contains a non-string entry"));
        };
        let category = Category::from(name.as_str());
        if category.is_unknown() {
            tracing::warn!(path, category = %category, "Unrecognized category has no effect");
        }
        categories.insert(category);
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_minimal_document() {
        let record = Record::from_document(doc("_path: /a.json\ncontent-type: application/json\n")).unwrap();
        assert_eq!(record.path, "/a.json");
        assert_eq!(record.content_type, "application/json");
        assert!(record.fingerprint.is_none());
        assert!(record.categories.is_empty());
        assert!(record.extras.is_empty());
    }

    #[test]
    fn test_full_document() {
        let record = Record::from_document(doc(concat!(
            "_path: /data/file.bin\n",
            "content-type: application/octet-stream\n",
            "content-length: 17\n",
            "content-sha256: 00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff\n",
            "categories: [redirect-ok, custom-tag]\n",
            "notes: hand-checked\n",
            "owner: {team: web, since: 2019}\n",
        )))
        .unwrap();
        let fp = record.fingerprint.unwrap();
        assert_eq!(fp.length, 17);
        assert_eq!(fp.sha256[0], 0x00);
        assert_eq!(fp.sha256[31], 0xff);
        assert!(record.has_category(&Category::RedirectOk));
        assert!(record.has_category(&Category::Other("custom-tag".to_string())));
        assert_eq!(record.extras.len(), 2);
        assert_eq!(record.extras["notes"], Value::String("hand-checked".to_string()));
    }

    #[rstest]
    #[case::missing_path("content-type: text/html\n")]
    #[case::missing_content_type("_path: /x\n")]
    #[case::path_not_string("_path: [1]\ncontent-type: text/html\n")]
    #[case::length_only("_path: /x\ncontent-type: text/html\ncontent-length: 3\n")]
    #[case::digest_only(
        "_path: /x\ncontent-type: text/html\ncontent-sha256: 00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff\n"
    )]
    #[case::negative_length(
        "_path: /x\ncontent-type: text/html\ncontent-length: -1\ncontent-sha256: 00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff\n"
    )]
    #[case::short_digest("_path: /x\ncontent-type: text/html\ncontent-length: 1\ncontent-sha256: abcd\n")]
    #[case::categories_not_list("_path: /x\ncontent-type: text/html\ncategories: deprecated\n")]
    #[case::not_a_mapping("- just\n- a list\n")]
    fn test_malformed(#[case] yaml: &str) {
        let err = Record::from_document(doc(yaml)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedRecord(_)));
    }

    #[test]
    fn test_round_trip() {
        let mut record = Record::new("/a/b?x=1");
        record.content_type = "text/html".to_string();
        record.fingerprint = Some(Fingerprint::of(b"hello, fingerprint"));
        record.categories.insert(Category::Deprecated);
        record.categories.insert(Category::Other("zzz".to_string()));
        record.extras.insert("comment".to_string(), Value::String("kept".to_string()));
        record.extras.insert("nested".to_string(), doc("{b: 2, a: [1, 2]}"));
        let restored = Record::from_document(record.to_document()).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_document_keys_sorted() {
        let mut record = Record::new("/x");
        record.categories.insert(Category::RedirectOk);
        record.categories.insert(Category::Deprecated);
        record.fingerprint = Some(Fingerprint::of(b"abc"));
        record.extras.insert("aardvark".to_string(), Value::Bool(true));
        let Value::Mapping(mapping) = record.to_document() else {
            panic!("expected mapping");
        };
        let keys: Vec<_> = mapping.keys().map(|k| k.as_str().unwrap()).collect();
        assert_eq!(
            keys,
            ["_path", "aardvark", "categories", "content-length", "content-sha256", "content-type"]
        );
        assert_eq!(mapping["categories"], doc("[deprecated, redirect-ok]"));
    }

    #[test]
    fn test_stub() {
        let record = Record::new("/new");
        assert_eq!(record.content_type, UNKNOWN_CONTENT_TYPE);
        assert!(record.fingerprint.is_none());
        let Value::Mapping(mapping) = record.to_document() else {
            panic!("expected mapping");
        };
        assert_eq!(mapping.len(), 2);
    }
}
