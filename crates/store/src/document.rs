//! Domain file codec.
//!
//! A domain file is a stream of YAML documents: the first is always the
//! [`Header`], every following document is one [`Record`]. That positional
//! convention stays inside this module; callers only ever see a header plus a
//! sequence of records.

use crate::error::{ErrorKind, Result};
use crate::record::Record;
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use serde_yaml::{Deserializer, Mapping, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const DOCUMENT_START: &str = "---\n";

/// Domain metadata, stored as the first document of a domain file.
///
/// Keys that are absent stay absent when the file is rewritten, so an empty
/// header round-trips as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive_paths: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnames: Option<Vec<String>>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}
impl Header {
    fn from_document(doc: Option<Value>, path: &Path) -> Result<Self> {
        match doc {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(doc) => serde_yaml::from_value(doc).or_raise(|| ErrorKind::MalformedDocument(path.to_path_buf())),
        }
    }
}

/// Lazily parsed record documents following the header.
///
/// Parsing stops at the first malformed document: that error is yielded and
/// the iterator is exhausted afterwards.
pub struct Records<'de> {
    path: PathBuf,
    documents: Option<Deserializer<'de>>,
}
impl Records<'_> {
    fn empty(path: &Path) -> Self {
        Self { path: path.to_path_buf(), documents: None }
    }
}
impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let document = self.documents.as_mut()?.next()?;
        let result = Value::deserialize(document)
            .or_raise(|| ErrorKind::MalformedDocument(self.path.clone()))
            .and_then(Record::from_document);
        if result.is_err() {
            self.documents = None;
        }
        Some(result)
    }
}

fn split<'de>(mut documents: Deserializer<'de>, path: &Path) -> Result<(Header, Records<'de>)> {
    let first = match documents.next() {
        Some(document) => {
            Some(Value::deserialize(document).or_raise(|| ErrorKind::MalformedDocument(path.to_path_buf()))?)
        },
        None => None,
    };
    let header = Header::from_document(first, path)?;
    let records = Records {
        path: path.to_path_buf(),
        documents: Some(documents),
    };
    Ok((header, records))
}

/// Open a domain file, reading its header eagerly and its records lazily.
///
/// A file that doesn't exist is an empty domain, not an error.
pub fn open(path: &Path) -> Result<(Header, Records<'static>)> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Header::default(), Records::empty(path))),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io(path.to_path_buf())),
    };
    split(Deserializer::from_reader(BufReader::new(file)), path)
}

/// Parse an in-memory copy of a domain file.
pub fn parse<'de>(content: &'de [u8], path: &Path) -> Result<(Header, Records<'de>)> {
    split(Deserializer::from_slice(content), path)
}

/// Render a header followed by records, each preceded by an explicit document
/// start marker. Records are written in the order given.
pub fn render<'a>(header: &Header, records: impl IntoIterator<Item = &'a Record>, path: &Path) -> Result<String> {
    let mut out = String::new();
    let header = serde_yaml::to_value(header).or_raise(|| ErrorKind::MalformedDocument(path.to_path_buf()))?;
    push_document(&mut out, sort_keys(header), path)?;
    for record in records {
        push_document(&mut out, record.to_document(), path)?;
    }
    Ok(out)
}

fn push_document(out: &mut String, document: Value, path: &Path) -> Result<()> {
    let text = serde_yaml::to_string(&document).or_raise(|| ErrorKind::MalformedDocument(path.to_path_buf()))?;
    out.push_str(DOCUMENT_START);
    out.push_str(&text);
    Ok(())
}

/// Recursively order mapping keys so output is deterministic.
pub(crate) fn sort_keys(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => {
            let mut entries: Vec<(Value, Value)> = mapping.into_iter().collect();
            entries.sort_by_cached_key(|(key, _)| sort_key(key));
            Value::Mapping(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect::<Mapping>())
        },
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sort_keys).collect()),
        Value::Tagged(mut tagged) => {
            tagged.value = sort_keys(tagged.value);
            Value::Tagged(tagged)
        },
        scalar => scalar,
    }
}

fn sort_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        "---\n",
        "case-sensitive-paths: false\n",
        "cnames:\n- www.example.com\n",
        "---\n",
        "_path: /a\n",
        "content-type: text/html\n",
        "---\n",
        "_path: /b\n",
        "content-type: text/plain\n",
    );

    #[test]
    fn test_parse_header_and_records() {
        let path = Path::new("example.com.yaml");
        let (header, records) = parse(SAMPLE.as_bytes(), path).unwrap();
        assert_eq!(header.case_sensitive_paths, Some(false));
        assert_eq!(header.https, None);
        assert_eq!(header.cnames, Some(vec!["www.example.com".to_string()]));
        let records: Vec<_> = records.collect::<Result<_>>().unwrap();
        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/b"]);
    }

    #[test]
    fn test_empty_header() {
        let path = Path::new("example.com.yaml");
        let (header, records) = parse(b"--- {}\n", path).unwrap();
        assert_eq!(header, Header::default());
        assert_eq!(records.count(), 0);
        let (header, records) = parse(b"", path).unwrap();
        assert_eq!(header, Header::default());
        assert_eq!(records.count(), 0);
    }

    #[test]
    fn test_malformed_record_stops_iteration() {
        let content = "--- {}\n---\n_path: /a\n---\ncontent-type: text/html\n---\n_path: /c\ncontent-type: x\n";
        let (_, mut records) = parse(content.as_bytes(), Path::new("x.yaml")).unwrap();
        assert!(records.next().unwrap().is_err());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (header, records) = open(&temp_dir.path().join("missing.yaml")).unwrap();
        assert_eq!(header, Header::default());
        assert_eq!(records.count(), 0);
    }

    #[test]
    fn test_render_round_trip() {
        let path = Path::new("example.com.yaml");
        let (header, records) = parse(SAMPLE.as_bytes(), path).unwrap();
        let records: Vec<_> = records.collect::<Result<_>>().unwrap();
        let rendered = render(&header, &records, path).unwrap();
        assert!(rendered.starts_with("---\ncase-sensitive-paths: false\ncnames:\n"));
        let (header_again, records_again) = parse(rendered.as_bytes(), path).unwrap();
        assert_eq!(header_again, header);
        assert_eq!(records_again.collect::<Result<Vec<_>>>().unwrap(), records);
        // Rendering is deterministic.
        assert_eq!(render(&header, &records, path).unwrap(), rendered);
    }

    #[test]
    fn test_render_empty_header() {
        let rendered = render(&Header::default(), &Vec::<Record>::new(), Path::new("x.yaml")).unwrap();
        assert_eq!(rendered, "---\n{}\n");
    }

    #[test]
    fn test_header_extras_preserved() {
        let path = Path::new("example.com.yaml");
        let (header, _) = parse(b"---\nhttps: true\nowner: web-team\n", path).unwrap();
        assert_eq!(header.https, Some(true));
        assert_eq!(header.extras["owner"], Value::String("web-team".to_string()));
        let rendered = render(&header, &Vec::<Record>::new(), path).unwrap();
        assert_eq!(rendered, "---\nhttps: true\nowner: web-team\n");
    }
}
