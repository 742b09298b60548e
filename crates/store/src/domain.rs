//! Per-domain backing files.

use crate::document::{self, Header, Records};
use crate::error::{ErrorKind, Result};
use crate::fingerprint::Fingerprint;
use crate::record::Record;
use exn::ResultExt;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Extension of domain files inside the database directory.
pub const DOMAIN_FILE_EXTENSION: &str = "yaml";

/// One domain and its backing file.
///
/// The header is read once when the domain is loaded. Records are never
/// cached: every call to [`records`](Self::records) reads the file again.
#[derive(Debug, Clone)]
pub struct Domain {
    name: String,
    path: PathBuf,
    header: Header,
}

/// Content of the backing file as it was before a rewrite, or `None` if the
/// file did not exist yet.
struct Snapshot(Option<Vec<u8>>);
impl Snapshot {
    fn take(path: &Path) -> Result<Self> {
        match std::fs::read(path) {
            Ok(content) => Ok(Self(Some(content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self(None)),
            Err(e) => Err(e).or_raise(|| ErrorKind::Io(path.to_path_buf())),
        }
    }

    fn content(&self) -> &[u8] {
        self.0.as_deref().unwrap_or_default()
    }

    fn revision(&self) -> Option<Fingerprint> {
        self.0.as_ref().map(Fingerprint::of)
    }
}

impl Domain {
    /// Load the domain header from `path`. A missing file is an empty domain.
    pub fn load(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (header, _) = document::open(&path)?;
        Ok(Self { name: name.into(), path, header })
    }

    /// Canonical domain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Whether URLs on this domain use `https`. Defaults to `false`.
    pub fn has_https(&self) -> bool {
        self.header.https.unwrap_or(false)
    }

    /// Whether paths on this domain are case-sensitive. Defaults to `true`.
    pub fn has_case_sensitive_paths(&self) -> bool {
        self.header.case_sensitive_paths.unwrap_or(true)
    }

    /// Alternative host names that resolve to this domain.
    pub fn cnames(&self) -> &[String] {
        self.header.cnames.as_deref().unwrap_or_default()
    }

    pub fn scheme(&self) -> &'static str {
        if self.has_https() { "https" } else { "http" }
    }

    /// Lazily read every record stored for this domain, in file order.
    pub fn records(&self) -> Result<Records<'static>> {
        let (_, records) = document::open(&self.path)?;
        Ok(records)
    }

    /// Insert or replace the record stored under `record.path`.
    ///
    /// The whole file is rewritten: header first, then every record sorted by
    /// path. The new content goes to a temporary file next to the target that
    /// is renamed over it, so readers see either the old or the new file. If
    /// the file changed on disk while the new content was prepared, nothing is
    /// written and [`ConcurrentModification`](ErrorKind::ConcurrentModification)
    /// is returned.
    #[instrument(skip_all, fields(domain = %self.name, path = %record.path))]
    pub fn insert_record(&self, record: &Record) -> Result<()> {
        let snapshot = Snapshot::take(&self.path)?;
        self.rewrite(snapshot, record)
    }

    fn rewrite(&self, snapshot: Snapshot, record: &Record) -> Result<()> {
        let (header, existing) = document::parse(snapshot.content(), &self.path)?;
        let mut by_path = BTreeMap::new();
        for existing in existing {
            let existing = existing?;
            by_path.insert(existing.path.clone(), existing);
        }
        by_path.insert(record.path.clone(), record.clone());
        let rendered = document::render(&header, by_path.values(), &self.path)?;
        if snapshot.0.as_deref() == Some(rendered.as_bytes()) {
            tracing::debug!("Domain file already up to date; skipping rewrite");
            return Ok(());
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(&self.name)
            .suffix(".tmp")
            .tempfile_in(dir)
            .or_raise(|| ErrorKind::Io(dir.to_path_buf()))?;
        tmp.write_all(rendered.as_bytes()).or_raise(|| ErrorKind::Io(tmp.path().to_path_buf()))?;
        tmp.as_file().sync_all().or_raise(|| ErrorKind::Io(tmp.path().to_path_buf()))?;

        // The temporary file is removed on drop if we bail here.
        if Snapshot::take(&self.path)?.revision() != snapshot.revision() {
            tracing::warn!(file = %self.path.display(), "Domain file changed during rewrite; discarding update");
            exn::bail!(ErrorKind::ConcurrentModification(self.path.clone()));
        }
        tmp.persist(&self.path).or_raise(|| ErrorKind::Io(self.path.clone()))?;
        tracing::debug!(records = by_path.len(), "Domain file rewritten");
        Ok(())
    }
}
