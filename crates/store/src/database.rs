//! The collection of domains in a database directory.

use crate::category::Category;
use crate::domain::{DOMAIN_FILE_EXTENSION, Domain};
use crate::error::{ErrorKind, Result};
use crate::normalize::{canonicalize, fold_case};
use crate::record::Record;
use exn::ResultExt;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::instrument;
use url::Url;

/// Selection criteria for [`Database::get_records`].
///
/// Deprecated records are always excluded, regardless of the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Only records tagged with this category.
    pub category: Option<Category>,
    /// Only records of this domain (canonical name or alias).
    pub domain: Option<String>,
    /// Only records whose path starts with this prefix.
    pub path_prefix: Option<String>,
}
impl RecordFilter {
    fn matches(&self, record: &Record) -> bool {
        !record.is_deprecated()
            && self.category.as_ref().is_none_or(|category| record.has_category(category))
            && self.path_prefix.as_deref().is_none_or(|prefix| record.path.starts_with(prefix))
    }
}

/// All domains found in one directory.
///
/// Constructed once, then immutable apart from [`activate_map`](Self::activate_map).
#[derive(Debug)]
pub struct Database {
    root: PathBuf,
    domains: BTreeMap<String, Domain>,
    /// Lower-cased host (canonical name or cname) to canonical domain name.
    aliases: HashMap<String, String>,
    /// Canonical domain name to the host requests should actually go to.
    active: HashMap<String, String>,
}

impl Database {
    /// Scan `root` for domain files and load their headers.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut names = BTreeSet::new();
        for entry in std::fs::read_dir(&root).or_raise(|| ErrorKind::Io(root.clone()))? {
            let entry = entry.or_raise(|| ErrorKind::Io(root.clone()))?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(DOMAIN_FILE_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(name) if !name.is_empty() => names.insert(name.to_string()),
                _ => continue,
            };
        }

        let mut domains = BTreeMap::new();
        let mut aliases = HashMap::new();
        for name in names {
            let path = root.join(format!("{name}.{DOMAIN_FILE_EXTENSION}"));
            let domain = Domain::load(&name, path)?;
            aliases.insert(name.to_ascii_lowercase(), name.clone());
            domains.insert(name, domain);
        }
        for domain in domains.values() {
            for cname in domain.cnames() {
                let key = cname.to_ascii_lowercase();
                match aliases.get(&key) {
                    Some(owner) if owner != domain.name() => {
                        tracing::warn!(cname = %cname, owner = %owner, ignored = domain.name(), "Alias already claimed by another domain");
                    },
                    Some(_) => {},
                    None => {
                        aliases.insert(key, domain.name().to_string());
                    },
                }
            }
        }
        tracing::debug!(domains = domains.len(), aliases = aliases.len(), "Database loaded");

        Ok(Self {
            root,
            domains,
            aliases,
            active: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every domain, sorted by name.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }

    /// Resolve a host name (canonical or alias) to its domain.
    pub fn domain(&self, host: &str) -> Result<&Domain> {
        self.aliases
            .get(&host.to_ascii_lowercase())
            .and_then(|name| self.domains.get(name))
            .ok_or_else(|| ErrorKind::UnknownDomain(host.to_string()).into())
    }

    /// Normalize a URL into its domain and record key.
    ///
    /// The host (plus any non-default port) is resolved through the alias map.
    /// The path is case-folded only on domains without case-sensitive paths;
    /// the query string never is. The fragment is dropped. URLs carrying
    /// credentials are rejected.
    pub fn normalize(&self, url: &str) -> Result<(&Domain, String)> {
        let parsed = Url::parse(url).or_raise(|| ErrorKind::InvalidUrl(url.to_string()))?;
        let Some(host) = parsed.host_str() else {
            exn::bail!(ErrorKind::InvalidUrl(url.to_string()));
        };
        // Credentials aren't part of any registered host name.
        if !parsed.username().is_empty() || parsed.password().is_some() {
            exn::bail!(ErrorKind::InvalidUrl(url.to_string()));
        }
        let netloc = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let domain = self.domain(&netloc)?;

        let mut path = match domain.has_case_sensitive_paths() {
            true => parsed.path().to_string(),
            false => fold_case(parsed.path()),
        };
        if let Some(query) = parsed.query() {
            path.push('?');
            path.push_str(query);
        }
        Ok((domain, canonicalize(&path)))
    }

    /// Find the stored record for `url`.
    ///
    /// Returns `(domain, record, existed)`. When `existed` is false the record
    /// is a fresh stub that still has to be saved with
    /// [`Domain::insert_record`].
    pub fn get_record(&self, url: &str) -> Result<(&Domain, Record, bool)> {
        let (domain, path) = self.normalize(url)?;
        for record in domain.records()? {
            let record = record?;
            if record.path == path {
                return Ok((domain, record, true));
            }
        }
        Ok((domain, Record::new(path), false))
    }

    /// Lazily iterate over the records selected by `filter`.
    ///
    /// Fails up front if the filter names an unknown domain; errors reading
    /// individual domain files are yielded in place.
    pub fn get_records<'a>(
        &'a self,
        filter: RecordFilter,
    ) -> Result<impl Iterator<Item = Result<(&'a Domain, Record)>> + 'a> {
        let selected: Vec<&'a Domain> = match &filter.domain {
            Some(host) => vec![self.domain(host)?],
            None => self.domains.values().collect(),
        };
        let records = selected.into_iter().flat_map(
            |domain: &'a Domain| -> Box<dyn Iterator<Item = Result<(&'a Domain, Record)>> + 'a> {
                match domain.records() {
                    Ok(records) => Box::new(records.map(move |record| record.map(|record| (domain, record)))),
                    Err(e) => Box::new(std::iter::once(Err(e))),
                }
            },
        );
        Ok(records.filter(move |item| match item {
            Ok((_, record)) => filter.matches(record),
            Err(_) => true,
        }))
    }

    /// Send requests for `original` (canonical name or alias) to `alias`
    /// instead. Lives for as long as this database; never written to disk.
    pub fn activate_map(&mut self, original: &str, alias: impl Into<String>) -> Result<()> {
        let name = self.domain(original)?.name().to_string();
        let alias = alias.into();
        tracing::info!(domain = %name, alias = %alias, "Activated host mapping");
        self.active.insert(name, alias);
        Ok(())
    }

    /// Full URL of a record, honouring any active host mapping.
    pub fn url(&self, domain: &Domain, record: &Record) -> String {
        let host = self.active.get(domain.name()).map(String::as_str).unwrap_or(domain.name());
        format!("{}://{}{}", domain.scheme(), host, record.path)
    }
}
