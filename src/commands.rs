//! Subcommand implementations.
//!
//! Report lines go to the given writer; diagnostics go through `tracing`.

use crate::cli::HostMap;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::Write;
use tracing::instrument;
use urldb_probe::transport::Transport;
use urldb_probe::{CheckOptions, Verdict};
use urldb_store::{Category, Database, RecordFilter};

/// Register `url`. Returns `false` (and writes nothing) if it already exists.
#[instrument(skip(database, transport, categories))]
pub async fn add(
    database: &Database,
    transport: &dyn Transport,
    url: &str,
    lock_content: bool,
    categories: Vec<Category>,
) -> Result<bool> {
    let (domain, mut record, existed) = database.get_record(url).or_raise(|| ErrorKind::Database)?;
    if existed {
        tracing::warn!(domain = domain.name(), path = %record.path, "URL already registered");
        return Ok(false);
    }
    let live_url = database.url(domain, &record);
    urldb_probe::initialize(transport, &live_url, &mut record, lock_content)
        .await
        .or_raise(|| ErrorKind::Probe)?;
    record.categories.extend(categories);
    domain.insert_record(&record).or_raise(|| ErrorKind::Database)?;
    tracing::info!(url = %live_url, content_type = %record.content_type, "Registered URL");
    Ok(true)
}

/// Check every selected record, writing one line per URL. Returns the number
/// of failures; a record whose request failed counts as one.
#[instrument(skip_all)]
pub async fn check(
    database: &mut Database,
    transport: &dyn Transport,
    filter: RecordFilter,
    maps: &[String],
    options: CheckOptions,
    out: &mut impl Write,
) -> Result<usize> {
    for map in maps {
        let map: HostMap = map.parse()?;
        database.activate_map(&map.original, map.alias).or_raise(|| ErrorKind::Database)?;
    }

    let database: &Database = database;
    let mut failures = 0;
    for item in database.get_records(filter).or_raise(|| ErrorKind::Database)? {
        let (domain, record) = item.or_raise(|| ErrorKind::Database)?;
        let url = database.url(domain, &record);
        let line = match urldb_probe::check(transport, &url, &record, options).await {
            Ok(Verdict::Problem(finding)) => {
                failures += 1;
                format!("{url}: FAIL: {finding}")
            },
            Ok(verdict) => format!("{url}: {}", verdict.reason()),
            Err(e) => {
                tracing::debug!(error = ?e, %url, "Request failed");
                failures += 1;
                format!("{url}: FAIL: {}", *e)
            },
        };
        writeln!(out, "{line}").or_raise(|| ErrorKind::Output)?;
    }
    Ok(failures)
}

/// Write the URL of every selected record, one per line.
pub fn dump_urls(database: &Database, filter: RecordFilter, out: &mut impl Write) -> Result<()> {
    for item in database.get_records(filter).or_raise(|| ErrorKind::Database)? {
        let (domain, record) = item.or_raise(|| ErrorKind::Database)?;
        writeln!(out, "{}", database.url(domain, &record)).or_raise(|| ErrorKind::Output)?;
    }
    Ok(())
}
