//! Command-line surface.

use crate::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use urldb_store::{Category, RecordFilter};

#[derive(Debug, Parser)]
#[command(name = "urldb", version, about = "Registry of canonical URLs with content-integrity checks")]
pub struct Cli {
    /// Configuration file (YAML or TOML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory of domain files; overrides the configured one.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new URL, recording its live metadata.
    Add {
        url: String,
        /// Lock the content length and SHA-256 digest.
        #[arg(long = "static")]
        lock_content: bool,
        /// Tag the new record (repeatable).
        #[arg(long = "category")]
        categories: Vec<Category>,
    },
    /// Check every selected record against its live response.
    Check {
        #[command(flatten)]
        selection: Selection,
        /// Send requests for ORIGINAL to ALIAS instead (repeatable).
        #[arg(long = "map", value_name = "ORIGINAL=ALIAS")]
        maps: Vec<String>,
        /// Skip downloading bodies to verify locked fingerprints.
        #[arg(long)]
        quick: bool,
    },
    /// Print the URL of every selected record.
    DumpUrls {
        #[command(flatten)]
        selection: Selection,
    },
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct Selection {
    /// Only records of this domain (canonical name or alias).
    #[arg(long)]
    pub domain: Option<String>,
    /// Only records whose path starts with this prefix.
    #[arg(long)]
    pub path_prefix: Option<String>,
}
impl From<Selection> for RecordFilter {
    fn from(selection: Selection) -> Self {
        Self {
            category: None,
            domain: selection.domain,
            path_prefix: selection.path_prefix,
        }
    }
}

/// A parsed `--map ORIGINAL=ALIAS` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMap {
    pub original: String,
    pub alias: String,
}
impl FromStr for HostMap {
    type Err = ErrorKind;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((original, alias)) if !original.is_empty() && !alias.is_empty() && !alias.contains('=') => Ok(Self {
                original: original.to_string(),
                alias: alias.to_string(),
            }),
            _ => Err(ErrorKind::InvalidMapping(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("example.com=localhost:8080", "example.com", "localhost:8080")]
    #[case("www.example.com=staging.example.com", "www.example.com", "staging.example.com")]
    fn test_host_map(#[case] arg: &str, #[case] original: &str, #[case] alias: &str) {
        let map: HostMap = arg.parse().unwrap();
        assert_eq!(map.original, original);
        assert_eq!(map.alias, alias);
    }

    #[rstest]
    #[case("example.com")]
    #[case("=localhost")]
    #[case("example.com=")]
    #[case("a=b=c")]
    fn test_host_map_invalid(#[case] arg: &str) {
        assert_eq!(arg.parse::<HostMap>(), Err(ErrorKind::InvalidMapping(arg.to_string())));
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::parse_from(["urldb", "add", "http://example.com/a.json", "--static", "--category", "redirect-ok"]);
        match cli.command {
            Command::Add {
                url,
                lock_content,
                categories,
            } => {
                assert_eq!(url, "http://example.com/a.json");
                assert!(lock_content);
                assert_eq!(categories, vec![Category::RedirectOk]);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from([
            "urldb",
            "-v",
            "check",
            "--domain",
            "example.com",
            "--map",
            "example.com=localhost",
            "--quick",
            "--database",
            "/tmp/db",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/db")));
        match cli.command {
            Command::Check { selection, maps, quick } => {
                assert_eq!(selection.domain.as_deref(), Some("example.com"));
                assert_eq!(selection.path_prefix, None);
                assert_eq!(maps, vec!["example.com=localhost".to_string()]);
                assert!(quick);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
