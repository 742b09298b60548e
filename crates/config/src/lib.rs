//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. a YAML or TOML file (chosen by extension),
//! 3. `URLDB_`-prefixed environment variables, with `__` separating nested
//!    keys (`URLDB_HTTP__CONNECT_TIMEOUT=5`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "URLDB_";
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Directory holding one YAML file per domain.
    pub database: PathBuf,
    pub http: HttpConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("db"),
            http: HttpConfig::default(),
        }
    }
}

/// Timeouts are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    pub timeout: u64,
    pub connect_timeout: u64,
    pub user_agent: String,
}
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            connect_timeout: 10,
            user_agent: concat!("urldb/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Config {
    /// Per-user configuration file, if the platform has a place for one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "urldb").map(|dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from `path`, or from [`Config::default_path`] when
    /// `None`. An explicitly given file must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => {
                exn::bail!(ErrorKind::Invalid(format!("config file {} not found", path.display())))
            },
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };
        tracing::debug!(file = ?file, "Loading configuration");
        Self::from_figment(Self::figment(file.as_deref()))
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(file)),
                _ => figment.merge(Yaml::file(file)),
            };
        }
        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .split("__")
                .map(|key| key.as_str().replace('_', "-").into()),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.timeout == 0 {
            exn::bail!(ErrorKind::Invalid("http.timeout must be greater than zero".to_string()));
        }
        if self.http.connect_timeout == 0 {
            exn::bail!(ErrorKind::Invalid("http.connect-timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}
