//! Run configuration: YAML file, then `VAULTCHECK_*` environment overrides.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VAULTCHECK_BAG_STORE_URL` | `bag_store_url` |
//! | `VAULTCHECK_BAG_INDEX_URL` | `bag_index_url` |
//! | `VAULTCHECK_DATABASE` | `database` |
//! | `VAULTCHECK_TIMEOUT` | `timeout_secs` (default: 30) |
//! | `VAULTCHECK_JOBS` | `jobs` (default: 4) |
//! | `VAULTCHECK_ACCOUNT_SUBSTITUTES` | `account_substitutes` |

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;
use vaultcheck_bagstore::BagStoreConfig;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_JOBS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing required setting: {key}")]
    Missing { key: &'static str },

    #[error("invalid {key} {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// The file as written; every field optional so the environment can fill gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    bag_store_url: Option<String>,
    bag_index_url: Option<String>,
    database: Option<PathBuf>,
    timeout_secs: Option<u64>,
    jobs: Option<usize>,
    account_substitutes: Option<PathBuf>,
    remove_original_directory: Option<bool>,
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bag_store: BagStoreConfig,
    pub database: PathBuf,
    pub jobs: usize,
    pub account_substitutes: Option<PathBuf>,
    pub remove_original_directory: bool,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve(path, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with environment lookups going through `env`.
    pub fn resolve(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut file = match path {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };

        if let Some(v) = env("VAULTCHECK_BAG_STORE_URL") {
            file.bag_store_url = Some(v);
        }
        if let Some(v) = env("VAULTCHECK_BAG_INDEX_URL") {
            file.bag_index_url = Some(v);
        }
        if let Some(v) = env("VAULTCHECK_DATABASE") {
            file.database = Some(PathBuf::from(v));
        }
        if let Some(v) = env("VAULTCHECK_TIMEOUT") {
            file.timeout_secs = Some(parse_number("VAULTCHECK_TIMEOUT", &v)?);
        }
        if let Some(v) = env("VAULTCHECK_JOBS") {
            file.jobs = Some(parse_number("VAULTCHECK_JOBS", &v)?);
        }
        if let Some(v) = env("VAULTCHECK_ACCOUNT_SUBSTITUTES") {
            file.account_substitutes = Some(PathBuf::from(v));
        }

        let bag_store_url = required_url("bag_store_url", file.bag_store_url)?;
        let bag_index_url = required_url("bag_index_url", file.bag_index_url)?;
        let database = file
            .database
            .ok_or(ConfigError::Missing { key: "database" })?;
        let jobs = file.jobs.unwrap_or(DEFAULT_JOBS);
        if jobs == 0 {
            return Err(ConfigError::Invalid {
                key: "jobs",
                value: jobs.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            bag_store: BagStoreConfig::new(bag_store_url, bag_index_url)
                .with_timeout_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            database,
            jobs,
            account_substitutes: file.account_substitutes,
            remove_original_directory: file.remove_original_directory.unwrap_or(false),
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn required_url(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::Missing { key })?;
    let parsed = Url::parse(&value).map_err(|e| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected an http(s) URL".to_string(),
        });
    }
    Ok(value)
}
