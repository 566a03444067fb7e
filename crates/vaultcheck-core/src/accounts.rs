//! Depositor account substitutes.
//!
//! Some depositor accounts were removed before migration. A CSV file with the
//! header `removed-account,chosen-account` names the account that takes over.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum AccountsError {
    #[error("no (content in) {path}")]
    Empty { path: PathBuf },

    #[error("can't read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Deserialize)]
struct SubstituteRecord {
    #[serde(rename = "removed-account")]
    removed: String,
    #[serde(rename = "chosen-account")]
    chosen: String,
}

/// Mapping from removed accounts to their replacements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSubstitutes {
    substitutes: HashMap<String, String>,
}

impl AccountSubstitutes {
    pub fn load(path: &Path) -> Result<Self, AccountsError> {
        let read_error = |source| AccountsError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(read_error)?;
        let mut substitutes = HashMap::new();
        for record in reader.deserialize::<SubstituteRecord>() {
            let record = record.map_err(read_error)?;
            substitutes.insert(record.removed, record.chosen);
        }
        if substitutes.is_empty() {
            return Err(AccountsError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(Self { substitutes })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            substitutes: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The replacement for `account`, or `account` itself.
    pub fn substitute<'a>(&'a self, account: &'a str) -> &'a str {
        self.substitutes
            .get(account)
            .map(String::as_str)
            .unwrap_or(account)
    }

    pub fn len(&self) -> usize {
        self.substitutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutes.is_empty()
    }
}
