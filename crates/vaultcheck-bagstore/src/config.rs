//! Connection settings for the bag store and bag index.

use serde::{Deserialize, Serialize};

/// Where the two services live and how long a request may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagStoreConfig {
    /// Base URL of the bag store, e.g. `http://localhost:20110/stores/pdbs`.
    pub bag_store_url: String,

    /// Base URL of the bag index.
    pub bag_index_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl BagStoreConfig {
    pub fn new(bag_store_url: impl Into<String>, bag_index_url: impl Into<String>) -> Self {
        Self {
            bag_store_url: bag_store_url.into(),
            bag_index_url: bag_index_url.into(),
            timeout_secs: default_timeout(),
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_defaults_when_absent() {
        let config: BagStoreConfig = serde_json::from_str(
            r#"{"bag_store_url": "http://store", "bag_index_url": "http://index"}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config, BagStoreConfig::new("http://store", "http://index"));
    }

    #[test]
    fn test_with_timeout() {
        let config = BagStoreConfig::new("a", "b").with_timeout_secs(5);
        assert_eq!(config.timeout_secs, 5);
    }
}
