//! Bag store / bag index client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;
use url::Url;
use vaultcheck_core::{BagArtifact, FetchError, FetchResult, MetadataFetcher};

use crate::config::BagStoreConfig;

mod http;

use http::{HttpBackend, NotFound};

/// User-Agent sent with every request.
pub const BAGSTORE_USER_AGENT: &str = concat!("vaultcheck/", env!("CARGO_PKG_VERSION"));

/// Client for the bag store and the bag index.
#[derive(Debug, Clone)]
pub struct BagStoreClient {
    http: HttpBackend,
    bag_store_url: String,
    bag_index_url: String,
}

impl BagStoreClient {
    pub fn new(config: BagStoreConfig) -> FetchResult<Self> {
        let bag_store_url = base_url(&config.bag_store_url)?;
        let bag_index_url = base_url(&config.bag_index_url)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(BAGSTORE_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| FetchError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http: HttpBackend { client },
            bag_store_url,
            bag_index_url,
        })
    }

    fn artifact_url(&self, bag_id: &str, artifact: BagArtifact) -> String {
        format!("{}/bags/{}/{}", self.bag_store_url, bag_id, artifact.path())
    }

    fn index_url(&self, bag_id: &str) -> String {
        format!("{}/bags/{}", self.bag_index_url, bag_id)
    }

    fn sequence_url(&self, bag_id: &str) -> FetchResult<Url> {
        let raw = format!("{}/bag-sequence", self.bag_index_url);
        Url::parse_with_params(&raw, &[("contains", bag_id)]).map_err(|e| FetchError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }
}

/// Validate a configured base URL and drop any trailing slash.
fn base_url(raw: &str) -> FetchResult<String> {
    let parsed = Url::parse(raw).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[async_trait]
impl MetadataFetcher for BagStoreClient {
    async fn bag_index_entry(&self, bag_id: &str) -> FetchResult<String> {
        let url = self.index_url(bag_id);
        debug!(url = %url, "fetching bag index entry");
        self.http.get_text(&url, NotFound::Empty).await
    }

    async fn bag_sequence(&self, bag_id: &str) -> FetchResult<String> {
        let url = self.sequence_url(bag_id)?;
        debug!(url = %url, "fetching bag sequence");
        self.http.get_text(url.as_str(), NotFound::Fail).await
    }

    async fn bag_artifact(&self, bag_id: &str, artifact: BagArtifact) -> FetchResult<String> {
        let url = self.artifact_url(bag_id, artifact);
        debug!(url = %url, "fetching bag artifact");
        self.http.get_text(&url, NotFound::Empty).await
    }
}
