//! Fetch seam: raw access to the bag store and bag index.
//!
//! Implementations do I/O only. Parsing happens in [`crate::metadata`] and
//! [`crate::rights`].

use async_trait::async_trait;

/// Per-bag artifacts served by the bag store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BagArtifact {
    Manifest,
    FilesXml,
    DatasetXml,
    BagInfo,
}

impl BagArtifact {
    /// Path of the artifact relative to the bag root.
    pub fn path(self) -> &'static str {
        match self {
            Self::Manifest => "manifest-sha1.txt",
            Self::FilesXml => "metadata/files.xml",
            Self::DatasetXml => "metadata/dataset.xml",
            Self::BagInfo => "bag-info.txt",
        }
    }
}

/// Transport failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, timeout or body read failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Non-success status that is not mapped to an empty body.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// A request URL could not be built.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be set up.
    #[error("client configuration error: {0}")]
    Config(String),
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Raw access to the bag store and the bag index.
///
/// An empty string means "not found" for [`bag_index_entry`](Self::bag_index_entry)
/// and for every [`BagArtifact`]; callers decide what that means.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// `GET <bag-index>/bags/<bag_id>`: JSON envelope with the bag's identity.
    async fn bag_index_entry(&self, bag_id: &str) -> FetchResult<String>;

    /// `GET <bag-index>/bag-sequence?contains=<bag_id>`: newline separated bag ids.
    async fn bag_sequence(&self, bag_id: &str) -> FetchResult<String>;

    /// `GET <bag-store>/bags/<bag_id>/<artifact>`.
    async fn bag_artifact(&self, bag_id: &str, artifact: BagArtifact) -> FetchResult<String>;
}
