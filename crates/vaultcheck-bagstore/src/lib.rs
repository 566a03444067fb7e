//! HTTP access to the bag store and the bag index.
//!
//! [`BagStoreClient`] implements [`vaultcheck_core::MetadataFetcher`] on top of
//! `reqwest`. Every request has the configured timeout and is tried once.
//!
//! # Quick Start
//!
//! ```no_run
//! use vaultcheck_bagstore::{BagStoreClient, BagStoreConfig};
//! use vaultcheck_core::{BagArtifact, MetadataFetcher};
//!
//! # async fn example() -> Result<(), vaultcheck_core::FetchError> {
//! let config = BagStoreConfig::new("http://localhost:20110/stores/pdbs", "http://localhost:20120");
//! let client = BagStoreClient::new(config)?;
//! let manifest = client
//!     .bag_artifact("24b20f8a-3c4d-4e5f-8a9b-0c1d2e3f4a5b", BagArtifact::Manifest)
//!     .await?;
//! println!("{manifest}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;

pub use client::{BagStoreClient, BAGSTORE_USER_AGENT};
pub use config::BagStoreConfig;
