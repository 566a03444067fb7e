//! Expected-state reconciliation for archived bag chains.
//!
//! Given the identifier of a bag in the archival store, this crate works out
//! what the migrated dataset and its files should look like afterwards:
//!
//! - discover the bag's version chain and put it in chronological order
//! - parse each version's dataset descriptor, file-rights descriptor and manifest
//! - resolve per-file rights against the dataset defaults
//! - normalize file paths into target-path form, tracking every transformation
//! - fold all versions into one expected-dataset record and a set of expected-file records
//! - replace whatever the store held for that DOI, in one transaction
//!
//! # Quick Start
//!
//! ```no_run
//! use vaultcheck_core::{Mode, ReconcileOptions, Reconciler, SqliteStore};
//! # use vaultcheck_core::MetadataFetcher;
//!
//! # async fn example(fetcher: impl MetadataFetcher) -> anyhow::Result<()> {
//! let store = SqliteStore::memory()?;
//! let reconciler = Reconciler::new(fetcher, store, ReconcileOptions::new(Mode::Both));
//! let outcome = reconciler.reconcile("24b20f8a-3c4d-4e5f-8a9b-0c1d2e3f4a5b").await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! I/O is kept behind two traits: [`MetadataFetcher`] for the bag store and
//! bag index, [`ExpectedStore`] for persistence.

pub mod accounts;
pub mod chain;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod model;
pub mod paths;
pub mod reconcile;
pub mod rights;
pub mod store;

pub use accounts::{AccountSubstitutes, AccountsError};
pub use chain::{BagChain, BagChainResolver, ChainResolution};
pub use error::{ReconcileError, ReconcileResult};
pub use fetch::{BagArtifact, FetchError, FetchResult, MetadataFetcher};
pub use model::{
    AccessCategory, BagVersionInfo, ExpectedDataset, ExpectedFile, FileAccess, FileRights,
    ManifestEntry, Mode,
};
pub use paths::{dv_path, is_thumbnail, normalize, NormalizedPath};
pub use reconcile::{
    ExpectedRecords, ReconcileOptions, ReconcileOutcome, ReconcileSummary, Reconciler, SkipReason,
};
pub use rights::{DatasetDescriptor, DatasetRights};
pub use store::{ExpectedStore, SqliteStore, StoreError, StoreResult, StoreSession};
