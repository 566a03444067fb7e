//! Persistence of expected records.
//!
//! The reconciler only sees [`ExpectedStore`]: a scoped transaction that hands
//! out a [`StoreSession`] for the delete/insert sequence of one DOI. The work
//! closure's result decides commit (Ok) or rollback (Err).

pub mod schema;
pub mod sqlite;

use crate::model::{ExpectedDataset, ExpectedFile, Mode};

pub use sqlite::SqliteStore;

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    /// Another thread panicked while holding the connection.
    #[error("store connection lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Operations available inside one transaction.
pub trait StoreSession {
    /// Remove the records of `doi` that `mode` rebuilds. Returns rows deleted.
    fn delete_by_doi(&mut self, doi: &str, mode: Mode) -> StoreResult<usize>;

    fn save_expected_dataset(&mut self, dataset: &ExpectedDataset) -> StoreResult<()>;

    fn save_expected_file(&mut self, file: &ExpectedFile) -> StoreResult<()>;
}

/// Destination of reconciled records.
///
/// Implementations must serialize transactions that touch the same DOI.
pub trait ExpectedStore: Send + Sync {
    /// Run `work` in one transaction: committed if it returns `Ok`, rolled back otherwise.
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn StoreSession) -> StoreResult<()>,
    ) -> StoreResult<()>;
}
