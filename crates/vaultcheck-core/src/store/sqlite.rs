//! SQLite-backed expected-record store.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::trace;

use super::schema::EXPECTED_SCHEMA;
use super::{ExpectedStore, StoreError, StoreResult, StoreSession};
use crate::model::{ExpectedDataset, ExpectedFile, FileAccess, FileRights, Mode};

/// SQLite store. Clones share one connection; transactions are serialized on it.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a file-backed store.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (for testing).
    pub fn memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        // WAL mode for file-backed DBs (no-op for in-memory)
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        conn.execute_batch(EXPECTED_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn expected_dataset(&self, doi: &str) -> StoreResult<Option<ExpectedDataset>> {
        let conn = self.lock()?;
        let dataset = conn
            .query_row(
                r#"
                SELECT doi, depositor, citation_year, license_url, access_category,
                       embargo_date, expected_versions, deleted
                FROM expected_dataset WHERE doi = ?
                "#,
                [doi],
                |row| {
                    Ok(ExpectedDataset {
                        doi: row.get(0)?,
                        depositor: row.get(1)?,
                        citation_year: row.get(2)?,
                        license_url: row.get(3)?,
                        access_category: row.get(4)?,
                        embargo_date: row.get(5)?,
                        expected_version_count: row.get(6)?,
                        deleted: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(dataset)
    }

    /// All expected files of `doi`, in key order.
    pub fn expected_files(&self, doi: &str) -> StoreResult<Vec<ExpectedFile>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT doi, expected_path, removed_duplicate_file_count, removed_original_directory,
                   source_path, sha1_checksum, version_ordinal, accessible_to, visible_to,
                   embargo_date, added_during_migration, removed_thumbnail, transformed_name
            FROM expected_file WHERE doi = ?
            ORDER BY expected_path, removed_duplicate_file_count, removed_original_directory
            "#,
        )?;
        let rows = stmt.query_map([doi], file_from_row)?;
        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }
        Ok(files)
    }
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<ExpectedFile> {
    Ok(ExpectedFile {
        doi: row.get(0)?,
        expected_path: row.get(1)?,
        removed_duplicate_file_count: row.get(2)?,
        removed_original_directory: row.get(3)?,
        source_path: row.get(4)?,
        sha1_checksum: row.get(5)?,
        version_ordinal: row.get(6)?,
        rights: FileRights {
            accessible_to: access_column(row, 7)?,
            visible_to: access_column(row, 8)?,
            embargo_date: row.get(9)?,
        },
        added_during_migration: row.get(10)?,
        removed_thumbnail: row.get(11)?,
        transformed_name: row.get(12)?,
    })
}

fn access_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<FileAccess>> {
    let value: Option<String> = row.get(idx)?;
    value
        .map(|v| {
            v.parse::<FileAccess>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()
}

struct SqliteSession<'c> {
    conn: &'c Connection,
}

impl StoreSession for SqliteSession<'_> {
    fn delete_by_doi(&mut self, doi: &str, mode: Mode) -> StoreResult<usize> {
        let mut deleted = 0;
        if mode.do_datasets() {
            deleted += self
                .conn
                .execute("DELETE FROM expected_dataset WHERE doi = ?", [doi])?;
        }
        if mode.do_files() {
            deleted += self
                .conn
                .execute("DELETE FROM expected_file WHERE doi = ?", [doi])?;
        }
        trace!(doi = %doi, deleted, "deleted expected records");
        Ok(deleted)
    }

    fn save_expected_dataset(&mut self, dataset: &ExpectedDataset) -> StoreResult<()> {
        trace!(doi = %dataset.doi, "saving expected dataset");
        self.conn.execute(
            r#"
            INSERT INTO expected_dataset (
                doi, depositor, citation_year, license_url, access_category,
                embargo_date, expected_versions, deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                dataset.doi,
                dataset.depositor,
                dataset.citation_year,
                dataset.license_url,
                dataset.access_category,
                dataset.embargo_date,
                dataset.expected_version_count,
                dataset.deleted,
            ],
        )?;
        Ok(())
    }

    fn save_expected_file(&mut self, file: &ExpectedFile) -> StoreResult<()> {
        trace!(doi = %file.doi, path = %file.expected_path, "saving expected file");
        self.conn.execute(
            r#"
            INSERT INTO expected_file (
                doi, expected_path, removed_duplicate_file_count, removed_original_directory,
                source_path, sha1_checksum, version_ordinal, accessible_to, visible_to,
                embargo_date, added_during_migration, removed_thumbnail, transformed_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                file.doi,
                file.expected_path,
                file.removed_duplicate_file_count,
                file.removed_original_directory,
                file.source_path,
                file.sha1_checksum,
                file.version_ordinal,
                file.rights.accessible_to.map(FileAccess::as_str),
                file.rights.visible_to.map(FileAccess::as_str),
                file.rights.embargo_date,
                file.added_during_migration,
                file.removed_thumbnail,
                file.transformed_name,
            ],
        )?;
        Ok(())
    }
}

impl ExpectedStore for SqliteStore {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn StoreSession) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let mut conn = self.lock()?;
        // BEGIN IMMEDIATE takes the write lock up front; dropping without commit rolls back
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut session = SqliteSession { conn: &tx };
            work(&mut session)?;
        }
        tx.commit()?;
        Ok(())
    }
}
