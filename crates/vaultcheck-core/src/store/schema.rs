//! SQLite schema for expected records.
//!
//! Tables:
//! - `expected_dataset`: one row per DOI
//! - `expected_file`: one row per expected file, keyed like the verification side

/// DDL for the expected-state tables.
///
/// Schema version: 1
pub const EXPECTED_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS expected_dataset (
    doi                     TEXT PRIMARY KEY,
    depositor               TEXT NOT NULL,
    citation_year           TEXT NOT NULL,
    license_url             TEXT,
    access_category         TEXT,
    embargo_date            TEXT,
    expected_versions       INTEGER NOT NULL,
    deleted                 INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS expected_file (
    doi                          TEXT NOT NULL,
    expected_path                TEXT NOT NULL,
    removed_duplicate_file_count INTEGER NOT NULL DEFAULT 0,
    removed_original_directory   INTEGER NOT NULL DEFAULT 0,
    source_path                  TEXT NOT NULL DEFAULT '',
    sha1_checksum                TEXT NOT NULL DEFAULT '',
    version_ordinal              INTEGER NOT NULL,
    accessible_to                TEXT,
    visible_to                   TEXT,
    embargo_date                 TEXT,
    added_during_migration       INTEGER NOT NULL DEFAULT 0,
    removed_thumbnail            INTEGER NOT NULL DEFAULT 0,
    transformed_name             INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (doi, expected_path, removed_duplicate_file_count, removed_original_directory)
);

CREATE INDEX IF NOT EXISTS idx_expected_file_doi
    ON expected_file(doi);
"#;
