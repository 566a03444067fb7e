//! Expected-state builder: folds a bag chain into expected records.
//!
//! One call to [`Reconciler::reconcile`] handles one archival identifier:
//!
//! 1. resolve the chain (not found / other version end the run quietly)
//! 2. per member, oldest first: dataset descriptor, then manifest and file rights
//! 3. attach chain-level attributes (depositor, citation year, version count)
//! 4. replace the DOI's records in one store transaction
//!
//! Reconciling the same identifier again with unchanged upstream data yields
//! the same records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span, trace, warn, Instrument};

use crate::accounts::AccountSubstitutes;
use crate::chain::{BagChain, BagChainResolver, ChainResolution};
use crate::error::{ReconcileError, ReconcileResult};
use crate::fetch::{BagArtifact, MetadataFetcher};
use crate::metadata::{parse_depositor, parse_manifest};
use crate::model::{ExpectedDataset, ExpectedFile, FileRights, ManifestEntry, Mode};
use crate::paths;
use crate::rights::{self, DatasetDescriptor};
use crate::store::ExpectedStore;

/// Files generated by the migration for every version.
pub const MIGRATION_FILES: [&str; 3] = ["provenance.xml", "dataset.xml", "files.xml"];

/// Leading segment of payload paths in a bag manifest.
const PAYLOAD_DIR: &str = "data/";

/// Run-wide reconciliation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOptions {
    pub mode: Mode,
    /// Strip a leading `original/` folder from payload paths.
    pub remove_original_directory: bool,
}

impl ReconcileOptions {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            remove_original_directory: false,
        }
    }

    pub fn with_remove_original_directory(mut self, remove: bool) -> Self {
        self.remove_original_directory = remove;
        self
    }
}

/// Why an identifier produced no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    OtherVersion { base_id: String },
}

/// What a reconciliation wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub doi: String,
    pub versions: usize,
    pub files: usize,
}

/// Terminal state of one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Resolved(ReconcileSummary),
    /// Records were written, but the dataset is presumed deactivated.
    Deleted(ReconcileSummary),
    Skipped(SkipReason),
}

/// The record set built for one chain, before it is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedRecords {
    pub dataset: Option<ExpectedDataset>,
    pub files: Vec<ExpectedFile>,
    /// Some member had no readable dataset descriptor. Set in every mode.
    pub deleted: bool,
}

/// Accumulates per-version results for one chain.
#[derive(Debug, Default)]
struct ExpectedFold {
    files: Vec<ExpectedFile>,
    /// Highest duplicate counter used per (expected_path, removed_original_directory).
    used: HashMap<(String, bool), u32>,
    deleted: bool,
    latest: Option<DatasetDescriptor>,
}

impl ExpectedFold {
    fn push(&mut self, mut file: ExpectedFile) {
        let key = (file.expected_path.clone(), file.removed_original_directory);
        let count = match self.used.get(&key) {
            Some(previous) => previous + 1,
            None => 0,
        };
        self.used.insert(key, count);
        file.removed_duplicate_file_count = count;
        self.files.push(file);
    }
}

/// Reconciles archival identifiers into expected records.
pub struct Reconciler<F, S> {
    fetcher: F,
    store: S,
    options: ReconcileOptions,
    accounts: AccountSubstitutes,
    resolution_time: Option<DateTime<Utc>>,
}

impl<F: MetadataFetcher, S: ExpectedStore> Reconciler<F, S> {
    pub fn new(fetcher: F, store: S, options: ReconcileOptions) -> Self {
        Self {
            fetcher,
            store,
            options,
            accounts: AccountSubstitutes::default(),
            resolution_time: None,
        }
    }

    pub fn with_account_substitutes(mut self, accounts: AccountSubstitutes) -> Self {
        self.accounts = accounts;
        self
    }

    /// Fix the instant embargo dates are compared against (defaults to now).
    pub fn with_resolution_time(mut self, at: DateTime<Utc>) -> Self {
        self.resolution_time = Some(at);
        self
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Reconcile one identifier and replace its records in the store.
    pub async fn reconcile(&self, bag_id: &str) -> ReconcileResult<ReconcileOutcome> {
        let span = info_span!("reconcile", bag_id = %bag_id, mode = ?self.options.mode);
        self.reconcile_in_span(bag_id).instrument(span).await
    }

    async fn reconcile_in_span(&self, bag_id: &str) -> ReconcileResult<ReconcileOutcome> {
        let chain = match BagChainResolver::new(&self.fetcher).resolve(bag_id).await? {
            ChainResolution::NotFound => return Ok(ReconcileOutcome::Skipped(SkipReason::NotFound)),
            ChainResolution::OtherVersion { base_id } => {
                return Ok(ReconcileOutcome::Skipped(SkipReason::OtherVersion { base_id }))
            }
            ChainResolution::Chain(chain) => chain,
        };

        let records = self.build(&chain).await?;
        self.persist(chain.doi(), &records)?;

        let summary = ReconcileSummary {
            doi: chain.doi().to_string(),
            versions: chain.len(),
            files: records.files.len(),
        };
        let deleted = records.deleted;
        info!(
            doi = %summary.doi,
            versions = summary.versions,
            files = summary.files,
            deleted,
            "reconciled"
        );
        Ok(if deleted {
            ReconcileOutcome::Deleted(summary)
        } else {
            ReconcileOutcome::Resolved(summary)
        })
    }

    /// Build the expected records of a resolved chain without touching the store.
    pub async fn build(&self, chain: &BagChain) -> ReconcileResult<ExpectedRecords> {
        let now = self.resolution_time.unwrap_or_else(Utc::now);
        // chains are only built from a base bag, and the base bag's DOI names the dataset
        let doi = chain.doi();
        let mut fold = ExpectedFold::default();

        for (ordinal, member) in chain.members.iter().enumerate() {
            trace!(ordinal, bag_id = %member.bag_id, "from sequence");
            self.process_version(doi, &member.bag_id, ordinal as u32, now, &mut fold)
                .await?;
        }

        let dataset = if self.options.mode.do_datasets() {
            let depositor = self.read_depositor(&chain.origin.bag_id).await?;
            let (license_url, access_category, embargo_date) = match &fold.latest {
                Some(d) => (
                    Some(d.license_url.clone()),
                    Some(d.rights.access_category.as_str().to_string()),
                    d.rights.embargo_date.clone(),
                ),
                None => (None, None, None),
            };
            Some(ExpectedDataset {
                doi: doi.to_string(),
                depositor,
                citation_year: chain.citation_year(),
                license_url,
                access_category,
                embargo_date,
                expected_version_count: chain.len() as u32,
                deleted: fold.deleted,
            })
        } else {
            None
        };

        Ok(ExpectedRecords {
            dataset,
            files: fold.files,
            deleted: fold.deleted,
        })
    }

    async fn process_version(
        &self,
        doi: &str,
        bag_id: &str,
        ordinal: u32,
        now: DateTime<Utc>,
        fold: &mut ExpectedFold,
    ) -> ReconcileResult<()> {
        let ddm = self
            .fetcher
            .bag_artifact(bag_id, BagArtifact::DatasetXml)
            .await?;
        if ddm.trim().is_empty() {
            // presuming deactivated; the bag store logs tell whether it was
            warn!(bag_id = %bag_id, ordinal, "no dataset descriptor, marking dataset deleted");
            fold.deleted = true;
            return Ok(());
        }
        let descriptor = match rights::parse_dataset_descriptor(&ddm, now) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(
                    bag_id = %bag_id,
                    ordinal,
                    error = %e,
                    "unreadable dataset descriptor, marking dataset deleted"
                );
                fold.deleted = true;
                return Ok(());
            }
        };

        if self.options.mode.do_files() {
            let defaults = descriptor.rights.default_file_rights();
            let files_xml = self
                .fetcher
                .bag_artifact(bag_id, BagArtifact::FilesXml)
                .await?;
            let file_rights = rights::parse_file_rights(bag_id, &files_xml)?;
            let manifest = self
                .fetcher
                .bag_artifact(bag_id, BagArtifact::Manifest)
                .await?;
            let entries = parse_manifest(bag_id, &manifest)?;
            debug!(bag_id = %bag_id, ordinal, files = entries.len(), "manifest read");

            for entry in &entries {
                let own = file_rights.get(&entry.path).ok_or_else(|| {
                    ReconcileError::MissingFileRightsEntry {
                        bag_id: bag_id.to_string(),
                        path: entry.path.clone(),
                    }
                })?;
                let rights = own.clone().apply_defaults(&defaults);
                trace!(path = %entry.path, rights = ?rights, "resolved file rights");
                fold.push(self.expected_file(doi, ordinal, entry, rights));
            }
            for name in MIGRATION_FILES {
                fold.push(ExpectedFile::migration_file(
                    doi,
                    name,
                    ordinal,
                    defaults.clone(),
                ));
            }
        }

        fold.latest = Some(descriptor);
        Ok(())
    }

    fn expected_file(
        &self,
        doi: &str,
        ordinal: u32,
        entry: &ManifestEntry,
        rights: FileRights,
    ) -> ExpectedFile {
        let payload_path = entry
            .path
            .strip_prefix(PAYLOAD_DIR)
            .unwrap_or(&entry.path);
        let normalized = paths::normalize(payload_path, self.options.remove_original_directory);
        ExpectedFile {
            doi: doi.to_string(),
            expected_path: normalized.expected_path,
            removed_duplicate_file_count: 0,
            removed_original_directory: normalized.removed_original_directory,
            source_path: entry.path.clone(),
            sha1_checksum: entry.sha1.clone(),
            version_ordinal: ordinal,
            rights,
            added_during_migration: false,
            removed_thumbnail: normalized.removed_thumbnail,
            transformed_name: normalized.transformed,
        }
    }

    async fn read_depositor(&self, bag_id: &str) -> ReconcileResult<String> {
        let bag_info = self
            .fetcher
            .bag_artifact(bag_id, BagArtifact::BagInfo)
            .await?;
        let account = parse_depositor(bag_id, &bag_info)?;
        let depositor = self.accounts.substitute(&account);
        if depositor != account {
            debug!(account = %account, substitute = %depositor, "substituted depositor");
        }
        Ok(depositor.to_string())
    }

    /// Delete whatever `mode` rebuilds for `doi`, then insert `records`, atomically.
    fn persist(&self, doi: &str, records: &ExpectedRecords) -> ReconcileResult<()> {
        let mode = self.options.mode;
        self.store.transaction(&mut |session| {
            session.delete_by_doi(doi, mode)?;
            if let Some(dataset) = &records.dataset {
                session.save_expected_dataset(dataset)?;
            }
            for file in &records.files {
                session.save_expected_file(file)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, original: bool) -> ExpectedFile {
        let mut f = ExpectedFile::migration_file("d", "x", 0, FileRights::default());
        f.expected_path = path.to_string();
        f.removed_original_directory = original;
        f
    }

    #[test]
    fn test_fold_counts_duplicates_per_key() {
        let mut fold = ExpectedFold::default();
        fold.push(file("a.txt", false));
        fold.push(file("b.txt", false));
        fold.push(file("a.txt", false));
        fold.push(file("a.txt", true));
        fold.push(file("a.txt", false));

        let counts: Vec<(String, bool, u32)> = fold
            .files
            .iter()
            .map(|f| {
                (
                    f.expected_path.clone(),
                    f.removed_original_directory,
                    f.removed_duplicate_file_count,
                )
            })
            .collect();
        assert_eq!(
            counts,
            vec![
                ("a.txt".into(), false, 0),
                ("b.txt".into(), false, 0),
                ("a.txt".into(), false, 1),
                ("a.txt".into(), true, 0),
                ("a.txt".into(), false, 2),
            ]
        );
    }

    #[test]
    fn test_options_builder() {
        let options = ReconcileOptions::new(Mode::Files).with_remove_original_directory(true);
        assert_eq!(options.mode, Mode::Files);
        assert!(options.remove_original_directory);
    }
}
