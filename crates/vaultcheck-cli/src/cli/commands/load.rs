use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vaultcheck_bagstore::BagStoreClient;
use vaultcheck_core::{
    AccountSubstitutes, ReconcileOptions, ReconcileOutcome, ReconcileResult, Reconciler,
    SkipReason, SqliteStore,
};

use crate::cli::args::LoadFromVaultArgs;
use crate::config::Config;
use crate::exit_codes;

/// Per-run outcome counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub resolved: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Tally {
    fn record(&mut self, bag_id: &str, result: &ReconcileResult<ReconcileOutcome>) {
        match result {
            Ok(ReconcileOutcome::Resolved(_)) => self.resolved += 1,
            Ok(ReconcileOutcome::Deleted(summary)) => {
                info!(bag_id = %bag_id, doi = %summary.doi, "dataset presumed deleted");
                self.deleted += 1;
            }
            Ok(ReconcileOutcome::Skipped(reason)) => {
                match reason {
                    SkipReason::NotFound => debug!(bag_id = %bag_id, "skipped: not found"),
                    SkipReason::OtherVersion { base_id } => {
                        debug!(bag_id = %bag_id, base_id = %base_id, "skipped: not a base bag")
                    }
                }
                self.skipped += 1;
            }
            Err(e) => {
                error!(bag_id = %bag_id, error = %e, "reconciliation failed");
                self.failed += 1;
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            exit_codes::RECONCILE_FAILED
        } else {
            exit_codes::SUCCESS
        }
    }
}

pub async fn run(args: LoadFromVaultArgs) -> anyhow::Result<i32> {
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration failure");
            eprintln!("config error: {e}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let jobs = args.jobs.unwrap_or(config.jobs).max(1);

    let accounts = match &config.account_substitutes {
        Some(path) => AccountSubstitutes::load(path)
            .with_context(|| format!("account substitutes {}", path.display()))?,
        None => AccountSubstitutes::default(),
    };
    let identifiers = read_identifiers(&args.uuid_files)?;
    let client = BagStoreClient::new(config.bag_store.clone()).context("bag store client")?;
    let store = SqliteStore::open(&config.database)
        .with_context(|| format!("opening database {}", config.database.display()))?;

    let options = ReconcileOptions::new(args.mode.into())
        .with_remove_original_directory(config.remove_original_directory);
    let reconciler = Reconciler::new(client, store, options).with_account_substitutes(accounts);

    info!(
        identifiers = identifiers.len(),
        jobs,
        mode = ?options.mode,
        "loading expected records from vault"
    );

    let tally = reconcile_all(&reconciler, identifiers, jobs).await;

    info!(
        resolved = tally.resolved,
        deleted = tally.deleted,
        skipped = tally.skipped,
        failed = tally.failed,
        "done"
    );
    println!("{}", serde_json::to_string(&tally)?);
    Ok(tally.exit_code())
}

async fn reconcile_all(
    reconciler: &Reconciler<BagStoreClient, SqliteStore>,
    identifiers: Vec<String>,
    jobs: usize,
) -> Tally {
    let mut results = stream::iter(identifiers)
        .map(|bag_id| async move {
            let result = reconciler.reconcile(&bag_id).await;
            (bag_id, result)
        })
        .buffer_unordered(jobs);

    let mut tally = Tally::default();
    while let Some((bag_id, result)) = results.next().await {
        tally.record(&bag_id, &result);
    }
    tally
}

/// Bag identifiers from `paths`, one per line, first occurrence wins.
fn read_identifiers(paths: &[PathBuf]) -> anyhow::Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut identifiers = Vec::new();
    for path in paths {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading identifiers from {}", path.display()))?;
        for id in parse_identifiers(path, &content) {
            if seen.insert(id.clone()) {
                identifiers.push(id);
            }
        }
    }
    Ok(identifiers)
}

fn parse_identifiers(path: &Path, content: &str) -> Vec<String> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match Uuid::parse_str(line) {
                Ok(_) => Some(line.to_string()),
                Err(e) => {
                    warn!(
                        file = %path.display(),
                        line = idx + 1,
                        value = %line,
                        error = %e,
                        "skipping line that is not a UUID"
                    );
                    None
                }
            }
        })
        .collect()
}
