//! Error types for reconciliation.
//!
//! Only hard failures live here. Soft outcomes (identifier not found, another
//! version of a chain, unreadable dataset descriptor) are reported through
//! [`crate::ReconcileOutcome`] and the `deleted` flag instead.

use crate::fetch::FetchError;
use crate::store::StoreError;

/// Hard failures that abort the reconciliation of one identifier.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A required artifact could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A manifest path has no entry in the bag's file-rights descriptor.
    #[error("no file rights for {path} in bag {bag_id}")]
    MissingFileRightsEntry { bag_id: String, path: String },

    /// A manifest line could not be split into checksum and path.
    #[error("malformed manifest line {line} in bag {bag_id}: {content:?}")]
    MalformedManifest {
        bag_id: String,
        line: usize,
        content: String,
    },

    /// The file-rights descriptor is not well-formed.
    #[error("malformed file rights in bag {bag_id}: {reason}")]
    MalformedFileRights { bag_id: String, reason: String },

    /// A rights value outside the known set.
    #[error("unknown rights value: {value:?}")]
    UnknownRightsValue { value: String },

    /// `bag-info.txt` has no depositor account.
    #[error("no EASY-User-Account in bag-info.txt of {bag_id}")]
    MissingDepositor { bag_id: String },

    /// The store rejected the delete/insert sequence.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for reconciliation.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
