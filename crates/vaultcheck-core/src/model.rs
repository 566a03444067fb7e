//! Plain data records for bag versions, rights and expected state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ReconcileError;

/// Which record kinds a reconciliation produces (and replaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Datasets,
    Files,
    #[default]
    Both,
}

impl Mode {
    pub fn do_datasets(self) -> bool {
        matches!(self, Mode::Datasets | Mode::Both)
    }

    pub fn do_files(self) -> bool {
        matches!(self, Mode::Files | Mode::Both)
    }
}

/// Identity of one bag in a version chain, as reported by the bag index.
///
/// `bag_id == base_id` marks the first member of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagVersionInfo {
    #[serde(rename = "bag-id", alias = "bagId")]
    pub bag_id: String,
    #[serde(rename = "base-id", alias = "baseId")]
    pub base_id: String,
    pub created: String,
    pub doi: String,
}

impl BagVersionInfo {
    pub fn is_base(&self) -> bool {
        self.bag_id == self.base_id
    }
}

/// One line of a bag's `manifest-sha1.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Bag-relative path, normally starting with `data/`.
    pub path: String,
    pub sha1: String,
}

/// Dataset-level access category from the dataset descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccessCategory {
    OpenAccess,
    OpenAccessForRegisteredUsers,
    RequestPermission,
    NoAccess,
    /// A value outside the known set; treated like `NoAccess`.
    Unrecognized(String),
}

impl AccessCategory {
    /// Parse a category value. Never fails: unknown values are kept verbatim
    /// in [`AccessCategory::Unrecognized`] and reported.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "OPEN_ACCESS" => Self::OpenAccess,
            "OPEN_ACCESS_FOR_REGISTERED_USERS" => Self::OpenAccessForRegisteredUsers,
            "REQUEST_PERMISSION" => Self::RequestPermission,
            "NO_ACCESS" => Self::NoAccess,
            other => {
                warn!(category = %other, "dataset access category not known, using NONE");
                Self::Unrecognized(other.to_string())
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenAccess => "OPEN_ACCESS",
            Self::OpenAccessForRegisteredUsers => "OPEN_ACCESS_FOR_REGISTERED_USERS",
            Self::RequestPermission => "REQUEST_PERMISSION",
            Self::NoAccess => "NO_ACCESS",
            Self::Unrecognized(value) => value,
        }
    }

    /// Default `(accessible_to, visible_to)` for files of a dataset in this category.
    pub fn default_access(&self) -> (FileAccess, FileAccess) {
        match self {
            Self::OpenAccess => (FileAccess::Anonymous, FileAccess::Anonymous),
            Self::OpenAccessForRegisteredUsers => (FileAccess::Known, FileAccess::Known),
            Self::RequestPermission => {
                (FileAccess::RestrictedRequest, FileAccess::RestrictedRequest)
            }
            Self::NoAccess | Self::Unrecognized(_) => (FileAccess::None, FileAccess::None),
        }
    }
}

impl fmt::Display for AccessCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may access or see a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileAccess {
    Anonymous,
    Known,
    RestrictedRequest,
    RestrictedGroup,
    None,
}

impl FileAccess {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "ANONYMOUS",
            Self::Known => "KNOWN",
            Self::RestrictedRequest => "RESTRICTED_REQUEST",
            Self::RestrictedGroup => "RESTRICTED_GROUP",
            Self::None => "NONE",
        }
    }
}

impl FromStr for FileAccess {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ANONYMOUS" => Ok(Self::Anonymous),
            "KNOWN" => Ok(Self::Known),
            "RESTRICTED_REQUEST" => Ok(Self::RestrictedRequest),
            "RESTRICTED_GROUP" => Ok(Self::RestrictedGroup),
            "NONE" => Ok(Self::None),
            other => Err(ReconcileError::UnknownRightsValue {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FileAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rights of a single file. Fields stay `None` until defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRights {
    pub accessible_to: Option<FileAccess>,
    pub visible_to: Option<FileAccess>,
    pub embargo_date: Option<String>,
}

impl FileRights {
    /// Fill every unset field from `defaults`; set fields win.
    pub fn apply_defaults(mut self, defaults: &FileRights) -> Self {
        if self.accessible_to.is_none() {
            self.accessible_to = defaults.accessible_to;
        }
        if self.visible_to.is_none() {
            self.visible_to = defaults.visible_to;
        }
        if self.embargo_date.is_none() {
            self.embargo_date.clone_from(&defaults.embargo_date);
        }
        self
    }
}

/// Expected state of one file after migration.
///
/// Identity within the store is `(doi, expected_path, removed_duplicate_file_count,
/// removed_original_directory)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedFile {
    pub doi: String,
    pub expected_path: String,
    pub removed_duplicate_file_count: u32,
    pub removed_original_directory: bool,
    /// Path as listed in the bag manifest; empty for files added during migration.
    pub source_path: String,
    pub sha1_checksum: String,
    pub version_ordinal: u32,
    pub rights: FileRights,
    pub added_during_migration: bool,
    pub removed_thumbnail: bool,
    pub transformed_name: bool,
}

impl ExpectedFile {
    /// Directory that holds the files generated by the migration itself.
    pub const MIGRATION_DIR: &'static str = "easy-migration";

    /// A file that does not exist in the bag but is generated during migration.
    pub fn migration_file(doi: &str, name: &str, version_ordinal: u32, rights: FileRights) -> Self {
        Self {
            doi: doi.to_string(),
            expected_path: format!("{}/{}", Self::MIGRATION_DIR, name),
            removed_duplicate_file_count: 0,
            removed_original_directory: false,
            source_path: String::new(),
            sha1_checksum: String::new(),
            version_ordinal,
            rights,
            added_during_migration: true,
            removed_thumbnail: false,
            transformed_name: false,
        }
    }
}

/// Expected state of a dataset after migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedDataset {
    pub doi: String,
    pub depositor: String,
    pub citation_year: String,
    pub license_url: Option<String>,
    pub access_category: Option<String>,
    pub embargo_date: Option<String>,
    pub expected_version_count: u32,
    /// The archived object could not be resolved; presumed deactivated.
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            AccessCategory::parse("OPEN_ACCESS").default_access(),
            (FileAccess::Anonymous, FileAccess::Anonymous)
        );
        assert_eq!(
            AccessCategory::parse("OPEN_ACCESS_FOR_REGISTERED_USERS").default_access(),
            (FileAccess::Known, FileAccess::Known)
        );
        assert_eq!(
            AccessCategory::parse("REQUEST_PERMISSION").default_access(),
            (FileAccess::RestrictedRequest, FileAccess::RestrictedRequest)
        );
        assert_eq!(
            AccessCategory::parse("NO_ACCESS").default_access(),
            (FileAccess::None, FileAccess::None)
        );
    }

    #[test]
    fn test_unrecognized_category_keeps_value() {
        let category = AccessCategory::parse("GROUP_ACCESS");
        assert_eq!(category, AccessCategory::Unrecognized("GROUP_ACCESS".into()));
        assert_eq!(category.as_str(), "GROUP_ACCESS");
        assert_eq!(category.default_access(), (FileAccess::None, FileAccess::None));
    }

    #[test]
    fn test_file_access_rejects_unknown() {
        assert_eq!("KNOWN".parse::<FileAccess>().unwrap(), FileAccess::Known);
        assert!(matches!(
            "EVERYONE".parse::<FileAccess>(),
            Err(ReconcileError::UnknownRightsValue { .. })
        ));
    }

    #[test]
    fn test_apply_defaults_prefers_own_values() {
        let defaults = FileRights {
            accessible_to: Some(FileAccess::Known),
            visible_to: Some(FileAccess::Known),
            embargo_date: Some("2062-02-14".into()),
        };
        let own = FileRights {
            accessible_to: Some(FileAccess::None),
            visible_to: None,
            embargo_date: None,
        };
        let resolved = own.apply_defaults(&defaults);
        assert_eq!(resolved.accessible_to, Some(FileAccess::None));
        assert_eq!(resolved.visible_to, Some(FileAccess::Known));
        assert_eq!(resolved.embargo_date.as_deref(), Some("2062-02-14"));
    }

    #[test]
    fn test_mode_flags() {
        assert!(Mode::Both.do_datasets() && Mode::Both.do_files());
        assert!(Mode::Datasets.do_datasets() && !Mode::Datasets.do_files());
        assert!(!Mode::Files.do_datasets() && Mode::Files.do_files());
    }

    #[test]
    fn test_migration_file_path() {
        let file = ExpectedFile::migration_file("10.5072/x", "files.xml", 2, FileRights::default());
        assert_eq!(file.expected_path, "easy-migration/files.xml");
        assert!(file.added_during_migration);
        assert_eq!(file.version_ordinal, 2);
    }
}
