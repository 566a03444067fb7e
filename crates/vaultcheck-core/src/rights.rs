//! Dataset and file rights resolution.
//!
//! The dataset descriptor (`metadata/dataset.xml`) provides the access
//! category, an optional embargo date and an optional license. The file-rights
//! descriptor (`metadata/files.xml`) may override access and visibility per path.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::{ReconcileError, ReconcileResult};
use crate::model::{AccessCategory, FileAccess, FileRights};

/// License of open-access datasets without an explicit license.
pub const CC0_LICENSE: &str = "http://creativecommons.org/publicdomain/zero/1.0";

/// License of all other datasets without an explicit license.
pub const DANS_LICENSE: &str =
    "https://dans.knaw.nl/en/about/organisation-and-policy/legal-information/DANSLicence.pdf";

/// Dataset-level rights: category, the file defaults it implies, and a live embargo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRights {
    pub access_category: AccessCategory,
    pub default_accessible_to: FileAccess,
    pub default_visible_to: FileAccess,
    pub embargo_date: Option<String>,
}

impl DatasetRights {
    pub fn new(access_category: AccessCategory, embargo_date: Option<String>) -> Self {
        let (default_accessible_to, default_visible_to) = access_category.default_access();
        Self {
            access_category,
            default_accessible_to,
            default_visible_to,
            embargo_date,
        }
    }

    /// Defaults for files without their own rights.
    pub fn default_file_rights(&self) -> FileRights {
        FileRights {
            accessible_to: Some(self.default_accessible_to),
            visible_to: Some(self.default_visible_to),
            embargo_date: self.embargo_date.clone(),
        }
    }
}

/// What the reconciler needs from one dataset descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub rights: DatasetRights,
    pub license_url: String,
}

/// Why a dataset descriptor could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("not well-formed: {0}")]
    Xml(String),
    #[error("no accessRights element")]
    MissingAccessRights,
}

/// Parse a dataset descriptor. Embargo dates not after `now` are dropped.
pub fn parse_dataset_descriptor(
    xml: &str,
    now: DateTime<Utc>,
) -> Result<DatasetDescriptor, DescriptorError> {
    let doc = Document::parse(xml).map_err(|e| DescriptorError::Xml(e.to_string()))?;

    // The profile's accessRights is authoritative; dcmiMetadata may repeat it.
    let profile = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "profile");
    let access_rights = profile
        .and_then(|p| child_text(p, "accessRights"))
        .or_else(|| first_text(&doc, "accessRights"))
        .ok_or(DescriptorError::MissingAccessRights)?;
    let access_category = AccessCategory::parse(&access_rights);

    let available = profile
        .and_then(|p| child_text(p, "available"))
        .or_else(|| first_text(&doc, "available"));
    let embargo_date = available.and_then(|raw| resolve_embargo(&raw, now));

    let license_url = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "license")
        .filter_map(|n| n.text().map(str::trim))
        .find(|text| text.starts_with("http://") || text.starts_with("https://"))
        .map(String::from)
        .unwrap_or_else(|| default_license(&access_category).to_string());

    Ok(DatasetDescriptor {
        rights: DatasetRights::new(access_category, embargo_date),
        license_url,
    })
}

/// License implied by the access category when the descriptor names none.
pub fn default_license(category: &AccessCategory) -> &'static str {
    match category {
        AccessCategory::OpenAccess => CC0_LICENSE,
        _ => DANS_LICENSE,
    }
}

/// Keep `raw` only if it is a valid date or timestamp strictly after `now`.
///
/// The value is returned verbatim (trimmed); anything else resolves to `None`.
pub fn resolve_embargo(raw: &str, now: DateTime<Utc>) -> Option<String> {
    let value = raw.trim().trim_matches('"').trim();
    if value.is_empty() {
        return None;
    }
    let in_future = if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        date > now.date_naive()
    } else if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        timestamp.with_timezone(&Utc) > now
    } else {
        debug!(embargo = %value, "ignoring unparseable embargo date");
        return None;
    };
    if in_future {
        Some(value.to_string())
    } else {
        debug!(embargo = %value, "embargo already lapsed");
        None
    }
}

/// Parse a file-rights descriptor into per-path overrides.
///
/// Empty or absent rights elements stay `None`; unknown values are an error.
pub fn parse_file_rights(bag_id: &str, xml: &str) -> ReconcileResult<HashMap<String, FileRights>> {
    if xml.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let doc = Document::parse(xml).map_err(|e| ReconcileError::MalformedFileRights {
        bag_id: bag_id.to_string(),
        reason: e.to_string(),
    })?;

    let mut rights = HashMap::new();
    for file in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "file")
    {
        let Some(path) = file.attribute("filepath") else {
            return Err(ReconcileError::MalformedFileRights {
                bag_id: bag_id.to_string(),
                reason: "file element without filepath".to_string(),
            });
        };
        let entry = FileRights {
            accessible_to: access_value(file, "accessibleToRights")?,
            visible_to: access_value(file, "visibleToRights")?,
            embargo_date: None,
        };
        rights.insert(path.to_string(), entry);
    }
    Ok(rights)
}

fn access_value(file: Node<'_, '_>, name: &str) -> ReconcileResult<Option<FileAccess>> {
    child_text(file, name)
        .filter(|value| !value.is_empty())
        .map(|value| value.parse::<FileAccess>())
        .transpose()
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .map(|n| n.text().unwrap_or_default().trim().to_string())
}

fn first_text(doc: &Document<'_>, name: &str) -> Option<String> {
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .map(|n| n.text().unwrap_or_default().trim().to_string())
}
