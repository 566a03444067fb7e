//! Scripted bag store / bag index for reconciler tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use vaultcheck_core::{BagArtifact, FetchError, FetchResult, MetadataFetcher};

pub const DOI: &str = "10.5072/dans-test-001";

/// One bag as the scripted services will serve it.
#[derive(Debug, Clone)]
pub struct TestBag {
    pub bag_id: String,
    pub base_id: String,
    pub created: String,
    pub dataset_xml: String,
    pub files_xml: String,
    pub manifest: String,
    pub bag_info: String,
}

impl TestBag {
    pub fn new(bag_id: &str, base_id: &str, created: &str) -> Self {
        Self {
            bag_id: bag_id.to_string(),
            base_id: base_id.to_string(),
            created: created.to_string(),
            dataset_xml: ddm("OPEN_ACCESS", None),
            files_xml: files_xml(&[]),
            manifest: String::new(),
            bag_info: "Bagging-Date: 2017-05-01\nEASY-User-Account: user001\n".to_string(),
        }
    }

    pub fn dataset_xml(mut self, xml: impl Into<String>) -> Self {
        self.dataset_xml = xml.into();
        self
    }

    /// Manifest and matching file rights in one go: `(path, accessible_to, visible_to)`.
    pub fn files(mut self, files: &[(&str, Option<&str>, Option<&str>)]) -> Self {
        self.files_xml = files_xml(files);
        self.manifest = files
            .iter()
            .enumerate()
            .map(|(i, (path, _, _))| format!("{:040x}  {}\n", i + 1, path))
            .collect();
        self
    }

    pub fn manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    pub fn bag_info(mut self, bag_info: impl Into<String>) -> Self {
        self.bag_info = bag_info.into();
        self
    }
}

#[derive(Default)]
pub struct ScriptedFetcher {
    index: HashMap<String, String>,
    sequences: HashMap<String, String>,
    artifacts: HashMap<(String, BagArtifact), String>,
    failing: HashSet<(String, BagArtifact)>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bag(mut self, bag: TestBag) -> Self {
        self.index.insert(
            bag.bag_id.clone(),
            index_entry(&bag.bag_id, &bag.base_id, &bag.created, DOI),
        );
        for (artifact, body) in [
            (BagArtifact::DatasetXml, bag.dataset_xml),
            (BagArtifact::FilesXml, bag.files_xml),
            (BagArtifact::Manifest, bag.manifest),
            (BagArtifact::BagInfo, bag.bag_info),
        ] {
            self.artifacts.insert((bag.bag_id.clone(), artifact), body);
        }
        self
    }

    /// Serve `members` as the sequence of every one of them.
    pub fn with_sequence(mut self, members: &[&str]) -> Self {
        let body = members.join("\n");
        for member in members {
            self.sequences.insert(member.to_string(), body.clone());
        }
        self
    }

    pub fn failing(mut self, bag_id: &str, artifact: BagArtifact) -> Self {
        self.failing.insert((bag_id.to_string(), artifact));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataFetcher for ScriptedFetcher {
    async fn bag_index_entry(&self, bag_id: &str) -> FetchResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.index.get(bag_id).cloned().unwrap_or_default())
    }

    async fn bag_sequence(&self, bag_id: &str) -> FetchResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sequences.get(bag_id).cloned().unwrap_or_default())
    }

    async fn bag_artifact(&self, bag_id: &str, artifact: BagArtifact) -> FetchResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (bag_id.to_string(), artifact);
        if self.failing.contains(&key) {
            return Err(FetchError::Network {
                message: format!("connection reset fetching {}", artifact.path()),
            });
        }
        Ok(self.artifacts.get(&key).cloned().unwrap_or_default())
    }
}

pub fn index_entry(bag_id: &str, base_id: &str, created: &str, doi: &str) -> String {
    serde_json::json!({
        "result": {
            "bag-info": {
                "bag-id": bag_id,
                "base-id": base_id,
                "created": created,
                "doi": doi,
            }
        }
    })
    .to_string()
}

pub fn ddm(access: &str, available: Option<&str>) -> String {
    let available = available
        .map(|a| format!("<ddm:available>{a}</ddm:available>"))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ddm:DDM xmlns:ddm="http://easy.dans.knaw.nl/schemas/md/ddm/">
  <ddm:profile>
    {available}
    <ddm:accessRights>{access}</ddm:accessRights>
  </ddm:profile>
</ddm:DDM>"#
    )
}

pub fn files_xml(files: &[(&str, Option<&str>, Option<&str>)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<files xmlns="http://easy.dans.knaw.nl/schemas/bag/metadata/files/">
"#,
    );
    for (path, accessible, visible) in files {
        xml.push_str(&format!("  <file filepath=\"{}\">\n", escape(path)));
        if let Some(a) = accessible {
            xml.push_str(&format!("    <accessibleToRights>{a}</accessibleToRights>\n"));
        }
        if let Some(v) = visible {
            xml.push_str(&format!("    <visibleToRights>{v}</visibleToRights>\n"));
        }
        xml.push_str("  </file>\n");
    }
    xml.push_str("</files>\n");
    xml
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
