//! Parsers for the plain-text and JSON artifacts of the bag store and bag index.

use serde::Deserialize;
use tracing::{error, trace};

use crate::error::{ReconcileError, ReconcileResult};
use crate::model::{BagVersionInfo, ManifestEntry};

/// Key of the depositor account in `bag-info.txt`.
pub const DEPOSITOR_KEY: &str = "EASY-User-Account";

#[derive(Debug, Deserialize)]
struct BagIndexEnvelope {
    result: BagIndexResult,
}

#[derive(Debug, Deserialize)]
struct BagIndexResult {
    #[serde(rename = "bag-info", alias = "bagInfo")]
    bag_info: BagVersionInfo,
}

/// Parse the bag index response for one bag.
///
/// An empty body means the bag is unknown. A body that does not parse is
/// logged and treated the same way.
pub fn parse_bag_index_entry(bag_id: &str, body: &str) -> Option<BagVersionInfo> {
    if body.trim().is_empty() {
        trace!(bag_id = %bag_id, "bag not in index");
        return None;
    }
    match serde_json::from_str::<BagIndexEnvelope>(body) {
        Ok(envelope) => Some(envelope.result.bag_info),
        Err(e) => {
            error!(bag_id = %bag_id, error = %e, content = %body, "could not parse bag info");
            None
        }
    }
}

/// Parse a newline separated bag sequence, skipping blank lines.
pub fn parse_bag_sequence(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `manifest-sha1.txt`: one `<sha1> <path>` pair per line.
///
/// The path is everything after the first run of whitespace, so paths may
/// contain spaces.
pub fn parse_manifest(bag_id: &str, body: &str) -> ReconcileResult<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parsed = line
            .split_once(char::is_whitespace)
            .map(|(sha1, path)| (sha1.trim(), path.trim_start()))
            .filter(|(sha1, path)| !sha1.is_empty() && !path.is_empty());
        let Some((sha1, path)) = parsed else {
            return Err(ReconcileError::MalformedManifest {
                bag_id: bag_id.to_string(),
                line: idx + 1,
                content: line.to_string(),
            });
        };
        entries.push(ManifestEntry {
            path: path.trim_end_matches('\r').to_string(),
            sha1: sha1.to_string(),
        });
    }
    Ok(entries)
}

/// Extract the depositor account from `bag-info.txt`.
///
/// The account is whatever follows the last `:` on the line.
pub fn parse_depositor(bag_id: &str, body: &str) -> ReconcileResult<String> {
    body.lines()
        .filter(|line| {
            line.split_once(':')
                .is_some_and(|(key, _)| key.trim() == DEPOSITOR_KEY)
        })
        .find_map(|line| line.rsplit_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .filter(|account| !account.is_empty())
        .ok_or_else(|| ReconcileError::MissingDepositor {
            bag_id: bag_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bag_index_entry() {
        let body = r#"{"result":{"bag-info":{"bag-id":"a1","base-id":"a0","created":"2017-05-01T10:00:00.000+02:00","doi":"10.5072/dans-x"}}}"#;
        let info = parse_bag_index_entry("a1", body).unwrap();
        assert_eq!(info.bag_id, "a1");
        assert_eq!(info.base_id, "a0");
        assert_eq!(info.doi, "10.5072/dans-x");
        assert!(!info.is_base());
    }

    #[test]
    fn test_parse_bag_index_entry_camel_case() {
        let body = r#"{"result":{"bagInfo":{"bagId":"a1","baseId":"a1","created":"2017","doi":"d"}}}"#;
        assert!(parse_bag_index_entry("a1", body).unwrap().is_base());
    }

    #[test]
    fn test_bag_index_not_found_or_garbage() {
        assert_eq!(parse_bag_index_entry("a1", ""), None);
        assert_eq!(parse_bag_index_entry("a1", "  \n"), None);
        assert_eq!(parse_bag_index_entry("a1", "<html>oops</html>"), None);
        assert_eq!(parse_bag_index_entry("a1", r#"{"result":{}}"#), None);
    }

    #[test]
    fn test_parse_bag_sequence() {
        assert_eq!(parse_bag_sequence("a\nb\r\n\nc\n"), vec!["a", "b", "c"]);
        assert!(parse_bag_sequence("").is_empty());
    }

    #[test]
    fn test_parse_manifest() {
        let body = "da39a3ee5e6b4b0d3255bfef95601890afd80709  data/a b.txt\r\n\n0123  data/c.txt\n";
        let entries = parse_manifest("bag", body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "data/a b.txt");
        assert_eq!(entries[0].sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(entries[1].path, "data/c.txt");
    }

    #[test]
    fn test_parse_manifest_rejects_line_without_path() {
        let result = parse_manifest("bag", "abc  data/x\nlonely\n");
        match result {
            Err(ReconcileError::MalformedManifest { line, content, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "lonely");
            }
            other => panic!("expected MalformedManifest, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_depositor() {
        let body = "Bagging-Date: 2017-05-01\nEASY-User-Account: user001\nPayload-Oxum: 1.2\n";
        assert_eq!(parse_depositor("bag", body).unwrap(), "user001");
    }

    #[test]
    fn test_depositor_after_last_colon() {
        let body = "EASY-User-Account: legacy:user002\n";
        assert_eq!(parse_depositor("bag", body).unwrap(), "user002");
    }

    #[test]
    fn test_missing_depositor() {
        assert!(matches!(
            parse_depositor("bag", "Bagging-Date: 2017-05-01\n"),
            Err(ReconcileError::MissingDepositor { .. })
        ));
    }
}
