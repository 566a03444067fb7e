//! Bag chain discovery and chronological ordering.

use std::cmp::Ordering;

use chrono::DateTime;
use tracing::{debug, info, trace};

use crate::error::ReconcileResult;
use crate::fetch::MetadataFetcher;
use crate::metadata::{parse_bag_index_entry, parse_bag_sequence};
use crate::model::BagVersionInfo;

/// Result of resolving one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainResolution {
    /// The identifier, or a member of its sequence, is not in the index.
    NotFound,
    /// The identifier is a later version of the chain starting at `base_id`.
    OtherVersion { base_id: String },
    /// The identifier leads a chain; members are in chronological order.
    Chain(BagChain),
}

/// A resolved version chain, oldest member first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagChain {
    /// Bag info of the identifier the resolution started from.
    pub origin: BagVersionInfo,
    /// All members, sorted by creation time. Never empty.
    pub members: Vec<BagVersionInfo>,
}

impl BagChain {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// DOI of the chain, as registered for the originating identifier.
    pub fn doi(&self) -> &str {
        &self.origin.doi
    }

    /// The chronologically first member.
    pub fn earliest(&self) -> &BagVersionInfo {
        self.members.first().unwrap_or(&self.origin)
    }

    /// First four characters of the earliest member's creation timestamp.
    pub fn citation_year(&self) -> String {
        self.earliest().created.chars().take(4).collect()
    }
}

/// Resolves identifiers into ordered bag chains using a [`MetadataFetcher`].
pub struct BagChainResolver<'a, F: ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: MetadataFetcher + ?Sized> BagChainResolver<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Look up one bag in the index; `None` when it is not there.
    pub async fn bag_info(&self, bag_id: &str) -> ReconcileResult<Option<BagVersionInfo>> {
        let body = self.fetcher.bag_index_entry(bag_id).await?;
        Ok(parse_bag_index_entry(bag_id, &body))
    }

    pub async fn resolve(&self, bag_id: &str) -> ReconcileResult<ChainResolution> {
        let Some(origin) = self.bag_info(bag_id).await? else {
            trace!(bag_id = %bag_id, "skipping: not found/parsed");
            return Ok(ChainResolution::NotFound);
        };
        trace!(bag_id = %bag_id, info = ?origin, "from input");

        if !origin.is_base() {
            info!(
                bag_id = %bag_id,
                base_id = %origin.base_id,
                "skipping, it is another version of the base bag"
            );
            return Ok(ChainResolution::OtherVersion {
                base_id: origin.base_id,
            });
        }

        let sequence = parse_bag_sequence(&self.fetcher.bag_sequence(bag_id).await?);
        if sequence.len() <= 1 {
            debug!(bag_id = %bag_id, "single version");
            return Ok(ChainResolution::Chain(BagChain {
                members: vec![origin.clone()],
                origin,
            }));
        }

        let mut members = Vec::with_capacity(sequence.len());
        for member_id in &sequence {
            match self.bag_info(member_id).await? {
                Some(info) => members.push(info),
                None => {
                    trace!(bag_id = %bag_id, member = %member_id, "sequence member not found");
                    return Ok(ChainResolution::NotFound);
                }
            }
        }
        sort_chronologically(&mut members, &origin.base_id);
        debug!(bag_id = %bag_id, versions = members.len(), "resolved chain");

        Ok(ChainResolution::Chain(BagChain { origin, members }))
    }
}

/// Sort by creation time ascending; on equal times the base member comes first.
///
/// Timestamps are compared as instants when both parse as RFC 3339, otherwise
/// as strings. Bag ids break any remaining tie so the order is total.
pub fn sort_chronologically(members: &mut [BagVersionInfo], base_id: &str) {
    members.sort_by(|a, b| {
        compare_created(&a.created, &b.created)
            .then_with(|| (b.bag_id == base_id).cmp(&(a.bag_id == base_id)))
            .then_with(|| a.bag_id.cmp(&b.bag_id))
    });
}

fn compare_created(a: &str, b: &str) -> Ordering {
    match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(bag_id: &str, created: &str) -> BagVersionInfo {
        BagVersionInfo {
            bag_id: bag_id.to_string(),
            base_id: "base".to_string(),
            created: created.to_string(),
            doi: "10.5072/x".to_string(),
        }
    }

    fn ids(members: &[BagVersionInfo]) -> Vec<&str> {
        members.iter().map(|m| m.bag_id.as_str()).collect()
    }

    #[test]
    fn test_sorts_out_of_order_members() {
        let mut members = vec![
            info("t2", "2019-01-01T00:00:00Z"),
            info("t0", "2017-01-01T00:00:00Z"),
            info("t1", "2018-01-01T00:00:00Z"),
        ];
        sort_chronologically(&mut members, "base");
        assert_eq!(ids(&members), vec!["t0", "t1", "t2"]);
    }

    #[test]
    fn test_base_wins_ties() {
        let mut members = vec![
            info("other", "2017-01-01T00:00:00Z"),
            info("base", "2017-01-01T00:00:00Z"),
        ];
        sort_chronologically(&mut members, "base");
        assert_eq!(ids(&members), vec!["base", "other"]);
    }

    #[test]
    fn test_compares_instants_across_offsets() {
        // 10:00+02:00 is 08:00Z, earlier than 09:00Z
        let mut members = vec![
            info("late", "2017-01-01T09:00:00Z"),
            info("early", "2017-01-01T10:00:00+02:00"),
        ];
        sort_chronologically(&mut members, "base");
        assert_eq!(ids(&members), vec!["early", "late"]);
    }

    #[test]
    fn test_citation_year_from_earliest() {
        let chain = BagChain {
            origin: info("base", "2019-03-01T00:00:00Z"),
            members: vec![
                info("a", "2016-01-01T00:00:00Z"),
                info("base", "2019-03-01T00:00:00Z"),
            ],
        };
        assert_eq!(chain.citation_year(), "2016");
        assert_eq!(chain.len(), 2);
    }
}
