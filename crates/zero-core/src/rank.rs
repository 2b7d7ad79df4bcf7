use crate::error::{Result, ZeroError};
use crate::filter::FilterSpec;
use crate::types::{GraphNode, NodeId, VoteAggregate};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    NetInclusionVotes,
    TotalInclusionVotes,
    DateCreated,
    NetContentVotes,
    TotalContentVotes,
    CategoryOverlap,
    ParticipantCount,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::NetInclusionVotes,
        SortKey::TotalInclusionVotes,
        SortKey::DateCreated,
        SortKey::NetContentVotes,
        SortKey::TotalContentVotes,
        SortKey::CategoryOverlap,
        SortKey::ParticipantCount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::NetInclusionVotes => "netInclusionVotes",
            SortKey::TotalInclusionVotes => "totalInclusionVotes",
            SortKey::DateCreated => "dateCreated",
            SortKey::NetContentVotes => "netContentVotes",
            SortKey::TotalContentVotes => "totalContentVotes",
            SortKey::CategoryOverlap => "categoryOverlap",
            SortKey::ParticipantCount => "participantCount",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| ZeroError::validation(format!("unknown sort key '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(ZeroError::validation(format!(
                "sort direction must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// `categoryOverlap` only has meaning against an active category filter.
    pub fn validate(&self, filter: &FilterSpec) -> Result<()> {
        if self.key == SortKey::CategoryOverlap && !filter.categories.is_active() {
            return Err(ZeroError::validation(
                "sort key 'categoryOverlap' requires a category filter",
            ));
        }
        Ok(())
    }
}

/// Content aggregate, or the inclusion aggregate for types without a
/// content axis.
fn content_or_inclusion(node: &GraphNode) -> VoteAggregate {
    node.votes.content.unwrap_or(node.votes.inclusion)
}

fn category_overlap(node: &GraphNode, active: &[NodeId]) -> usize {
    active.iter().filter(|id| node.has_category(id)).count()
}

fn compare(a: &GraphNode, b: &GraphNode, key: SortKey) -> Ordering {
    match key {
        SortKey::NetInclusionVotes => a.votes.inclusion.net().cmp(&b.votes.inclusion.net()),
        SortKey::TotalInclusionVotes => a.votes.inclusion.total().cmp(&b.votes.inclusion.total()),
        SortKey::DateCreated => a.created_at.cmp(&b.created_at),
        SortKey::NetContentVotes => content_or_inclusion(a).net().cmp(&content_or_inclusion(b).net()),
        SortKey::TotalContentVotes => {
            content_or_inclusion(a).total().cmp(&content_or_inclusion(b).total())
        }
        SortKey::ParticipantCount => a.participant_count.cmp(&b.participant_count),
        SortKey::CategoryOverlap => Ordering::Equal,
    }
}

/// Order `nodes` by `spec`. Equal keys fall back to node id ascending.
///
/// `categoryOverlap` ranks by how many of `active_categories` each node
/// holds, always most-overlap first, then by net inclusion descending.
pub fn sort(mut nodes: Vec<GraphNode>, spec: &SortSpec, active_categories: &[NodeId]) -> Vec<GraphNode> {
    match spec.key {
        SortKey::CategoryOverlap => {
            nodes.sort_by_cached_key(|n| {
                (
                    Reverse(category_overlap(n, active_categories)),
                    Reverse(n.votes.inclusion.net()),
                    n.id,
                )
            });
        }
        key => {
            nodes.sort_by(|a, b| {
                let ordering = match spec.direction {
                    SortDirection::Asc => compare(a, b, key),
                    SortDirection::Desc => compare(b, a, key),
                };
                ordering.then_with(|| a.id.cmp(&b.id))
            });
        }
    }
    nodes
}
