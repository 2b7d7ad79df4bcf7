use crate::error::{Result, ZeroError};
use crate::storage::GraphStore;
use crate::types::{Keyword, NodeId, NodeType, RawNode, VoteAxis};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Arc;

/// Curated category links count double against inferred keyword links.
pub const CATEGORY_WEIGHT: f64 = 2.0;

/// Upper bound on `find_related` results.
pub const MAX_RELATED_LIMIT: usize = 100;

/// One keyword two nodes have in common and what it contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedKeyword {
    pub word: String,
    /// Product of the keyword's frequency on both nodes.
    pub strength: f64,
}

/// Keywords present on both sides, ordered by word.
pub fn shared_keywords(a: &[Keyword], b: &[Keyword]) -> Vec<SharedKeyword> {
    let other: HashMap<&str, f64> = b.iter().map(|k| (k.word.as_str(), k.frequency)).collect();
    let mut shared: Vec<SharedKeyword> = a
        .iter()
        .filter_map(|k| {
            other.get(k.word.as_str()).map(|f| SharedKeyword {
                word: k.word.clone(),
                strength: k.frequency * f,
            })
        })
        .collect();
    shared.sort_by(|x, y| x.word.cmp(&y.word));
    shared
}

/// Category ids present on both sides, ascending.
pub fn shared_categories(a: &[NodeId], b: &[NodeId]) -> Vec<NodeId> {
    let a: BTreeSet<&NodeId> = a.iter().collect();
    b.iter()
        .filter(|id| a.contains(id))
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sum of `f1 * f2` over shared keywords.
pub fn tag_strength(a: &[Keyword], b: &[Keyword]) -> f64 {
    shared_keywords(a, b).iter().map(|k| k.strength).sum()
}

pub fn category_strength(a: &[NodeId], b: &[NodeId]) -> u32 {
    shared_categories(a, b).len() as u32
}

pub fn combined_strength(tag: f64, category: u32) -> f64 {
    tag + CATEGORY_WEIGHT * category as f64
}

/// What `find_related` scores candidates by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelatedBy {
    Tags,
    Categories,
    #[default]
    Combined,
}

impl FromStr for RelatedBy {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tags" | "keywords" => Ok(RelatedBy::Tags),
            "categories" => Ok(RelatedBy::Categories),
            "combined" | "either" => Ok(RelatedBy::Combined),
            other => Err(ZeroError::validation(format!(
                "unknown relatedness measure '{}'",
                other
            ))),
        }
    }
}

/// A node related to the queried one, with the facts that link them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub content: String,
    pub tag_strength: f64,
    pub category_strength: u32,
    /// Score under the requested measure; what results are ordered by.
    pub strength: f64,
    pub shared_keywords: Vec<SharedKeyword>,
    pub shared_categories: Vec<NodeId>,
}

impl RelatedNode {
    fn score(subject: &RawNode, candidate: &RawNode, by: RelatedBy) -> Self {
        let shared_keywords = shared_keywords(&subject.keywords, &candidate.keywords);
        let shared_categories = shared_categories(&subject.category_ids, &candidate.category_ids);
        let tag_strength: f64 = shared_keywords.iter().map(|k| k.strength).sum();
        let category_strength = shared_categories.len() as u32;

        let strength = match by {
            RelatedBy::Tags => tag_strength,
            RelatedBy::Categories => category_strength as f64,
            RelatedBy::Combined => combined_strength(tag_strength, category_strength),
        };

        RelatedNode {
            id: candidate.id,
            node_type: candidate.node_type,
            content: candidate.content.clone(),
            tag_strength,
            category_strength,
            strength,
            shared_keywords,
            shared_categories,
        }
    }
}

/// Keyword and category overlap between stored nodes.
pub struct TagIndex<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> TagIndex<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn pair(&self, a: NodeId, b: NodeId) -> Result<(RawNode, RawNode)> {
        let mut found = self.store.get_nodes(&[a, b]).await?;
        let left = found.get(&a).cloned().ok_or(ZeroError::NodeNotFound(a))?;
        let right = found.remove(&b).ok_or(ZeroError::NodeNotFound(b))?;
        Ok((left, right))
    }

    pub async fn shared_tag_strength(&self, a: NodeId, b: NodeId) -> Result<f64> {
        let (a, b) = self.pair(a, b).await?;
        Ok(tag_strength(&a.keywords, &b.keywords))
    }

    pub async fn shared_category_strength(&self, a: NodeId, b: NodeId) -> Result<u32> {
        let (a, b) = self.pair(a, b).await?;
        Ok(category_strength(&a.category_ids, &b.category_ids))
    }

    /// Nodes sharing keywords and/or categories with `node_id`, strongest
    /// first. Only nodes with a positive inclusion net are candidates, and
    /// the queried node never relates to itself.
    pub async fn find_related(
        &self,
        node_id: NodeId,
        by: RelatedBy,
        limit: usize,
    ) -> Result<Vec<RelatedNode>> {
        if limit == 0 || limit > MAX_RELATED_LIMIT {
            return Err(ZeroError::validation(format!(
                "limit must be between 1 and {}",
                MAX_RELATED_LIMIT
            )));
        }

        let subject = self
            .store
            .get_node(node_id)
            .await?
            .ok_or(ZeroError::NodeNotFound(node_id))?;

        let candidates: Vec<RawNode> =
            try_join_all(NodeType::ALL.iter().map(|t| self.store.nodes_by_type(*t)))
                .await?
                .into_iter()
                .flatten()
                .filter(|n| n.id != subject.id)
                .collect();

        let ids: Vec<NodeId> = candidates.iter().map(|n| n.id).collect();
        let tallies = self.store.vote_tallies(&ids).await?;

        let mut related: Vec<RelatedNode> = candidates
            .iter()
            .filter(|n| {
                tallies
                    .get(&n.id)
                    .map(|t| t.aggregate(VoteAxis::Inclusion).net() > 0)
                    .unwrap_or(false)
            })
            .map(|n| RelatedNode::score(&subject, n, by))
            .filter(|r| r.strength > 0.0)
            .collect();

        related.sort_by(|a, b| b.strength.total_cmp(&a.strength).then(a.id.cmp(&b.id)));
        related.truncate(limit);

        log::debug!(
            "Found {} nodes related to {} by {:?}",
            related.len(),
            node_id,
            by
        );
        Ok(related)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RedbGraphStore;
    use crate::types::{VoteDirection, VoteMutation};
    use tempfile::TempDir;

    fn kw(word: &str, frequency: f64) -> Keyword {
        Keyword::new(word, frequency)
    }

    #[test]
    fn test_tag_strength_sums_products() {
        let a = vec![kw("gravity", 2.0), kw("mass", 1.5), kw("light", 1.0)];
        let b = vec![kw("mass", 2.0), kw("gravity", 3.0), kw("time", 4.0)];

        let shared = shared_keywords(&a, &b);
        assert_eq!(shared.len(), 2);
        assert_eq!(shared[0].word, "gravity");
        assert_eq!(shared[0].strength, 6.0);
        assert_eq!(shared[1].strength, 3.0);
        assert_eq!(tag_strength(&a, &b), 9.0);
        assert_eq!(tag_strength(&a, &[]), 0.0);
    }

    #[test]
    fn test_category_strength_and_combined_weight() {
        let x = NodeId::now_v7();
        let y = NodeId::now_v7();
        let z = NodeId::now_v7();

        assert_eq!(category_strength(&[x, y], &[y, z, x]), 2);
        assert_eq!(category_strength(&[x], &[z]), 0);
        assert_eq!(combined_strength(1.5, 2), 5.5);
    }

    #[test]
    fn test_related_by_parse() {
        assert_eq!("Tags".parse::<RelatedBy>().unwrap(), RelatedBy::Tags);
        assert_eq!("either".parse::<RelatedBy>().unwrap(), RelatedBy::Combined);
        assert!("vibes".parse::<RelatedBy>().is_err());
    }

    async fn include(store: &RedbGraphStore, id: NodeId) {
        store
            .apply_vote(id, "voter", VoteAxis::Inclusion, VoteMutation::Cast(VoteDirection::Agree))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_find_related_orders_and_filters() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(RedbGraphStore::open(temp_dir.path().join("tags.redb")).unwrap());
        let index = TagIndex::new(store.clone());

        let category = RawNode::new(NodeType::Category, "Physics", "u");
        let category = category.clone().with_categories(vec![category.id]);
        store.put_node(&category).await.unwrap();

        let subject = RawNode::new(NodeType::Claim, "Gravity bends light", "u")
            .with_keywords(vec![kw("gravity", 1.0), kw("light", 1.0)])
            .with_categories(vec![category.id]);
        let strong = RawNode::new(NodeType::Claim, "Light has mass-energy", "u")
            .with_keywords(vec![kw("light", 2.0)])
            .with_categories(vec![category.id]);
        let weak = RawNode::new(NodeType::Question, "What is gravity?", "u")
            .with_keywords(vec![kw("gravity", 1.0)]);
        let unvoted = RawNode::new(NodeType::Claim, "Gravity is a force", "u")
            .with_keywords(vec![kw("gravity", 5.0)]);
        let unrelated = RawNode::new(NodeType::Claim, "Cats purr", "u")
            .with_keywords(vec![kw("cats", 1.0)]);

        for node in [&subject, &strong, &weak, &unvoted, &unrelated] {
            store.put_node(node).await.unwrap();
        }
        for id in [subject.id, strong.id, weak.id, unrelated.id, category.id] {
            include(&store, id).await;
        }

        let related = index
            .find_related(subject.id, RelatedBy::Combined, 10)
            .await
            .unwrap();
        let ids: Vec<NodeId> = related.iter().map(|r| r.id).collect();
        // strong: 2 + 2*1, category node: 2*1, weak: 1
        assert_eq!(ids, vec![strong.id, category.id, weak.id]);
        assert_eq!(related[0].strength, 4.0);
        assert_eq!(related[0].shared_categories, vec![category.id]);
        assert!(!ids.contains(&subject.id));

        let by_tags = index
            .find_related(subject.id, RelatedBy::Tags, 1)
            .await
            .unwrap();
        assert_eq!(by_tags.len(), 1);
        assert_eq!(by_tags[0].id, strong.id);

        assert_eq!(
            index.shared_tag_strength(subject.id, strong.id).await.unwrap(),
            2.0
        );
        assert_eq!(
            index
                .shared_category_strength(subject.id, category.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_self_categorized_node_skips_itself() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(RedbGraphStore::open(temp_dir.path().join("self.redb")).unwrap());
        let index = TagIndex::new(store.clone());

        let category = RawNode::new(NodeType::Category, "Physics", "u");
        let category = category.clone().with_categories(vec![category.id]);
        store.put_node(&category).await.unwrap();
        include(&store, category.id).await;

        let related = index
            .find_related(category.id, RelatedBy::Categories, 5)
            .await
            .unwrap();
        assert!(related.is_empty());

        assert!(matches!(
            index.find_related(category.id, RelatedBy::Tags, 0).await,
            Err(ZeroError::Validation(_))
        ));
        assert!(matches!(
            index
                .find_related(NodeId::now_v7(), RelatedBy::Tags, 5)
                .await,
            Err(ZeroError::NodeNotFound(_))
        ));
    }
}
