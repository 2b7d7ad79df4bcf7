use crate::error::{Result, ZeroError};
use crate::storage::GraphStore;
use crate::tags::SharedKeyword;
use crate::types::{DirectRelation, GraphNode, NodeId, TypeSpecific};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    SharedKeyword,
    SharedCategory,
    /// Authored "related to" link.
    Related,
    /// Answer to its question.
    Answers,
    /// Evidence to the node it supports.
    EvidenceFor,
    /// Node to a category it belongs to.
    CategorizedAs,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 6] = [
        RelationshipKind::SharedKeyword,
        RelationshipKind::SharedCategory,
        RelationshipKind::Related,
        RelationshipKind::Answers,
        RelationshipKind::EvidenceFor,
        RelationshipKind::CategorizedAs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::SharedKeyword => "shared_keyword",
            RelationshipKind::SharedCategory => "shared_category",
            RelationshipKind::Related => "related",
            RelationshipKind::Answers => "answers",
            RelationshipKind::EvidenceFor => "evidence_for",
            RelationshipKind::CategorizedAs => "categorized_as",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        RelationshipKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ZeroError::validation(format!("unknown relationship type '{}'", s)))
    }
}

/// Facts an edge was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetadata {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shared_keywords: Vec<SharedKeyword>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shared_categories: Vec<NodeId>,
    /// Authored relations behind a `related` edge.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relation_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub strength: f64,
    pub metadata: EdgeMetadata,
}

impl Edge {
    fn new(kind: RelationshipKind, source: NodeId, target: NodeId, strength: f64) -> Self {
        Edge {
            id: format!("{}:{}:{}", kind, source, target),
            source,
            target,
            kind,
            strength,
            metadata: EdgeMetadata::default(),
        }
    }
}

/// Pair key for symmetric edges. Lower id is always the source.
fn pair(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Group nodes under each attribute value they carry.
fn group_by<'a, K, I>(nodes: &'a [GraphNode], attrs: impl Fn(&'a GraphNode) -> I) -> BTreeMap<K, Vec<&'a GraphNode>>
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    let mut groups: BTreeMap<K, Vec<&GraphNode>> = BTreeMap::new();
    for node in nodes {
        for key in attrs(node) {
            groups.entry(key).or_default().push(node);
        }
    }
    groups
}

fn shared_keyword_edges(nodes: &[GraphNode]) -> Vec<Edge> {
    let groups = group_by(nodes, |n| n.keywords.iter().map(|k| k.word.as_str()));

    // One fact per (pair, keyword); consolidated below
    let mut facts: BTreeMap<(NodeId, NodeId), Vec<SharedKeyword>> = BTreeMap::new();
    for (word, members) in groups {
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                if a.id == b.id {
                    continue;
                }
                let (fa, fb) = (frequency(a, word), frequency(b, word));
                facts.entry(pair(a.id, b.id)).or_default().push(SharedKeyword {
                    word: word.to_string(),
                    strength: fa * fb,
                });
            }
        }
    }

    facts
        .into_iter()
        .map(|((source, target), shared)| {
            let strength = shared.iter().map(|k| k.strength).sum();
            let mut edge = Edge::new(RelationshipKind::SharedKeyword, source, target, strength);
            edge.metadata.shared_keywords = shared;
            edge
        })
        .collect()
}

fn frequency(node: &GraphNode, word: &str) -> f64 {
    node.keywords
        .iter()
        .find(|k| k.word == word)
        .map(|k| k.frequency)
        .unwrap_or(0.0)
}

fn shared_category_edges(nodes: &[GraphNode]) -> Vec<Edge> {
    let groups = group_by(nodes, |n| n.categories.iter().map(|c| c.id));

    let mut facts: BTreeMap<(NodeId, NodeId), Vec<NodeId>> = BTreeMap::new();
    for (category, members) in groups {
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                if a.id == b.id {
                    continue;
                }
                facts.entry(pair(a.id, b.id)).or_default().push(category);
            }
        }
    }

    facts
        .into_iter()
        .map(|((source, target), shared)| {
            let mut edge = Edge::new(
                RelationshipKind::SharedCategory,
                source,
                target,
                shared.len() as f64,
            );
            edge.metadata.shared_categories = shared;
            edge
        })
        .collect()
}

/// Structural edges read off each node's own payload.
fn structural_edges(nodes: &[GraphNode], kind: RelationshipKind) -> Vec<Edge> {
    let mut edges = Vec::new();
    for node in nodes {
        match (kind, &node.type_specific) {
            (RelationshipKind::Answers, TypeSpecific::Answer { question_id, .. }) => {
                edges.push(Edge::new(kind, node.id, *question_id, 1.0));
            }
            (RelationshipKind::EvidenceFor, TypeSpecific::Evidence { parent_id: Some(parent), .. }) => {
                edges.push(Edge::new(kind, node.id, *parent, 1.0));
            }
            (RelationshipKind::CategorizedAs, _) => {
                edges.extend(
                    node.categories
                        .iter()
                        .filter(|c| c.id != node.id)
                        .map(|c| Edge::new(kind, node.id, c.id, 1.0)),
                );
            }
            _ => {}
        }
    }
    edges
}

/// Every requested edge kind derivable from the nodes alone. Edges are
/// not yet restricted to the node set.
pub fn derive_edges(nodes: &[GraphNode], kinds: &[RelationshipKind]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for kind in kinds {
        match kind {
            RelationshipKind::SharedKeyword => edges.extend(shared_keyword_edges(nodes)),
            RelationshipKind::SharedCategory => edges.extend(shared_category_edges(nodes)),
            RelationshipKind::Related => {}
            structural => edges.extend(structural_edges(nodes, *structural)),
        }
    }
    edges
}

/// One `related` edge per authored direction. Repeated relations between
/// the same pair add to its strength.
fn related_edges(relations: Vec<DirectRelation>) -> Vec<Edge> {
    let mut seen = HashSet::new();
    let mut facts: BTreeMap<(NodeId, NodeId), Vec<Uuid>> = BTreeMap::new();
    for relation in relations {
        if relation.source == relation.target || !seen.insert(relation.id) {
            continue;
        }
        facts
            .entry((relation.source, relation.target))
            .or_default()
            .push(relation.id);
    }

    facts
        .into_iter()
        .map(|((source, target), mut relation_ids)| {
            relation_ids.sort();
            let mut edge = Edge::new(
                RelationshipKind::Related,
                source,
                target,
                relation_ids.len() as f64,
            );
            edge.metadata.relation_ids = relation_ids;
            edge
        })
        .collect()
}

/// Builds the edge list for a final node set.
pub struct RelationshipAssembler<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> RelationshipAssembler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Edges of the requested kinds whose endpoints are both in `nodes`.
    /// An empty `kinds` list means all kinds.
    pub async fn assemble(&self, nodes: &[GraphNode], kinds: &[RelationshipKind]) -> Result<Vec<Edge>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let kinds: Vec<RelationshipKind> = if kinds.is_empty() {
            RelationshipKind::ALL.to_vec()
        } else {
            let mut unique = kinds.to_vec();
            unique.sort();
            unique.dedup();
            unique
        };

        let mut edges = derive_edges(nodes, &kinds);

        if kinds.contains(&RelationshipKind::Related) {
            let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
            edges.extend(related_edges(self.store.relations_touching(&ids).await?));
        }

        let present: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
        let before = edges.len();
        edges.retain(|e| present.contains(&e.source) && present.contains(&e.target));
        edges.sort_by(|a, b| {
            (a.kind, a.source, a.target).cmp(&(b.kind, b.source, b.target))
        });

        log::debug!(
            "Assembled {} edges over {} nodes ({} dropped at the boundary)",
            edges.len(),
            nodes.len(),
            before - edges.len()
        );
        Ok(edges)
    }
}

/// Per-type edge counts, for logging and performance info.
pub fn count_by_kind(edges: &[Edge]) -> HashMap<RelationshipKind, usize> {
    let mut counts = HashMap::new();
    for edge in edges {
        *counts.entry(edge.kind).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::transform;
    use crate::storage::RedbGraphStore;
    use crate::types::{CategoryRef, Keyword, NodeType, RawNode, VoteTally};
    use tempfile::TempDir;

    fn node(node_type: NodeType, keywords: &[(&str, f64)]) -> GraphNode {
        let raw = RawNode::new(node_type, "text", "u")
            .with_keywords(keywords.iter().map(|(w, f)| Keyword::new(*w, *f)).collect());
        transform(&raw, VoteTally::default(), &HashMap::new())
    }

    #[test]
    fn test_two_keywords_consolidate_into_one_edge() {
        let a = node(NodeType::Claim, &[("gravity", 2.0), ("mass", 1.0)]);
        let b = node(NodeType::Claim, &[("gravity", 1.5), ("mass", 3.0)]);

        let edges = derive_edges(&[a.clone(), b.clone()], &[RelationshipKind::SharedKeyword]);
        assert_eq!(edges.len(), 1);
        let edge = &edges[0];
        assert_eq!(edge.strength, 6.0);
        assert_eq!(edge.metadata.shared_keywords.len(), 2);
        assert_eq!(pair(a.id, b.id), (edge.source, edge.target));
    }

    #[test]
    fn test_shared_category_edges_count_categories() {
        let physics = CategoryRef { id: NodeId::now_v7(), name: "physics".into() };
        let maths = CategoryRef { id: NodeId::now_v7(), name: "maths".into() };
        let mut a = node(NodeType::Claim, &[]);
        a.categories = vec![physics.clone(), maths.clone()];
        let mut b = node(NodeType::Question, &[]);
        b.categories = vec![maths.clone(), physics.clone()];
        let mut c = node(NodeType::Claim, &[]);
        c.categories = vec![maths.clone()];

        let edges = derive_edges(&[a.clone(), b.clone(), c.clone()], &[RelationshipKind::SharedCategory]);
        assert_eq!(edges.len(), 3);
        let ab = edges
            .iter()
            .find(|e| pair(a.id, b.id) == (e.source, e.target))
            .unwrap();
        assert_eq!(ab.strength, 2.0);
    }

    #[tokio::test]
    async fn test_assemble_drops_dangling_and_self_edges() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(RedbGraphStore::open(temp_dir.path().join("edges.redb")).unwrap());
        let assembler = RelationshipAssembler::new(store.clone());

        let category_raw = RawNode::new(NodeType::Category, "physics", "u");
        let category_raw = category_raw.clone().with_categories(vec![category_raw.id]);
        store.put_node(&category_raw).await.unwrap();
        let names: HashMap<NodeId, String> = [(category_raw.id, "physics".to_string())].into();
        let category = transform(&category_raw, VoteTally::default(), &names);

        let question_raw = RawNode::new(NodeType::Question, "Why?", "u");
        store.put_node(&question_raw).await.unwrap();
        let mut answer = node(NodeType::Answer, &[]);
        answer.type_specific = TypeSpecific::Answer {
            question_id: question_raw.id,
            question_text: "Why?".into(),
        };
        store
            .put_node(&RawNode { id: answer.id, ..RawNode::new(NodeType::Answer, "text", "u").with_parent(question_raw.id) })
            .await
            .unwrap();

        let mut claim_raw = RawNode::new(NodeType::Claim, "text", "u").with_categories(vec![category_raw.id]);
        claim_raw.keywords = vec![Keyword::new("gravity", 1.0)];
        store.put_node(&claim_raw).await.unwrap();
        let claim = transform(&claim_raw, VoteTally::default(), &names);

        store
            .put_relation(&DirectRelation::new(claim.id, answer.id, "u"))
            .await
            .unwrap();
        store
            .put_relation(&DirectRelation::new(claim.id, question_raw.id, "u"))
            .await
            .unwrap();

        // The question is outside the final set
        let finals = vec![category.clone(), answer.clone(), claim.clone()];
        let edges = assembler.assemble(&finals, &[]).await.unwrap();

        let present: HashSet<NodeId> = finals.iter().map(|n| n.id).collect();
        for edge in &edges {
            assert!(present.contains(&edge.source) && present.contains(&edge.target));
            assert_ne!(edge.source, edge.target);
        }

        let counts = count_by_kind(&edges);
        assert_eq!(counts.get(&RelationshipKind::Answers), None);
        assert_eq!(counts.get(&RelationshipKind::Related), Some(&1));
        assert_eq!(counts.get(&RelationshipKind::CategorizedAs), Some(&1));
        assert_eq!(counts.get(&RelationshipKind::SharedCategory), Some(&1));

        let only_related = assembler
            .assemble(&finals, &[RelationshipKind::Related])
            .await
            .unwrap();
        assert!(only_related.iter().all(|e| e.kind == RelationshipKind::Related));
    }

    #[test]
    fn test_repeated_relations_consolidate() {
        let a = NodeId::now_v7();
        let b = NodeId::now_v7();
        let first = DirectRelation::new(a, b, "alice");
        let second = DirectRelation::new(a, b, "bob");
        let reverse = DirectRelation::new(b, a, "carol");

        let edges = related_edges(vec![
            first.clone(),
            second.clone(),
            first.clone(),
            reverse.clone(),
        ]);
        assert_eq!(edges.len(), 2);

        let forward = edges.iter().find(|e| e.source == a).unwrap();
        assert_eq!(forward.strength, 2.0);
        let mut expected = vec![first.id, second.id];
        expected.sort();
        assert_eq!(forward.metadata.relation_ids, expected);

        let backward = edges.iter().find(|e| e.source == b).unwrap();
        assert_eq!(backward.metadata.relation_ids, vec![reverse.id]);
        assert_ne!(forward.id, backward.id);
    }

    #[test]
    fn test_kind_parse_and_wire_name() {
        assert_eq!(
            "evidence-for".parse::<RelationshipKind>().unwrap(),
            RelationshipKind::EvidenceFor
        );
        assert!("cites".parse::<RelationshipKind>().is_err());
        let edge = Edge::new(RelationshipKind::Answers, NodeId::nil(), NodeId::nil(), 1.0);
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "answers");
        assert!(json["metadata"].get("sharedKeywords").is_none());
    }
}
