mod adapters;

pub use adapters::{summarize_peer_reviews, summarize_responses};

use crate::error::{Result, ZeroError};
use crate::storage::GraphStore;
use crate::types::{
    CategoryRef, GraphNode, Keyword, NodeId, NodeType, NodeVotes, RawNode, TypeSpecific,
    VoteAxis, VoteTally,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Static per-type behaviour, looked up by `NodeType`.
#[derive(Debug, Clone, Copy)]
pub struct TypeCapabilities {
    pub node_type: NodeType,

    /// Whether the content axis exists for this type.
    pub content_voting: bool,

    /// Type that must be fetched alongside this one. Answers are never
    /// shown without their questions.
    pub required_parent: Option<NodeType>,

    /// Types a record's `parent_id` may point at. Empty = no parent.
    pub parent_types: &'static [NodeType],

    /// Part of the unfiltered default dataset.
    pub primary: bool,
}

const CAPABILITIES: [TypeCapabilities; 9] = [
    TypeCapabilities {
        node_type: NodeType::Claim,
        content_voting: true,
        required_parent: None,
        parent_types: &[],
        primary: true,
    },
    TypeCapabilities {
        node_type: NodeType::Question,
        content_voting: false,
        required_parent: None,
        parent_types: &[],
        primary: true,
    },
    TypeCapabilities {
        node_type: NodeType::Answer,
        content_voting: true,
        required_parent: Some(NodeType::Question),
        parent_types: &[NodeType::Question],
        primary: true,
    },
    TypeCapabilities {
        node_type: NodeType::Quantity,
        content_voting: false,
        required_parent: None,
        parent_types: &[],
        primary: true,
    },
    TypeCapabilities {
        node_type: NodeType::Evidence,
        content_voting: true,
        required_parent: None,
        parent_types: &[NodeType::Claim, NodeType::Answer, NodeType::Quantity],
        primary: true,
    },
    TypeCapabilities {
        node_type: NodeType::Word,
        content_voting: false,
        required_parent: None,
        parent_types: &[],
        primary: false,
    },
    TypeCapabilities {
        node_type: NodeType::Definition,
        content_voting: true,
        required_parent: None,
        parent_types: &[NodeType::Word],
        primary: false,
    },
    TypeCapabilities {
        node_type: NodeType::Category,
        content_voting: false,
        required_parent: None,
        parent_types: &[],
        primary: false,
    },
    TypeCapabilities {
        node_type: NodeType::Comment,
        content_voting: false,
        required_parent: None,
        parent_types: &NodeType::ALL,
        primary: false,
    },
];

pub fn capabilities(node_type: NodeType) -> &'static TypeCapabilities {
    // Table order matches NodeType::ALL
    &CAPABILITIES[node_type as usize]
}

pub fn supports_content_voting(node_type: NodeType) -> bool {
    capabilities(node_type).content_voting
}

/// The unfiltered default dataset.
pub fn primary_types() -> Vec<NodeType> {
    CAPABILITIES
        .iter()
        .filter(|c| c.primary)
        .map(|c| c.node_type)
        .collect()
}

/// Turn a stored record into the uniform `GraphNode` shape. The type payload
/// starts empty; `NodeRegistry::fetch` fills it in for surviving nodes.
pub fn transform(
    raw: &RawNode,
    tally: VoteTally,
    category_names: &HashMap<NodeId, String>,
) -> GraphNode {
    let votes = NodeVotes {
        inclusion: tally.aggregate(VoteAxis::Inclusion),
        content: supports_content_voting(raw.node_type).then(|| tally.aggregate(VoteAxis::Content)),
    };

    let categories = raw
        .category_ids
        .iter()
        .filter_map(|id| {
            category_names.get(id).map(|name| CategoryRef {
                id: *id,
                name: name.clone(),
            })
        })
        .collect();

    GraphNode {
        id: raw.id,
        node_type: raw.node_type,
        content: raw.content.clone(),
        created_by: raw.created_by.clone(),
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        public_credit: raw.public_credit,
        votes,
        keywords: raw.keywords.clone(),
        categories,
        discussion_ref: raw.discussion_id,
        type_specific: TypeSpecific::None,
        participant_count: 0,
        user_vote_status: None,
        user_visibility_preference: None,
    }
}

/// Per-type fetch and transform adapters over a graph store.
pub struct NodeRegistry<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> NodeRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate parent and category references, then persist the record.
    ///
    /// Categories are categorized as themselves and words are tagged with
    /// themselves; both are added here when missing.
    pub async fn create(&self, mut node: RawNode) -> Result<RawNode> {
        match node.node_type {
            NodeType::Category if !node.category_ids.contains(&node.id) => {
                node.category_ids.push(node.id);
            }
            NodeType::Word => {
                let word = node.content.trim().to_lowercase();
                node.content = word.clone();
                if !node.keywords.iter().any(|k| k.word == word) {
                    node.keywords.push(Keyword::new(word, 1.0));
                }
            }
            _ => {}
        }

        self.check_parent(&node).await?;
        self.check_categories(&node).await?;

        self.store.put_node(&node).await?;
        log::debug!("Created {} node {}", node.node_type, node.id);
        Ok(node)
    }

    async fn check_parent(&self, node: &RawNode) -> Result<()> {
        let caps = capabilities(node.node_type);
        match (node.parent_id, caps.parent_types.is_empty()) {
            (None, true) => Ok(()),
            (Some(_), true) => Err(ZeroError::validation(format!(
                "{} nodes do not take a parent",
                node.node_type
            ))),
            (None, false) => Err(ZeroError::validation(format!(
                "{} nodes require a parent",
                node.node_type
            ))),
            (Some(parent_id), false) => {
                let parent = self
                    .store
                    .get_node(parent_id)
                    .await?
                    .ok_or(ZeroError::NodeNotFound(parent_id))?;
                if caps.parent_types.contains(&parent.node_type) {
                    Ok(())
                } else {
                    Err(ZeroError::validation(format!(
                        "{} nodes cannot attach to a {}",
                        node.node_type, parent.node_type
                    )))
                }
            }
        }
    }

    async fn check_categories(&self, node: &RawNode) -> Result<()> {
        let referenced: Vec<NodeId> = node
            .category_ids
            .iter()
            .copied()
            .filter(|id| *id != node.id)
            .collect();
        if referenced.is_empty() {
            return Ok(());
        }

        let found = self.store.get_nodes(&referenced).await?;
        for id in referenced {
            match found.get(&id) {
                Some(category) if category.node_type == NodeType::Category => {}
                _ => return Err(ZeroError::CategoryNotFound(id)),
            }
        }
        Ok(())
    }

    /// Fetch every node of one type, keep those accepted by `keep`, and
    /// attach votes, participant counts and the type payload.
    pub async fn fetch<F>(&self, node_type: NodeType, keep: F) -> Result<Vec<GraphNode>>
    where
        F: Fn(&GraphNode) -> bool,
    {
        let raws = self.store.nodes_by_type(node_type).await?;
        if raws.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<NodeId> = raws.iter().map(|n| n.id).collect();
        let tallies = self.store.vote_tallies(&ids).await?;
        let category_names = self.category_names(&raws).await?;

        let (raws, mut nodes): (Vec<RawNode>, Vec<GraphNode>) = raws
            .into_iter()
            .filter_map(|raw| {
                let tally = tallies.get(&raw.id).copied().unwrap_or_default();
                let node = transform(&raw, tally, &category_names);
                keep(&node).then_some((raw, node))
            })
            .unzip();

        if nodes.is_empty() {
            return Ok(nodes);
        }

        let kept: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        let participants = self.store.participant_counts(&kept).await?;
        let mut payloads = adapters::build_payloads(self.store.as_ref(), node_type, &raws).await?;

        for node in &mut nodes {
            node.participant_count = participants.get(&node.id).copied().unwrap_or(0);
            if let Some(payload) = payloads.remove(&node.id) {
                node.type_specific = payload;
            }
        }

        log::debug!("Fetched {} {} nodes", nodes.len(), node_type);
        Ok(nodes)
    }

    /// Resolve the names of every category referenced by `raws`
    async fn category_names(&self, raws: &[RawNode]) -> Result<HashMap<NodeId, String>> {
        let ids: BTreeSet<NodeId> = raws
            .iter()
            .flat_map(|n| n.category_ids.iter().copied())
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<NodeId> = ids.into_iter().collect();
        let found = self.store.get_nodes(&ids).await?;
        let mut names = HashMap::with_capacity(found.len());
        for id in ids {
            match found.get(&id) {
                Some(category) if category.node_type == NodeType::Category => {
                    names.insert(id, category.content.clone());
                }
                _ => log::warn!("Dropping reference to missing category {}", id),
            }
        }
        Ok(names)
    }
}
