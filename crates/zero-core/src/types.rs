use crate::error::ZeroError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Type alias for node identifiers
pub type NodeId = Uuid;

/// Identity of a platform user, as issued by the auth layer.
pub type UserId = String;

/// The fixed set of node types living in the graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A statement put forward for the community to judge.
    Claim,
    /// An open question awaiting answers.
    Question,
    /// A response to exactly one question.
    Answer,
    /// Something measurable; users submit numeric responses.
    Quantity,
    /// Supporting material for a claim, answer or quantity.
    Evidence,
    /// A keyword promoted to a first-class node.
    Word,
    /// A proposed meaning for a word.
    Definition,
    /// A curated grouping of words. Categorized as itself.
    Category,
    /// A discussion contribution attached to another node.
    Comment,
}

impl NodeType {
    pub const ALL: [NodeType; 9] = [
        NodeType::Claim,
        NodeType::Question,
        NodeType::Answer,
        NodeType::Quantity,
        NodeType::Evidence,
        NodeType::Word,
        NodeType::Definition,
        NodeType::Category,
        NodeType::Comment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Claim => "claim",
            NodeType::Question => "question",
            NodeType::Answer => "answer",
            NodeType::Quantity => "quantity",
            NodeType::Evidence => "evidence",
            NodeType::Word => "word",
            NodeType::Definition => "definition",
            NodeType::Category => "category",
            NodeType::Comment => "comment",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| ZeroError::validation(format!("unknown node type '{}'", s)))
    }
}

/// The two independent voting axes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteAxis {
    /// Should this node exist in the graph at all?
    Inclusion,
    /// How good is this node, once included?
    Content,
}

impl VoteAxis {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteAxis::Inclusion => "inclusion",
            VoteAxis::Content => "content",
        }
    }
}

impl fmt::Display for VoteAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteAxis {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inclusion" => Ok(VoteAxis::Inclusion),
            "content" => Ok(VoteAxis::Content),
            other => Err(ZeroError::validation(format!("unknown vote axis '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Agree,
    Disagree,
}

impl VoteDirection {
    /// Convert to u8 for storage
    pub fn to_u8(self) -> u8 {
        match self {
            VoteDirection::Agree => 0,
            VoteDirection::Disagree => 1,
        }
    }

    /// Convert from u8
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(VoteDirection::Agree),
            1 => Some(VoteDirection::Disagree),
            _ => None,
        }
    }
}

impl FromStr for VoteDirection {
    type Err = ZeroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agree" | "positive" | "up" => Ok(VoteDirection::Agree),
            "disagree" | "negative" | "down" => Ok(VoteDirection::Disagree),
            other => Err(ZeroError::validation(format!(
                "unknown vote direction '{}'",
                other
            ))),
        }
    }
}

/// Change requested against one `(user, node, axis)` vote slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteMutation {
    Cast(VoteDirection),
    Remove,
}

impl VoteMutation {
    /// Resolve the slot's next state. Casting the direction already held
    /// toggles the vote off; casting the other direction replaces it.
    pub fn resolve(self, existing: Option<VoteDirection>) -> Option<VoteDirection> {
        match (self, existing) {
            (VoteMutation::Remove, _) => None,
            (VoteMutation::Cast(requested), Some(current)) if requested == current => None,
            (VoteMutation::Cast(requested), _) => Some(requested),
        }
    }
}

/// One user's vote on one axis of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub user_id: UserId,
    pub node_id: NodeId,
    pub axis: VoteAxis,
    pub direction: VoteDirection,
}

/// Positive/negative counts for one axis. `net` is derived on construction
/// and cannot be set independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VoteCounts")]
pub struct VoteAggregate {
    positive: u64,
    negative: u64,
    net: i64,
}

#[derive(Deserialize)]
struct VoteCounts {
    positive: u64,
    negative: u64,
}

impl From<VoteCounts> for VoteAggregate {
    fn from(counts: VoteCounts) -> Self {
        VoteAggregate::from_counts(counts.positive, counts.negative)
    }
}

impl VoteAggregate {
    pub fn from_counts(positive: u64, negative: u64) -> Self {
        Self {
            positive,
            negative,
            net: positive as i64 - negative as i64,
        }
    }

    pub fn positive(&self) -> u64 {
        self.positive
    }

    pub fn negative(&self) -> u64 {
        self.negative
    }

    pub fn net(&self) -> i64 {
        self.net
    }

    /// Total votes cast on this axis, either direction.
    pub fn total(&self) -> u64 {
        self.positive + self.negative
    }
}

/// Raw per-node vote counts as kept by the store, both axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub inclusion_positive: u64,
    pub inclusion_negative: u64,
    pub content_positive: u64,
    pub content_negative: u64,
}

impl VoteTally {
    pub fn aggregate(&self, axis: VoteAxis) -> VoteAggregate {
        match axis {
            VoteAxis::Inclusion => {
                VoteAggregate::from_counts(self.inclusion_positive, self.inclusion_negative)
            }
            VoteAxis::Content => {
                VoteAggregate::from_counts(self.content_positive, self.content_negative)
            }
        }
    }

    /// Add one vote to the matching counter.
    pub fn count(&mut self, axis: VoteAxis, direction: VoteDirection) {
        let slot = match (axis, direction) {
            (VoteAxis::Inclusion, VoteDirection::Agree) => &mut self.inclusion_positive,
            (VoteAxis::Inclusion, VoteDirection::Disagree) => &mut self.inclusion_negative,
            (VoteAxis::Content, VoteDirection::Agree) => &mut self.content_positive,
            (VoteAxis::Content, VoteDirection::Disagree) => &mut self.content_negative,
        };
        *slot += 1;
    }
}

/// Vote state attached to every graph node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeVotes {
    pub inclusion: VoteAggregate,

    /// Present only for content-voting-eligible types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<VoteAggregate>,
}

/// The requesting user's own votes on a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserVoteStatus {
    pub inclusion: Option<VoteDirection>,
    pub content: Option<VoteDirection>,
}

impl UserVoteStatus {
    pub fn get(&self, axis: VoteAxis) -> Option<VoteDirection> {
        match axis {
            VoteAxis::Inclusion => self.inclusion,
            VoteAxis::Content => self.content,
        }
    }
}

/// A keyword tag with its extraction frequency on the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub frequency: f64,
}

impl Keyword {
    pub fn new(word: impl Into<String>, frequency: f64) -> Self {
        Self {
            word: word.into().to_lowercase(),
            frequency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: NodeId,
    pub name: String,
}

/// A node as persisted by the store, before type adapters run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Primary display text. For words and categories this is the name.
    pub content: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub public_credit: bool,
    pub keywords: Vec<Keyword>,
    pub category_ids: Vec<NodeId>,
    /// Question for answers, word for definitions, supported node for
    /// evidence, discussed node for comments.
    pub parent_id: Option<NodeId>,
    pub discussion_id: Option<NodeId>,
    /// Loose per-type attributes (evidence url, quantity unit, ...).
    pub attributes: HashMap<String, String>,
}

impl RawNode {
    pub fn new(node_type: NodeType, content: impl Into<String>, created_by: impl Into<UserId>) -> Self {
        let now = Utc::now();
        RawNode {
            id: Uuid::now_v7(),
            node_type,
            content: content.into(),
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            public_credit: true,
            keywords: Vec::new(),
            category_ids: Vec::new(),
            parent_id: None,
            discussion_id: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<Keyword>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_categories(mut self, category_ids: Vec<NodeId>) -> Self {
        self.category_ids = category_ids;
        self
    }

    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Validate the record before it is written
    pub fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("Content must not be empty".to_string());
        }

        if self.content.chars().count() > 4096 {
            return Err("Content exceeds 4096 characters".to_string());
        }

        if self.created_by.trim().is_empty() {
            return Err("Creator must not be empty".to_string());
        }

        if self.keywords.len() > 64 {
            return Err("More than 64 keywords".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for keyword in &self.keywords {
            if keyword.word.trim().is_empty() {
                return Err("Keyword must not be empty".to_string());
            }
            if keyword.word != keyword.word.to_lowercase() {
                return Err(format!("Keyword '{}' must be lowercase", keyword.word));
            }
            if !keyword.frequency.is_finite() || keyword.frequency < 0.0 {
                return Err(format!(
                    "Keyword '{}' has invalid frequency {}",
                    keyword.word, keyword.frequency
                ));
            }
            if !seen.insert(keyword.word.as_str()) {
                return Err(format!("Keyword '{}' listed twice", keyword.word));
            }
        }

        let mut seen_categories = std::collections::HashSet::new();
        for id in &self.category_ids {
            if !seen_categories.insert(id) {
                return Err(format!("Category {} listed twice", id));
            }
        }

        if self.parent_id == Some(self.id) {
            return Err("A node cannot be its own parent".to_string());
        }

        Ok(())
    }
}

/// Aggregated peer-review scores for an evidence node (1..=5 scale).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewSummary {
    pub count: u32,
    pub quality: f64,
    pub independence: f64,
    pub relevance: f64,
    pub overall: f64,
}

/// Summary of the numeric responses submitted on a quantity node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStatistics {
    pub count: u32,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// Per-type payload attached by the registry's type adapters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeSpecific {
    None,
    #[serde(rename_all = "camelCase")]
    Answer {
        question_id: NodeId,
        question_text: String,
    },
    #[serde(rename_all = "camelCase")]
    Evidence {
        parent_id: Option<NodeId>,
        parent_type: Option<NodeType>,
        parent_text: Option<String>,
        url: Option<String>,
        evidence_type: Option<String>,
        peer_review: PeerReviewSummary,
    },
    #[serde(rename_all = "camelCase")]
    Quantity {
        unit: Option<String>,
        statistics: Option<ResponseStatistics>,
    },
    #[serde(rename_all = "camelCase")]
    Definition {
        word_id: Option<NodeId>,
        word: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Comment { parent_id: Option<NodeId> },
}

/// Where a visibility preference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceSource {
    User,
    Community,
}

/// A user's choice to show or hide a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityPreference {
    pub user_id: UserId,
    pub node_id: NodeId,
    pub is_visible: bool,
    pub source: PreferenceSource,
    pub updated_at: DateTime<Utc>,
}

/// One reviewer's scores on an evidence node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReview {
    pub node_id: NodeId,
    pub user_id: UserId,
    pub quality: u8,
    pub independence: u8,
    pub relevance: u8,
    pub created_at: DateTime<Utc>,
}

/// One user's numeric answer to a quantity node. Latest submission wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityResponse {
    pub node_id: NodeId,
    pub user_id: UserId,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

/// An authored "related to" link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectRelation {
    pub id: Uuid,
    pub source: NodeId,
    pub target: NodeId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl DirectRelation {
    pub fn new(source: NodeId, target: NodeId, created_by: impl Into<UserId>) -> Self {
        Self {
            id: Uuid::now_v7(),
            source,
            target,
            created_by: created_by.into(),
            created_at: Utc::now(),
        }
    }
}

/// The uniform record every query returns, whatever the node type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub content: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub public_credit: bool,
    pub votes: NodeVotes,
    pub keywords: Vec<Keyword>,
    pub categories: Vec<CategoryRef>,
    pub discussion_ref: Option<NodeId>,
    pub type_specific: TypeSpecific,
    /// Distinct users holding a vote or comment relation to this node.
    pub participant_count: u32,
    pub user_vote_status: Option<UserVoteStatus>,
    pub user_visibility_preference: Option<VisibilityPreference>,
}

impl GraphNode {
    pub fn has_keyword(&self, word: &str) -> bool {
        self.keywords.iter().any(|k| k.word == word)
    }

    pub fn has_category(&self, id: &NodeId) -> bool {
        self.categories.iter().any(|c| &c.id == id)
    }

    /// Parent reference carried in the type payload, if any.
    pub fn parent_id(&self) -> Option<NodeId> {
        match &self.type_specific {
            TypeSpecific::Answer { question_id, .. } => Some(*question_id),
            TypeSpecific::Evidence { parent_id, .. } => *parent_id,
            TypeSpecific::Definition { word_id, .. } => *word_id,
            TypeSpecific::Comment { parent_id } => *parent_id,
            TypeSpecific::Quantity { .. } | TypeSpecific::None => None,
        }
    }
}
