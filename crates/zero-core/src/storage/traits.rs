use crate::error::Result;
use crate::types::{
    DirectRelation, NodeId, NodeType, PeerReview, QuantityResponse, RawNode, UserVoteStatus,
    VisibilityPreference, VoteAxis, VoteMutation, VoteRecord, VoteTally,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Property-graph capability the engine reads from and writes votes to.
///
/// Every method is an I/O boundary; the engine never holds results across
/// invocations.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // === Node Operations ===

    /// Store a raw node record (insert or update)
    async fn put_node(&self, node: &RawNode) -> Result<()>;

    /// Retrieve a node by ID
    async fn get_node(&self, id: NodeId) -> Result<Option<RawNode>>;

    /// Retrieve many nodes at once. Missing IDs are simply absent.
    async fn get_nodes(&self, ids: &[NodeId]) -> Result<HashMap<NodeId, RawNode>>;

    /// All nodes of one type (match-by-label)
    async fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<RawNode>>;

    // === Vote Operations ===

    /// Apply a vote mutation to one `(node, user, axis)` slot and return the
    /// node's tally recomputed from its full vote record set. The record
    /// write and the tally update commit together.
    ///
    /// A content-axis cast fails with `AxisNotEligible` unless the node's
    /// inclusion net is positive, checked inside the same transaction.
    async fn apply_vote(
        &self,
        node_id: NodeId,
        user_id: &str,
        axis: VoteAxis,
        mutation: VoteMutation,
    ) -> Result<VoteTally>;

    /// Vote tallies for many nodes. Nodes never voted on get a zero tally.
    async fn vote_tallies(&self, ids: &[NodeId]) -> Result<HashMap<NodeId, VoteTally>>;

    /// Every vote record held on a node
    async fn vote_records(&self, node_id: NodeId) -> Result<Vec<VoteRecord>>;

    /// One user's votes on one node
    async fn user_vote(&self, node_id: NodeId, user_id: &str) -> Result<UserVoteStatus>;

    // === Interaction Queries ===

    /// Distinct voters and commenters per node
    async fn participant_counts(&self, ids: &[NodeId]) -> Result<HashMap<NodeId, u32>>;

    /// Nodes the user voted on or commented on
    async fn interacted_node_ids(&self, user_id: &str) -> Result<HashSet<NodeId>>;

    // === Direct Relations ===

    async fn put_relation(&self, relation: &DirectRelation) -> Result<()>;

    /// Relations with at least one endpoint in `ids` (match-by-relationship-type)
    async fn relations_touching(&self, ids: &[NodeId]) -> Result<Vec<DirectRelation>>;

    // === Type Feedback ===

    async fn put_peer_review(&self, review: &PeerReview) -> Result<()>;

    async fn peer_reviews(&self, node_id: NodeId) -> Result<Vec<PeerReview>>;

    async fn put_quantity_response(&self, response: &QuantityResponse) -> Result<()>;

    async fn quantity_responses(&self, node_id: NodeId) -> Result<Vec<QuantityResponse>>;

    // === Preferences ===

    async fn put_visibility(&self, preference: &VisibilityPreference) -> Result<()>;

    async fn visibility(
        &self,
        node_id: NodeId,
        user_id: &str,
    ) -> Result<Option<VisibilityPreference>>;
}
