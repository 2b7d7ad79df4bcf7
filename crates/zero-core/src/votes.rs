use crate::error::{Result, ZeroError};
use crate::registry;
use crate::storage::GraphStore;
use crate::types::{
    NodeId, NodeVotes, UserVoteStatus, VoteAxis, VoteDirection, VoteMutation, VoteTally,
};
use std::sync::Arc;

/// Outcome of a vote mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub node_id: NodeId,
    pub axis: VoteAxis,
    /// The caller's vote on this axis after the mutation.
    pub user_vote: Option<VoteDirection>,
    pub votes: NodeVotes,
}

/// Two-axis vote bookkeeping on top of a graph store.
///
/// One user holds at most one vote per `(node, axis)`. Content votes need
/// a content-eligible type and a positive inclusion net. Aggregates always
/// come back from the store's recount, never from local arithmetic.
pub struct VoteLedger<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> VoteLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Cast a vote. Casting the direction already held withdraws it.
    pub async fn cast_vote(
        &self,
        node_id: NodeId,
        user_id: &str,
        axis: VoteAxis,
        direction: VoteDirection,
    ) -> Result<VoteOutcome> {
        self.mutate(node_id, user_id, axis, VoteMutation::Cast(direction))
            .await
    }

    /// Withdraw the user's vote. A no-op when there is nothing to remove.
    pub async fn remove_vote(
        &self,
        node_id: NodeId,
        user_id: &str,
        axis: VoteAxis,
    ) -> Result<VoteOutcome> {
        self.mutate(node_id, user_id, axis, VoteMutation::Remove)
            .await
    }

    pub async fn get_user_vote_status(
        &self,
        node_id: NodeId,
        user_id: &str,
    ) -> Result<UserVoteStatus> {
        self.store.user_vote(node_id, user_id).await
    }

    /// Current aggregates for a node, shaped by its content eligibility.
    pub async fn get_votes(&self, node_id: NodeId) -> Result<NodeVotes> {
        let node = self
            .store
            .get_node(node_id)
            .await?
            .ok_or(ZeroError::NodeNotFound(node_id))?;
        let tally = self
            .store
            .vote_tallies(&[node_id])
            .await?
            .remove(&node_id)
            .unwrap_or_default();
        Ok(shape_votes(
            tally,
            registry::supports_content_voting(node.node_type),
        ))
    }

    async fn mutate(
        &self,
        node_id: NodeId,
        user_id: &str,
        axis: VoteAxis,
        mutation: VoteMutation,
    ) -> Result<VoteOutcome> {
        if user_id.trim().is_empty() {
            return Err(ZeroError::validation("a user is required to vote"));
        }

        let node = self
            .store
            .get_node(node_id)
            .await?
            .ok_or(ZeroError::NodeNotFound(node_id))?;

        let content_voting = registry::supports_content_voting(node.node_type);
        if axis == VoteAxis::Content && !content_voting {
            return Err(ZeroError::AxisNotEligible {
                node_id,
                axis,
                reason: format!("{} nodes only take inclusion votes", node.node_type),
            });
        }

        // The store refuses content casts below the inclusion threshold
        // inside the same write transaction.
        let tally = self.store.apply_vote(node_id, user_id, axis, mutation).await?;
        let status = self.store.user_vote(node_id, user_id).await?;

        log::debug!(
            "Vote {:?} on {} ({}) by {} -> {:?}",
            mutation,
            node_id,
            axis,
            user_id,
            status.get(axis)
        );

        Ok(VoteOutcome {
            node_id,
            axis,
            user_vote: status.get(axis),
            votes: shape_votes(tally, content_voting),
        })
    }
}

fn shape_votes(tally: VoteTally, content_voting: bool) -> NodeVotes {
    NodeVotes {
        inclusion: tally.aggregate(VoteAxis::Inclusion),
        content: content_voting.then(|| tally.aggregate(VoteAxis::Content)),
    }
}
