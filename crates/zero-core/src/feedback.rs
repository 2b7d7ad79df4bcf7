use crate::error::{Result, ZeroError};
use crate::registry::{summarize_peer_reviews, summarize_responses};
use crate::storage::GraphStore;
use crate::types::{
    NodeId, NodeType, PeerReview, PeerReviewSummary, QuantityResponse, RawNode,
    ResponseStatistics,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// One reviewer's scores, as submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewScores {
    pub quality: u8,
    pub independence: u8,
    pub relevance: u8,
}

impl ReviewScores {
    pub fn validate(&self) -> Result<()> {
        for (name, score) in [
            ("quality", self.quality),
            ("independence", self.independence),
            ("relevance", self.relevance),
        ] {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                return Err(ZeroError::validation(format!(
                    "{} score must be between {} and {}, got {}",
                    name, MIN_SCORE, MAX_SCORE, score
                )));
            }
        }
        Ok(())
    }
}

/// Peer reviews on evidence and numeric responses on quantities.
pub struct Feedback<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> Feedback<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn expect_type(&self, node_id: NodeId, expected: NodeType) -> Result<RawNode> {
        let node = self
            .store
            .get_node(node_id)
            .await?
            .ok_or(ZeroError::NodeNotFound(node_id))?;
        if node.node_type != expected {
            return Err(ZeroError::validation(format!(
                "node {} is a {}, not a {}",
                node_id, node.node_type, expected
            )));
        }
        Ok(node)
    }

    /// Record (or replace) a user's review and return the new summary.
    pub async fn submit_peer_review(
        &self,
        evidence_id: NodeId,
        user_id: &str,
        scores: ReviewScores,
    ) -> Result<PeerReviewSummary> {
        scores.validate()?;
        if user_id.trim().is_empty() {
            return Err(ZeroError::validation("a user is required to review"));
        }
        self.expect_type(evidence_id, NodeType::Evidence).await?;

        self.store
            .put_peer_review(&PeerReview {
                node_id: evidence_id,
                user_id: user_id.to_string(),
                quality: scores.quality,
                independence: scores.independence,
                relevance: scores.relevance,
                created_at: Utc::now(),
            })
            .await?;

        let reviews = self.store.peer_reviews(evidence_id).await?;
        Ok(summarize_peer_reviews(&reviews))
    }

    /// Record (or replace) a user's value and return the new statistics.
    pub async fn submit_quantity_response(
        &self,
        quantity_id: NodeId,
        user_id: &str,
        value: f64,
    ) -> Result<Option<ResponseStatistics>> {
        if !value.is_finite() {
            return Err(ZeroError::validation("response value must be a finite number"));
        }
        if user_id.trim().is_empty() {
            return Err(ZeroError::validation("a user is required to respond"));
        }
        self.expect_type(quantity_id, NodeType::Quantity).await?;

        self.store
            .put_quantity_response(&QuantityResponse {
                node_id: quantity_id,
                user_id: user_id.to_string(),
                value,
                created_at: Utc::now(),
            })
            .await?;

        let values: Vec<f64> = self
            .store
            .quantity_responses(quantity_id)
            .await?
            .iter()
            .map(|r| r.value)
            .collect();
        Ok(summarize_responses(&values))
    }
}
