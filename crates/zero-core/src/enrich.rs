use crate::error::Result;
use crate::storage::GraphStore;
use crate::types::GraphNode;
use futures::future::try_join_all;
use std::sync::Arc;

/// Attaches the requesting user's vote status and visibility preference.
pub struct ContextEnricher<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> ContextEnricher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Look up both fields for every node concurrently. Anonymous requests
    /// pass through untouched, leaving both fields `None`.
    pub async fn enrich(&self, mut nodes: Vec<GraphNode>, user_id: Option<&str>) -> Result<Vec<GraphNode>> {
        let user_id = match user_id {
            Some(user) if !user.trim().is_empty() => user,
            _ => return Ok(nodes),
        };
        if nodes.is_empty() {
            return Ok(nodes);
        }

        let store = self.store.as_ref();
        let statuses = try_join_all(nodes.iter().map(|n| store.user_vote(n.id, user_id)));
        let visibility = try_join_all(nodes.iter().map(|n| store.visibility(n.id, user_id)));
        let (statuses, visibility) = futures::try_join!(statuses, visibility)?;

        for ((node, status), preference) in nodes.iter_mut().zip(statuses).zip(visibility) {
            node.user_vote_status = Some(status);
            node.user_visibility_preference = preference;
        }

        log::debug!("Enriched {} nodes for {}", nodes.len(), user_id);
        Ok(nodes)
    }
}
