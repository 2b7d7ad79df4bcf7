use crate::error::{Result, ZeroError};
use crate::storage::GraphStore;
use crate::types::{NodeId, PreferenceSource, VisibilityPreference};
use chrono::Utc;
use std::sync::Arc;

/// Per-user show/hide choices on nodes. Last write wins.
pub struct Preferences<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> Preferences<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn set_visibility(
        &self,
        node_id: NodeId,
        user_id: &str,
        is_visible: bool,
        source: PreferenceSource,
    ) -> Result<VisibilityPreference> {
        if user_id.trim().is_empty() {
            return Err(ZeroError::validation("a user is required to set visibility"));
        }
        if self.store.get_node(node_id).await?.is_none() {
            return Err(ZeroError::NodeNotFound(node_id));
        }

        let preference = VisibilityPreference {
            user_id: user_id.to_string(),
            node_id,
            is_visible,
            source,
            updated_at: Utc::now(),
        };
        self.store.put_visibility(&preference).await?;
        Ok(preference)
    }

    pub async fn get_visibility(
        &self,
        node_id: NodeId,
        user_id: &str,
    ) -> Result<Option<VisibilityPreference>> {
        self.store.visibility(node_id, user_id).await
    }
}
