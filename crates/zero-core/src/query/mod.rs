mod request;

pub use request::{
    Pagination, PaginationInfo, PerformanceInfo, QueryConfig, QueryRequest, QueryResponse,
    RelationshipOptions, MAX_PAGE_LIMIT,
};

use crate::enrich::ContextEnricher;
use crate::error::{Result, ZeroError};
use crate::feedback::Feedback;
use crate::filter::{build_predicate, FilterContext, FilterSpec, InteractionMode};
use crate::preferences::Preferences;
use crate::rank;
use crate::registry::NodeRegistry;
use crate::relationships::{count_by_kind, RelationshipAssembler};
use crate::storage::GraphStore;
use crate::tags::TagIndex;
use crate::types::{GraphNode, NodeId, NodeType};
use crate::votes::VoteLedger;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Facade over every engine component, sharing one store.
///
/// Holds no per-query state; one instance serves concurrent queries.
pub struct DiscoveryEngine<S: GraphStore> {
    config: QueryConfig,
    registry: NodeRegistry<S>,
    votes: VoteLedger<S>,
    tags: TagIndex<S>,
    enricher: ContextEnricher<S>,
    assembler: RelationshipAssembler<S>,
    preferences: Preferences<S>,
    feedback: Feedback<S>,
    store: Arc<S>,
}

impl<S: GraphStore> DiscoveryEngine<S> {
    pub fn new(store: Arc<S>, config: QueryConfig) -> Self {
        Self {
            config,
            registry: NodeRegistry::new(store.clone()),
            votes: VoteLedger::new(store.clone()),
            tags: TagIndex::new(store.clone()),
            enricher: ContextEnricher::new(store.clone()),
            assembler: RelationshipAssembler::new(store.clone()),
            preferences: Preferences::new(store.clone()),
            feedback: Feedback::new(store.clone()),
            store,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn registry(&self) -> &NodeRegistry<S> {
        &self.registry
    }

    pub fn votes(&self) -> &VoteLedger<S> {
        &self.votes
    }

    pub fn tags(&self) -> &TagIndex<S> {
        &self.tags
    }

    pub fn preferences(&self) -> &Preferences<S> {
        &self.preferences
    }

    pub fn feedback(&self) -> &Feedback<S> {
        &self.feedback
    }

    /// Run one discovery query under the configured deadline.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        request.validate(&self.config)?;

        let deadline_ms = self.config.deadline_ms;
        let deadline = Duration::from_millis(deadline_ms);
        let started = Instant::now();

        // In-memory stages never yield, so a late finish is caught here too.
        match tokio::time::timeout(deadline, self.execute(&request)).await {
            Ok(result) if started.elapsed() <= deadline => result,
            _ => {
                log::warn!(
                    "Query exceeded its {}ms deadline after {}ms",
                    deadline_ms,
                    started.elapsed().as_millis()
                );
                Err(ZeroError::QueryTimeout { deadline_ms })
            }
        }
    }

    async fn execute(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let started = Instant::now();
        let filter = &request.filter;

        self.check_categories(&filter.categories.values).await?;
        let context = self.filter_context(filter).await?;
        let predicate = build_predicate(filter, context);

        let candidates = self.fetch_all(predicate.types(), |n| predicate.matches(n)).await?;
        let total = candidates.len();
        let ranked = rank::sort(candidates, &request.sort, &filter.categories.values);

        let limit = request.limit(&self.config);
        let offset = request.pagination.offset;
        let page: Vec<GraphNode> = ranked.into_iter().skip(offset).take(limit).collect();

        let nodes = self
            .enricher
            .enrich(page, request.requesting_user_id.as_deref())
            .await?;

        let relationships = if request.relationships.include {
            self.assembler
                .assemble(&nodes, &request.relationships.kinds)
                .await?
        } else {
            Vec::new()
        };

        let performance = PerformanceInfo {
            node_count: nodes.len(),
            relationship_count: relationships.len(),
            query_time_ms: started.elapsed().as_millis() as u64,
        };
        log::debug!(
            "Query over {:?} matched {} nodes, returned {} with {} edges {:?} in {}ms",
            predicate.types(),
            total,
            performance.node_count,
            performance.relationship_count,
            count_by_kind(&relationships),
            performance.query_time_ms
        );

        Ok(QueryResponse {
            nodes,
            relationships,
            pagination: PaginationInfo {
                total,
                offset,
                limit,
                has_more: offset.saturating_add(limit) < total,
            },
            performance,
        })
    }

    /// Fetch every working type concurrently. Any failure discards the
    /// whole batch and names the type that failed.
    async fn fetch_all<F>(&self, types: &[NodeType], keep: F) -> Result<Vec<GraphNode>>
    where
        F: Fn(&GraphNode) -> bool + Sync,
    {
        let keep = &keep;
        let fetches = types.iter().map(|node_type| async move {
            self.registry
                .fetch(*node_type, keep)
                .await
                .map_err(|source| ZeroError::Fetch {
                    node_type: *node_type,
                    source: Box::new(source),
                })
        });

        let batches = try_join_all(fetches).await.map_err(|e| {
            log::warn!("Fan-out fetch failed: {}", e);
            e
        })?;
        Ok(batches.into_iter().flatten().collect())
    }

    /// Category filter values must name existing category nodes.
    async fn check_categories(&self, ids: &[NodeId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self.store.get_nodes(ids).await?;
        for id in ids {
            match found.get(id) {
                Some(node) if node.node_type == NodeType::Category => {}
                _ => return Err(ZeroError::CategoryNotFound(*id)),
            }
        }
        Ok(())
    }

    async fn filter_context(&self, filter: &FilterSpec) -> Result<FilterContext> {
        let interaction = &filter.user_interaction;
        match (interaction.mode, interaction.user_id.as_deref()) {
            (InteractionMode::Interacted, Some(user)) => Ok(FilterContext {
                interacted: self.store.interacted_node_ids(user).await?,
            }),
            _ => Ok(FilterContext::default()),
        }
    }
}

#[cfg(test)]
mod tests;
