use crate::error::{Result, ZeroError};
use crate::filter::FilterSpec;
use crate::rank::SortSpec;
use crate::relationships::{Edge, RelationshipKind};
use crate::types::{GraphNode, UserId};
use serde::{Deserialize, Serialize};

/// Hard ceiling on page size.
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Engine tuning, read from the `[query]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Deadline for one whole query, in milliseconds.
    pub deadline_ms: u64,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 5_000,
            default_limit: 200,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

impl QueryConfig {
    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = deadline_ms;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.deadline_ms == 0 {
            return Err("deadline_ms must be greater than zero".to_string());
        }
        if self.max_limit == 0 || self.max_limit > MAX_PAGE_LIMIT {
            return Err(format!("max_limit must be between 1 and {}", MAX_PAGE_LIMIT));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(format!(
                "default_limit must be between 1 and max_limit ({})",
                self.max_limit
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Pagination {
    /// `None` takes the configured default.
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipOptions {
    pub include: bool,
    /// Empty means every kind.
    pub kinds: Vec<RelationshipKind>,
}

impl Default for RelationshipOptions {
    fn default() -> Self {
        Self {
            include: true,
            kinds: Vec::new(),
        }
    }
}

/// One discovery query, already parsed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryRequest {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub pagination: Pagination,
    pub relationships: RelationshipOptions,
    pub requesting_user_id: Option<UserId>,
}

impl QueryRequest {
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.pagination = Pagination {
            limit: Some(limit),
            offset,
        };
        self
    }

    pub fn with_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.requesting_user_id = Some(user_id.into());
        self
    }

    pub fn without_relationships(mut self) -> Self {
        self.relationships.include = false;
        self
    }

    /// Page size after applying the configured default.
    pub fn limit(&self, config: &QueryConfig) -> usize {
        self.pagination.limit.unwrap_or(config.default_limit)
    }

    /// Everything checkable without touching the store.
    pub fn validate(&self, config: &QueryConfig) -> Result<()> {
        let limit = self.limit(config);
        if limit == 0 || limit > config.max_limit {
            return Err(ZeroError::validation(format!(
                "limit must be between 1 and {}, got {}",
                config.max_limit, limit
            )));
        }

        self.filter.validate()?;
        self.sort.validate(&self.filter)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInfo {
    pub node_count: usize,
    pub relationship_count: usize,
    pub query_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<Edge>,
    pub pagination: PaginationInfo,
    pub performance: PerformanceInfo,
}
