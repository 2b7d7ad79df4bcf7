use crate::types::{NodeId, NodeType, VoteAxis};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ZeroError>;

#[derive(Debug, Error)]
pub enum ZeroError {
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{axis} voting is not available on node {node_id}: {reason}")]
    AxisNotEligible {
        node_id: NodeId,
        axis: VoteAxis,
        reason: String,
    },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Category not found: {0}")]
    CategoryNotFound(NodeId),

    #[error("Query exceeded its {deadline_ms}ms deadline")]
    QueryTimeout { deadline_ms: u64 },

    #[error("Failed to fetch {node_type} nodes: {source}")]
    Fetch {
        node_type: NodeType,
        #[source]
        source: Box<ZeroError>,
    },
}

impl ZeroError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NodeNotFound(_) | Self::CategoryNotFound(_))
    }

    /// Message safe to show to API callers. Storage internals collapse
    /// into a generic message; request-level errors keep their detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(_)
            | Self::AxisNotEligible { .. }
            | Self::NodeNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::QueryTimeout { .. } => self.to_string(),
            Self::Fetch { node_type, source } => {
                if source.is_not_found() {
                    format!("query failed while loading {} nodes: {}", node_type, source)
                } else {
                    format!("query failed while loading {} nodes", node_type)
                }
            }
            _ => "query failed".to_string(),
        }
    }
}
