pub mod types;
pub mod storage;
pub mod error;
pub mod registry;
pub mod votes;
pub mod tags;
pub mod filter;
pub mod rank;
pub mod relationships;
pub mod enrich;
pub mod preferences;
pub mod feedback;
pub mod query;

pub use error::{Result, ZeroError};
pub use types::*;
pub use storage::{GraphStore, RedbGraphStore, CURRENT_SCHEMA_VERSION};
pub use registry::{capabilities, supports_content_voting, NodeRegistry, TypeCapabilities};
pub use votes::{VoteLedger, VoteOutcome};
pub use tags::{RelatedBy, RelatedNode, SharedKeyword, TagIndex};
pub use filter::{
    build_predicate, FilterContext, FilterSpec, InteractionFilter, InteractionMode, MatchMode,
    Predicate, SetFilter, TypeFilter,
};
pub use rank::{SortDirection, SortKey, SortSpec};
pub use relationships::{Edge, EdgeMetadata, RelationshipAssembler, RelationshipKind};
pub use enrich::ContextEnricher;
pub use preferences::Preferences;
pub use feedback::{Feedback, ReviewScores};
pub use query::{
    DiscoveryEngine, Pagination, PaginationInfo, PerformanceInfo, QueryConfig, QueryRequest,
    QueryResponse, RelationshipOptions,
};
