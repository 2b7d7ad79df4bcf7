mod redb_store;
mod traits;

pub use redb_store::{RedbGraphStore, CURRENT_SCHEMA_VERSION};
pub use traits::GraphStore;
