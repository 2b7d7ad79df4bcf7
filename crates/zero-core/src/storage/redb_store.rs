use crate::error::{Result, ZeroError};
use crate::storage::traits::GraphStore;
use crate::types::{
    DirectRelation, NodeId, NodeType, PeerReview, QuantityResponse, RawNode, UserVoteStatus,
    VisibilityPreference, VoteAxis, VoteDirection, VoteMutation, VoteRecord, VoteTally,
};
use async_trait::async_trait;
use redb::{
    Database, MultimapTableDefinition, ReadableMultimapTable, ReadableTable, TableDefinition,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Table definitions
const NODES: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("nodes");
const TALLIES: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("vote_tallies");
const RELATIONS: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("relations");

// Slot tables keyed "{node}:{axis}:{user}" or "{node}:{user}" so a node's
// records form one contiguous key range.
const VOTES: TableDefinition<&str, u8> = TableDefinition::new("votes");
const PEER_REVIEWS: TableDefinition<&str, &[u8]> = TableDefinition::new("peer_reviews");
const RESPONSES: TableDefinition<&str, &[u8]> = TableDefinition::new("quantity_responses");
const VISIBILITY: TableDefinition<&str, &[u8]> = TableDefinition::new("visibility");

// Secondary indexes
const NODES_BY_TYPE: MultimapTableDefinition<&str, &[u8; 16]> =
    MultimapTableDefinition::new("nodes_by_type");
const NODES_BY_PARENT: MultimapTableDefinition<&[u8; 16], &[u8; 16]> =
    MultimapTableDefinition::new("nodes_by_parent");
const NODES_BY_CREATOR: MultimapTableDefinition<&str, &[u8; 16]> =
    MultimapTableDefinition::new("nodes_by_creator");
const VOTES_BY_USER: MultimapTableDefinition<&str, &[u8; 16]> =
    MultimapTableDefinition::new("votes_by_user");
const RELATIONS_BY_NODE: MultimapTableDefinition<&[u8; 16], &[u8; 16]> =
    MultimapTableDefinition::new("relations_by_node");

// Metadata table
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Embedded single-file graph store on redb.
pub struct RedbGraphStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbGraphStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ZeroError::Validation(format!("Failed to create directory: {}", e))
            })?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if !is_new {
            Self::check_schema_version(&db)?;
        }

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(NODES)?;
            let _ = write_txn.open_table(TALLIES)?;
            let _ = write_txn.open_table(RELATIONS)?;
            let _ = write_txn.open_table(VOTES)?;
            let _ = write_txn.open_table(PEER_REVIEWS)?;
            let _ = write_txn.open_table(RESPONSES)?;
            let _ = write_txn.open_table(VISIBILITY)?;
            let _ = write_txn.open_multimap_table(NODES_BY_TYPE)?;
            let _ = write_txn.open_multimap_table(NODES_BY_PARENT)?;
            let _ = write_txn.open_multimap_table(NODES_BY_CREATOR)?;
            let _ = write_txn.open_multimap_table(VOTES_BY_USER)?;
            let _ = write_txn.open_multimap_table(RELATIONS_BY_NODE)?;
            let mut meta = write_txn.open_table(META)?;
            if is_new {
                meta.insert(SCHEMA_VERSION_KEY, CURRENT_SCHEMA_VERSION.to_string().as_bytes())?;
            }
        }
        write_txn.commit()?;

        log::debug!("Opened graph store at {:?}", path);

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Check schema version. Returns error on mismatch.
    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = {
            let table = read_txn.open_table(META).ok();
            table
                .and_then(|t| {
                    t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                        std::str::from_utf8(v.value())
                            .ok()
                            .and_then(|s| s.parse::<u32>().ok())
                    })
                })
                .unwrap_or(CURRENT_SCHEMA_VERSION)
        };

        if version != CURRENT_SCHEMA_VERSION {
            return Err(ZeroError::Validation(format!(
                "Database schema v{} does not match this binary's v{}",
                version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn uuid_to_bytes(id: &NodeId) -> [u8; 16] {
        *id.as_bytes()
    }

    fn bytes_to_uuid(bytes: &[u8; 16]) -> NodeId {
        NodeId::from_bytes(*bytes)
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(ZeroError::from)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(ZeroError::from)
    }

    fn node_prefix(node_id: NodeId) -> String {
        format!("{}:", node_id)
    }

    fn slot_key(node_id: NodeId, user_id: &str) -> String {
        format!("{}:{}", node_id, user_id)
    }

    fn vote_key(node_id: NodeId, axis: VoteAxis, user_id: &str) -> String {
        format!("{}:{}:{}", node_id, axis.as_str(), user_id)
    }

    /// Collect `(key, direction)` pairs for every vote under a prefix
    fn scan_votes<T>(table: &T, prefix: &str) -> Result<Vec<(String, u8)>>
    where
        T: ReadableTable<&'static str, u8>,
    {
        let mut out = Vec::new();
        for entry in table.range(prefix..)? {
            let (key, value) = entry?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_string(), value.value()));
        }
        Ok(out)
    }

    /// Collect serialized records stored under a prefix
    fn scan_blobs<T>(table: &T, prefix: &str) -> Result<Vec<Vec<u8>>>
    where
        T: ReadableTable<&'static str, &'static [u8]>,
    {
        let mut out = Vec::new();
        for entry in table.range(prefix..)? {
            let (key, value) = entry?;
            if !key.value().starts_with(prefix) {
                break;
            }
            out.push(value.value().to_vec());
        }
        Ok(out)
    }

    /// Parse a vote key's `{axis}:{user}` suffix
    fn parse_vote_suffix(key: &str, prefix: &str) -> Option<(VoteAxis, String)> {
        let (axis, user) = key[prefix.len()..].split_once(':')?;
        let axis = match axis {
            "inclusion" => VoteAxis::Inclusion,
            "content" => VoteAxis::Content,
            _ => return None,
        };
        Some((axis, user.to_string()))
    }

    /// Rebuild a node's tally from its full vote record set
    fn recount<T>(votes: &T, node_id: NodeId) -> Result<VoteTally>
    where
        T: ReadableTable<&'static str, u8>,
    {
        let prefix = Self::node_prefix(node_id);
        let mut tally = VoteTally::default();
        for (key, direction) in Self::scan_votes(votes, &prefix)? {
            let parsed = Self::parse_vote_suffix(&key, &prefix)
                .zip(VoteDirection::from_u8(direction));
            match parsed {
                Some(((axis, _), direction)) => tally.count(axis, direction),
                None => log::warn!("Skipping malformed vote record {}", key),
            }
        }
        Ok(tally)
    }

    fn read_node<T>(table: &T, id: NodeId) -> Result<Option<RawNode>>
    where
        T: ReadableTable<&'static [u8; 16], &'static [u8]>,
    {
        match table.get(&Self::uuid_to_bytes(&id))? {
            Some(bytes) => Ok(Some(Self::decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn read_nodes_at<T>(table: &T, ids: impl IntoIterator<Item = NodeId>) -> Result<Vec<RawNode>>
    where
        T: ReadableTable<&'static [u8; 16], &'static [u8]>,
    {
        let mut nodes = Vec::new();
        for id in ids {
            if let Some(node) = Self::read_node(table, id)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn ids_under_name<T>(index: &T, key: &str) -> Result<Vec<NodeId>>
    where
        T: ReadableMultimapTable<&'static str, &'static [u8; 16]>,
    {
        index
            .get(key)?
            .map(|result| result.map(|guard| Self::bytes_to_uuid(guard.value())))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ZeroError::from)
    }

    fn ids_under_node<T>(index: &T, id: NodeId) -> Result<Vec<NodeId>>
    where
        T: ReadableMultimapTable<&'static [u8; 16], &'static [u8; 16]>,
    {
        index
            .get(&Self::uuid_to_bytes(&id))?
            .map(|result| result.map(|guard| Self::bytes_to_uuid(guard.value())))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ZeroError::from)
    }

    /// Update secondary indexes for a node
    fn update_node_indexes(
        txn: &redb::WriteTransaction,
        node: &RawNode,
        old_node: Option<&RawNode>,
    ) -> Result<()> {
        let id_bytes = Self::uuid_to_bytes(&node.id);

        {
            let mut type_table = txn.open_multimap_table(NODES_BY_TYPE)?;
            if let Some(old) = old_node {
                type_table.remove(old.node_type.as_str(), &id_bytes)?;
            }
            type_table.insert(node.node_type.as_str(), &id_bytes)?;
        }

        {
            let mut parent_table = txn.open_multimap_table(NODES_BY_PARENT)?;
            if let Some(old_parent) = old_node.and_then(|old| old.parent_id) {
                parent_table.remove(&Self::uuid_to_bytes(&old_parent), &id_bytes)?;
            }
            if let Some(parent) = node.parent_id {
                parent_table.insert(&Self::uuid_to_bytes(&parent), &id_bytes)?;
            }
        }

        {
            let mut creator_table = txn.open_multimap_table(NODES_BY_CREATOR)?;
            if let Some(old) = old_node {
                creator_table.remove(old.created_by.as_str(), &id_bytes)?;
            }
            creator_table.insert(node.created_by.as_str(), &id_bytes)?;
        }

        Ok(())
    }

    fn put_blob(
        db: &Database,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let write_txn = db.begin_write()?;
        {
            let mut t = write_txn.open_table(table)?;
            t.insert(key, bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn blobs_for_node<T: DeserializeOwned>(
        db: &Database,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        node_id: NodeId,
    ) -> Result<Vec<T>> {
        let read_txn = db.begin_read()?;
        let t = read_txn.open_table(table)?;
        Self::scan_blobs(&t, &Self::node_prefix(node_id))?
            .iter()
            .map(|bytes| Self::decode(bytes))
            .collect()
    }

    /// Run redb work on the blocking pool so callers get a real suspension
    /// point and concurrent calls proceed in parallel.
    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || work(&db)).await?
    }
}

#[async_trait]
impl GraphStore for RedbGraphStore {
    async fn put_node(&self, node: &RawNode) -> Result<()> {
        node.validate().map_err(ZeroError::Validation)?;
        let node = node.clone();

        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            let id_bytes = Self::uuid_to_bytes(&node.id);

            let old_node: Option<RawNode> = {
                let nodes_table = write_txn.open_table(NODES)?;
                let old_bytes = nodes_table.get(&id_bytes)?.map(|guard| guard.value().to_vec());
                old_bytes.map(|bytes| Self::decode(&bytes)).transpose()?
            };

            let node_bytes = Self::encode(&node)?;
            {
                let mut nodes_table = write_txn.open_table(NODES)?;
                nodes_table.insert(&id_bytes, node_bytes.as_slice())?;
            }

            Self::update_node_indexes(&write_txn, &node, old_node.as_ref())?;
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_node(&self, id: NodeId) -> Result<Option<RawNode>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(NODES)?;
            Self::read_node(&table, id)
        })
        .await
    }

    async fn get_nodes(&self, ids: &[NodeId]) -> Result<HashMap<NodeId, RawNode>> {
        let ids = ids.to_vec();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(NODES)?;
            let nodes = Self::read_nodes_at(&table, ids)?;
            Ok(nodes.into_iter().map(|n| (n.id, n)).collect())
        })
        .await
    }

    async fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<RawNode>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_multimap_table(NODES_BY_TYPE)?;
            let nodes_table = read_txn.open_table(NODES)?;

            let ids = Self::ids_under_name(&index, node_type.as_str())?;
            let mut nodes = Self::read_nodes_at(&nodes_table, ids)?;
            nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(nodes)
        })
        .await
    }

    async fn apply_vote(
        &self,
        node_id: NodeId,
        user_id: &str,
        axis: VoteAxis,
        mutation: VoteMutation,
    ) -> Result<VoteTally> {
        let user_id = user_id.to_string();

        self.blocking(move |db| {
            let id_bytes = Self::uuid_to_bytes(&node_id);
            let key = Self::vote_key(node_id, axis, &user_id);

            // One write transaction: gate, record, user index and tally commit together.
            let write_txn = db.begin_write()?;
            let tally = {
                let mut votes = write_txn.open_table(VOTES)?;

                if axis == VoteAxis::Content && matches!(mutation, VoteMutation::Cast(_)) {
                    let inclusion = Self::recount(&votes, node_id)?.aggregate(VoteAxis::Inclusion);
                    if inclusion.net() <= 0 {
                        return Err(ZeroError::AxisNotEligible {
                            node_id,
                            axis,
                            reason: format!(
                                "inclusion net is {}, content voting needs it above zero",
                                inclusion.net()
                            ),
                        });
                    }
                }

                let existing = votes
                    .get(key.as_str())?
                    .and_then(|guard| VoteDirection::from_u8(guard.value()));

                match mutation.resolve(existing) {
                    Some(direction) => {
                        votes.insert(key.as_str(), direction.to_u8())?;
                    }
                    None => {
                        votes.remove(key.as_str())?;
                    }
                }

                let mut still_voting = false;
                for other in [VoteAxis::Inclusion, VoteAxis::Content] {
                    let other_key = Self::vote_key(node_id, other, &user_id);
                    if votes.get(other_key.as_str())?.is_some() {
                        still_voting = true;
                    }
                }

                let mut by_user = write_txn.open_multimap_table(VOTES_BY_USER)?;
                if still_voting {
                    by_user.insert(user_id.as_str(), &id_bytes)?;
                } else {
                    by_user.remove(user_id.as_str(), &id_bytes)?;
                }

                let tally = Self::recount(&votes, node_id)?;
                let mut tallies = write_txn.open_table(TALLIES)?;
                tallies.insert(&id_bytes, Self::encode(&tally)?.as_slice())?;
                tally
            };
            write_txn.commit()?;

            Ok(tally)
        })
        .await
    }

    async fn vote_tallies(&self, ids: &[NodeId]) -> Result<HashMap<NodeId, VoteTally>> {
        let ids = ids.to_vec();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(TALLIES)?;

            let mut tallies = HashMap::with_capacity(ids.len());
            for id in ids {
                let tally = match table.get(&Self::uuid_to_bytes(&id))? {
                    Some(bytes) => Self::decode(bytes.value())?,
                    None => VoteTally::default(),
                };
                tallies.insert(id, tally);
            }
            Ok(tallies)
        })
        .await
    }

    async fn vote_records(&self, node_id: NodeId) -> Result<Vec<VoteRecord>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let votes = read_txn.open_table(VOTES)?;
            let prefix = Self::node_prefix(node_id);

            let mut records = Vec::new();
            for (key, direction) in Self::scan_votes(&votes, &prefix)? {
                let parsed = Self::parse_vote_suffix(&key, &prefix)
                    .zip(VoteDirection::from_u8(direction));
                if let Some(((axis, user_id), direction)) = parsed {
                    records.push(VoteRecord {
                        user_id,
                        node_id,
                        axis,
                        direction,
                    });
                }
            }
            Ok(records)
        })
        .await
    }

    async fn user_vote(&self, node_id: NodeId, user_id: &str) -> Result<UserVoteStatus> {
        let user_id = user_id.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let votes = read_txn.open_table(VOTES)?;

            let lookup = |axis: VoteAxis| -> Result<Option<VoteDirection>> {
                let key = Self::vote_key(node_id, axis, &user_id);
                Ok(votes
                    .get(key.as_str())?
                    .and_then(|guard| VoteDirection::from_u8(guard.value())))
            };

            Ok(UserVoteStatus {
                inclusion: lookup(VoteAxis::Inclusion)?,
                content: lookup(VoteAxis::Content)?,
            })
        })
        .await
    }

    async fn participant_counts(&self, ids: &[NodeId]) -> Result<HashMap<NodeId, u32>> {
        let ids = ids.to_vec();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let votes = read_txn.open_table(VOTES)?;
            let parents = read_txn.open_multimap_table(NODES_BY_PARENT)?;
            let nodes_table = read_txn.open_table(NODES)?;

            let mut counts = HashMap::with_capacity(ids.len());
            for id in ids {
                let prefix = Self::node_prefix(id);
                let mut users: HashSet<String> = Self::scan_votes(&votes, &prefix)?
                    .into_iter()
                    .filter_map(|(key, _)| Self::parse_vote_suffix(&key, &prefix))
                    .map(|(_, user)| user)
                    .collect();

                let child_ids = Self::ids_under_node(&parents, id)?;
                for child in Self::read_nodes_at(&nodes_table, child_ids)? {
                    if child.node_type == NodeType::Comment {
                        users.insert(child.created_by);
                    }
                }

                counts.insert(id, users.len() as u32);
            }
            Ok(counts)
        })
        .await
    }

    async fn interacted_node_ids(&self, user_id: &str) -> Result<HashSet<NodeId>> {
        let user_id = user_id.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let by_user = read_txn.open_multimap_table(VOTES_BY_USER)?;
            let by_creator = read_txn.open_multimap_table(NODES_BY_CREATOR)?;
            let nodes_table = read_txn.open_table(NODES)?;

            let mut ids: HashSet<NodeId> =
                Self::ids_under_name(&by_user, &user_id)?.into_iter().collect();

            let authored = Self::ids_under_name(&by_creator, &user_id)?;
            for node in Self::read_nodes_at(&nodes_table, authored)? {
                if node.node_type == NodeType::Comment {
                    if let Some(parent) = node.parent_id {
                        ids.insert(parent);
                    }
                }
            }
            Ok(ids)
        })
        .await
    }

    async fn put_relation(&self, relation: &DirectRelation) -> Result<()> {
        if relation.source == relation.target {
            return Err(ZeroError::Validation(
                "A node cannot be related to itself".to_string(),
            ));
        }
        let relation = relation.clone();

        self.blocking(move |db| {
            let source_bytes = Self::uuid_to_bytes(&relation.source);
            let target_bytes = Self::uuid_to_bytes(&relation.target);
            let relation_bytes = Self::uuid_to_bytes(&relation.id);

            let write_txn = db.begin_write()?;
            {
                let nodes_table = write_txn.open_table(NODES)?;
                for endpoint in [relation.source, relation.target] {
                    if nodes_table.get(&Self::uuid_to_bytes(&endpoint))?.is_none() {
                        return Err(ZeroError::NodeNotFound(endpoint));
                    }
                }
            }
            {
                let mut relations = write_txn.open_table(RELATIONS)?;
                relations.insert(&relation_bytes, Self::encode(&relation)?.as_slice())?;
            }
            {
                let mut index = write_txn.open_multimap_table(RELATIONS_BY_NODE)?;
                index.insert(&source_bytes, &relation_bytes)?;
                index.insert(&target_bytes, &relation_bytes)?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn relations_touching(&self, ids: &[NodeId]) -> Result<Vec<DirectRelation>> {
        let ids = ids.to_vec();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_multimap_table(RELATIONS_BY_NODE)?;
            let relations = read_txn.open_table(RELATIONS)?;

            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for id in ids {
                for relation_id in Self::ids_under_node(&index, id)? {
                    if !seen.insert(relation_id) {
                        continue;
                    }
                    if let Some(bytes) = relations.get(&Self::uuid_to_bytes(&relation_id))? {
                        out.push(Self::decode::<DirectRelation>(bytes.value())?);
                    }
                }
            }
            Ok(out)
        })
        .await
    }

    async fn put_peer_review(&self, review: &PeerReview) -> Result<()> {
        let key = Self::slot_key(review.node_id, &review.user_id);
        let bytes = Self::encode(review)?;
        self.blocking(move |db| Self::put_blob(db, PEER_REVIEWS, &key, &bytes))
            .await
    }

    async fn peer_reviews(&self, node_id: NodeId) -> Result<Vec<PeerReview>> {
        self.blocking(move |db| Self::blobs_for_node(db, PEER_REVIEWS, node_id))
            .await
    }

    async fn put_quantity_response(&self, response: &QuantityResponse) -> Result<()> {
        let key = Self::slot_key(response.node_id, &response.user_id);
        let bytes = Self::encode(response)?;
        self.blocking(move |db| Self::put_blob(db, RESPONSES, &key, &bytes))
            .await
    }

    async fn quantity_responses(&self, node_id: NodeId) -> Result<Vec<QuantityResponse>> {
        self.blocking(move |db| Self::blobs_for_node(db, RESPONSES, node_id))
            .await
    }

    async fn put_visibility(&self, preference: &VisibilityPreference) -> Result<()> {
        let key = Self::slot_key(preference.node_id, &preference.user_id);
        let bytes = Self::encode(preference)?;
        self.blocking(move |db| Self::put_blob(db, VISIBILITY, &key, &bytes))
            .await
    }

    async fn visibility(
        &self,
        node_id: NodeId,
        user_id: &str,
    ) -> Result<Option<VisibilityPreference>> {
        let key = Self::slot_key(node_id, user_id);
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(VISIBILITY)?;
            let preference = match table.get(key.as_str())? {
                Some(bytes) => Some(Self::decode(bytes.value())?),
                None => None,
            };
            Ok(preference)
        })
        .await
    }
}
