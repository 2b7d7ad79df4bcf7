use super::*;
use crate::filter::{InteractionFilter, MatchMode, SetFilter, TypeFilter};
use crate::rank::{SortDirection, SortKey, SortSpec};
use crate::relationships::RelationshipKind;
use crate::storage::RedbGraphStore;
use crate::types::{
    DirectRelation, Keyword, PeerReview, QuantityResponse, RawNode, UserVoteStatus,
    VisibilityPreference, VoteAxis, VoteDirection, VoteMutation, VoteRecord, VoteTally,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tempfile::TempDir;

fn create_engine() -> (DiscoveryEngine<RedbGraphStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(RedbGraphStore::open(temp_dir.path().join("query.redb")).unwrap());
    (DiscoveryEngine::new(store, QueryConfig::default()), temp_dir)
}

async fn create<S: GraphStore>(engine: &DiscoveryEngine<S>, node: RawNode) -> RawNode {
    engine.registry().create(node).await.unwrap()
}

async fn vote<S: GraphStore>(
    engine: &DiscoveryEngine<S>,
    id: NodeId,
    axis: VoteAxis,
    agree: usize,
    disagree: usize,
) {
    for i in 0..agree {
        engine
            .votes()
            .cast_vote(id, &format!("agree-{}", i), axis, VoteDirection::Agree)
            .await
            .unwrap();
    }
    for i in 0..disagree {
        engine
            .votes()
            .cast_vote(id, &format!("disagree-{}", i), axis, VoteDirection::Disagree)
            .await
            .unwrap();
    }
}

fn types_of(response: &QueryResponse) -> HashSet<NodeType> {
    response.nodes.iter().map(|n| n.node_type).collect()
}

fn ids_of(response: &QueryResponse) -> Vec<NodeId> {
    response.nodes.iter().map(|n| n.id).collect()
}

fn only_types(values: Vec<NodeType>) -> FilterSpec {
    FilterSpec {
        node_types: TypeFilter {
            values,
            include: true,
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_default_dataset_is_primary_types_by_net_inclusion() {
    let (engine, _temp) = create_engine();

    let claim = create(&engine, RawNode::new(NodeType::Claim, "Claim", "u")).await;
    let question = create(&engine, RawNode::new(NodeType::Question, "Question?", "u")).await;
    create(&engine, RawNode::new(NodeType::Word, "entropy", "u")).await;
    create(&engine, RawNode::new(NodeType::Category, "Physics", "u")).await;

    vote(&engine, question.id, VoteAxis::Inclusion, 3, 0).await;
    vote(&engine, claim.id, VoteAxis::Inclusion, 1, 0).await;

    let response = engine.query(QueryRequest::default()).await.unwrap();
    assert_eq!(ids_of(&response), vec![question.id, claim.id]);
    assert_eq!(response.pagination.limit, 200);
    assert_eq!(response.pagination.total, 2);
    assert!(!response.pagination.has_more);
    assert_eq!(response.performance.node_count, 2);
}

#[tokio::test]
async fn test_answer_filter_brings_questions() {
    let (engine, _temp) = create_engine();

    let question = create(&engine, RawNode::new(NodeType::Question, "Is light a wave?", "u")).await;
    let answer = create(
        &engine,
        RawNode::new(NodeType::Answer, "Both", "u").with_parent(question.id),
    )
    .await;
    create(&engine, RawNode::new(NodeType::Claim, "Unrelated", "u")).await;

    let request = QueryRequest::default().with_filter(only_types(vec![NodeType::Answer]));
    let response = engine.query(request).await.unwrap();

    assert_eq!(
        types_of(&response),
        [NodeType::Answer, NodeType::Question].into_iter().collect()
    );
    let edges: Vec<_> = response
        .relationships
        .iter()
        .filter(|e| e.kind == RelationshipKind::Answers)
        .collect();
    assert_eq!(edges.len(), 1);
    assert_eq!((edges[0].source, edges[0].target), (answer.id, question.id));
}

#[tokio::test]
async fn test_net_content_sort_falls_back_to_inclusion() {
    let (engine, _temp) = create_engine();

    let a = create(&engine, RawNode::new(NodeType::Claim, "A", "u")).await;
    let b = create(&engine, RawNode::new(NodeType::Question, "B?", "u")).await;
    let c = create(&engine, RawNode::new(NodeType::Claim, "C", "u")).await;

    vote(&engine, a.id, VoteAxis::Inclusion, 3, 0).await;
    vote(&engine, a.id, VoteAxis::Content, 3, 0).await;
    vote(&engine, b.id, VoteAxis::Inclusion, 3, 0).await;
    vote(&engine, c.id, VoteAxis::Inclusion, 1, 0).await;
    vote(&engine, c.id, VoteAxis::Content, 5, 0).await;

    let request = QueryRequest::default()
        .with_sort(SortSpec::new(SortKey::NetContentVotes, SortDirection::Desc))
        .without_relationships();
    let response = engine.query(request).await.unwrap();

    let mut tied = vec![a.id, b.id];
    tied.sort();
    assert_eq!(ids_of(&response), vec![c.id, tied[0], tied[1]]);

    let question = response.nodes.iter().find(|n| n.id == b.id).unwrap();
    assert!(question.votes.content.is_none());
    assert!(response.relationships.is_empty());
}

#[tokio::test]
async fn test_pagination_and_edges_stay_inside_page() {
    let (engine, _temp) = create_engine();

    let mut created = Vec::new();
    for i in 0..5 {
        let node = create(
            &engine,
            RawNode::new(NodeType::Claim, format!("Claim {}", i), "u")
                .with_keywords(vec![Keyword::new("shared", 1.0)]),
        )
        .await;
        vote(&engine, node.id, VoteAxis::Inclusion, 5 - i, 0).await;
        created.push(node.id);
    }

    let request = QueryRequest::default().with_page(2, 1);
    let response = engine.query(request).await.unwrap();

    assert_eq!(ids_of(&response), created[1..3].to_vec());
    assert_eq!(response.pagination.total, 5);
    assert!(response.pagination.has_more);

    let present: HashSet<NodeId> = ids_of(&response).into_iter().collect();
    assert_eq!(response.relationships.len(), 1);
    for edge in &response.relationships {
        assert!(present.contains(&edge.source));
        assert!(present.contains(&edge.target));
    }

    let last = engine
        .query(QueryRequest::default().with_page(2, 4))
        .await
        .unwrap();
    assert_eq!(last.nodes.len(), 1);
    assert!(!last.pagination.has_more);
}

#[tokio::test]
async fn test_keyword_filters() {
    let (engine, _temp) = create_engine();

    let both = create(
        &engine,
        RawNode::new(NodeType::Claim, "Both", "u")
            .with_keywords(vec![Keyword::new("a", 1.0), Keyword::new("b", 1.0)]),
    )
    .await;
    let only_a = create(
        &engine,
        RawNode::new(NodeType::Claim, "Only a", "u").with_keywords(vec![Keyword::new("a", 1.0)]),
    )
    .await;
    create(&engine, RawNode::new(NodeType::Claim, "None", "u")).await;

    let keywords = |mode| FilterSpec {
        keywords: SetFilter {
            values: vec!["a".to_string(), "B".to_string()],
            mode,
            include: true,
        },
        ..Default::default()
    };

    let all = engine
        .query(QueryRequest::default().with_filter(keywords(MatchMode::All)))
        .await
        .unwrap();
    assert_eq!(ids_of(&all), vec![both.id]);

    let any = engine
        .query(QueryRequest::default().with_filter(keywords(MatchMode::Any)))
        .await
        .unwrap();
    let any_ids: HashSet<NodeId> = ids_of(&any).into_iter().collect();
    assert_eq!(any_ids, [both.id, only_a.id].into_iter().collect());

    let empty = engine
        .query(QueryRequest::default().with_filter(FilterSpec {
            keywords: SetFilter {
                values: Vec::new(),
                mode: MatchMode::All,
                include: false,
            },
            ..Default::default()
        }))
        .await
        .unwrap();
    let unfiltered = engine.query(QueryRequest::default()).await.unwrap();
    assert_eq!(empty.pagination.total, unfiltered.pagination.total);
    assert_eq!(empty.pagination.total, 3);
}

#[tokio::test]
async fn test_category_filter_and_overlap_sort() {
    let (engine, _temp) = create_engine();

    let physics = create(&engine, RawNode::new(NodeType::Category, "Physics", "u")).await;
    let maths = create(&engine, RawNode::new(NodeType::Category, "Maths", "u")).await;
    let one = create(
        &engine,
        RawNode::new(NodeType::Claim, "One", "u").with_categories(vec![physics.id]),
    )
    .await;
    let two = create(
        &engine,
        RawNode::new(NodeType::Claim, "Two", "u").with_categories(vec![physics.id, maths.id]),
    )
    .await;

    let filter = FilterSpec {
        categories: SetFilter {
            values: vec![physics.id, maths.id],
            mode: MatchMode::Any,
            include: true,
        },
        ..Default::default()
    };
    let request = QueryRequest::default()
        .with_filter(filter)
        .with_sort(SortSpec::new(SortKey::CategoryOverlap, SortDirection::Asc));
    let response = engine.query(request).await.unwrap();
    assert_eq!(ids_of(&response), vec![two.id, one.id]);

    let unfiltered_overlap = QueryRequest::default()
        .with_sort(SortSpec::new(SortKey::CategoryOverlap, SortDirection::Desc));
    assert!(matches!(
        engine.query(unfiltered_overlap).await,
        Err(ZeroError::Validation(_))
    ));

    let unknown = QueryRequest::default().with_filter(FilterSpec {
        categories: SetFilter {
            values: vec![one.id],
            ..Default::default()
        },
        ..Default::default()
    });
    assert!(matches!(
        engine.query(unknown).await,
        Err(ZeroError::CategoryNotFound(id)) if id == one.id
    ));
}

#[tokio::test]
async fn test_user_interaction_filters() {
    let (engine, _temp) = create_engine();

    let mine = create(&engine, RawNode::new(NodeType::Claim, "Mine", "alice")).await;
    let voted = create(&engine, RawNode::new(NodeType::Claim, "Voted", "bob")).await;
    let commented = create(&engine, RawNode::new(NodeType::Claim, "Commented", "bob")).await;
    create(&engine, RawNode::new(NodeType::Claim, "Untouched", "bob")).await;

    engine
        .votes()
        .cast_vote(voted.id, "alice", VoteAxis::Inclusion, VoteDirection::Disagree)
        .await
        .unwrap();
    create(
        &engine,
        RawNode::new(NodeType::Comment, "Nice", "alice").with_parent(commented.id),
    )
    .await;

    let by_mode = |mode| {
        QueryRequest::default().with_filter(FilterSpec {
            user_interaction: InteractionFilter {
                mode,
                user_id: Some("alice".into()),
            },
            ..Default::default()
        })
    };

    let created = engine.query(by_mode(InteractionMode::Created)).await.unwrap();
    assert_eq!(ids_of(&created), vec![mine.id]);

    let interacted = engine
        .query(by_mode(InteractionMode::Interacted))
        .await
        .unwrap();
    let ids: HashSet<NodeId> = ids_of(&interacted).into_iter().collect();
    assert_eq!(ids, [voted.id, commented.id].into_iter().collect());

    let commented_node = interacted
        .nodes
        .iter()
        .find(|n| n.id == commented.id)
        .unwrap();
    assert_eq!(commented_node.participant_count, 1);
}

#[tokio::test]
async fn test_enrichment_follows_requesting_user() {
    let (engine, _temp) = create_engine();

    let claim = create(&engine, RawNode::new(NodeType::Claim, "Claim", "u")).await;
    engine
        .votes()
        .cast_vote(claim.id, "alice", VoteAxis::Inclusion, VoteDirection::Agree)
        .await
        .unwrap();

    let anonymous = engine.query(QueryRequest::default()).await.unwrap();
    assert!(anonymous.nodes[0].user_vote_status.is_none());
    let json = serde_json::to_value(&anonymous.nodes[0]).unwrap();
    assert!(json["userVoteStatus"].is_null());
    assert!(json["userVisibilityPreference"].is_null());

    let personal = engine
        .query(QueryRequest::default().with_user("alice"))
        .await
        .unwrap();
    assert_eq!(
        personal.nodes[0].user_vote_status,
        Some(UserVoteStatus {
            inclusion: Some(VoteDirection::Agree),
            content: None,
        })
    );
}

#[tokio::test]
async fn test_validation_happens_before_store_access() {
    let temp_dir = TempDir::new().unwrap();
    let inner = RedbGraphStore::open(temp_dir.path().join("faulty.redb")).unwrap();
    let store = Arc::new(FaultyStore::new(inner).failing_everything());
    let engine = DiscoveryEngine::new(store, QueryConfig::default());

    let request = QueryRequest::default()
        .with_sort(SortSpec::new(SortKey::CategoryOverlap, SortDirection::Desc));
    assert!(matches!(
        engine.query(request).await,
        Err(ZeroError::Validation(_))
    ));
}

#[tokio::test]
async fn test_failed_type_fetch_names_the_type() {
    let temp_dir = TempDir::new().unwrap();
    let inner = RedbGraphStore::open(temp_dir.path().join("faulty.redb")).unwrap();
    let store = Arc::new(FaultyStore::new(inner).failing_type(NodeType::Quantity));
    let engine = DiscoveryEngine::new(store, QueryConfig::default());

    let err = engine.query(QueryRequest::default()).await.unwrap_err();
    match &err {
        ZeroError::Fetch { node_type, .. } => assert_eq!(*node_type, NodeType::Quantity),
        other => panic!("expected a fetch error, got {:?}", other),
    }
    let message = err.public_message();
    assert!(message.contains("quantity"));
    assert!(!message.contains("disk"));
}

#[tokio::test]
async fn test_deadline_yields_timeout() {
    let temp_dir = TempDir::new().unwrap();
    let inner = RedbGraphStore::open(temp_dir.path().join("slow.redb")).unwrap();
    let store = Arc::new(FaultyStore::new(inner).with_delay(Duration::from_millis(500)));
    let engine = DiscoveryEngine::new(store, QueryConfig::default().with_deadline_ms(20));

    assert!(matches!(
        engine.query(QueryRequest::default()).await,
        Err(ZeroError::QueryTimeout { deadline_ms: 20 })
    ));
}

#[tokio::test]
async fn test_deadline_enforced_against_redb_store() {
    let (engine, _temp) = create_engine();
    for i in 0..400 {
        let node = RawNode::new(NodeType::Claim, format!("Claim {}", i), "u")
            .with_keywords(vec![Keyword::new("gravity", 1.0), Keyword::new("mass", 2.0)]);
        engine.store().put_node(&node).await.unwrap();
    }

    let relaxed = engine
        .query(QueryRequest::default().with_page(1000, 0).without_relationships())
        .await
        .unwrap();
    assert_eq!(relaxed.nodes.len(), 400);

    let store = engine.store().clone();
    let strict = DiscoveryEngine::new(store, QueryConfig::default().with_deadline_ms(1));
    assert!(matches!(
        strict.query(QueryRequest::default().with_page(1000, 0)).await,
        Err(ZeroError::QueryTimeout { deadline_ms: 1 })
    ));
}

/// Delegating store that can fail or stall node reads.
struct FaultyStore {
    inner: RedbGraphStore,
    fail: Option<NodeType>,
    fail_all: bool,
    delay: Option<Duration>,
}

impl FaultyStore {
    fn new(inner: RedbGraphStore) -> Self {
        Self {
            inner,
            fail: None,
            fail_all: false,
            delay: None,
        }
    }

    fn failing_type(mut self, node_type: NodeType) -> Self {
        self.fail = Some(node_type);
        self
    }

    fn failing_everything(mut self) -> Self {
        self.fail_all = true;
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn broken() -> ZeroError {
        ZeroError::StorageOperation(redb::StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk unplugged",
        )))
    }

    fn check(&self) -> crate::error::Result<()> {
        if self.fail_all {
            Err(Self::broken())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GraphStore for FaultyStore {
    async fn put_node(&self, node: &RawNode) -> crate::error::Result<()> {
        self.inner.put_node(node).await
    }

    async fn get_node(&self, id: NodeId) -> crate::error::Result<Option<RawNode>> {
        self.check()?;
        self.inner.get_node(id).await
    }

    async fn get_nodes(&self, ids: &[NodeId]) -> crate::error::Result<HashMap<NodeId, RawNode>> {
        self.check()?;
        self.inner.get_nodes(ids).await
    }

    async fn nodes_by_type(&self, node_type: NodeType) -> crate::error::Result<Vec<RawNode>> {
        self.check()?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail == Some(node_type) {
            return Err(Self::broken());
        }
        self.inner.nodes_by_type(node_type).await
    }

    async fn apply_vote(
        &self,
        node_id: NodeId,
        user_id: &str,
        axis: VoteAxis,
        mutation: VoteMutation,
    ) -> crate::error::Result<VoteTally> {
        self.inner.apply_vote(node_id, user_id, axis, mutation).await
    }

    async fn vote_tallies(&self, ids: &[NodeId]) -> crate::error::Result<HashMap<NodeId, VoteTally>> {
        self.inner.vote_tallies(ids).await
    }

    async fn vote_records(&self, node_id: NodeId) -> crate::error::Result<Vec<VoteRecord>> {
        self.inner.vote_records(node_id).await
    }

    async fn user_vote(&self, node_id: NodeId, user_id: &str) -> crate::error::Result<UserVoteStatus> {
        self.inner.user_vote(node_id, user_id).await
    }

    async fn participant_counts(&self, ids: &[NodeId]) -> crate::error::Result<HashMap<NodeId, u32>> {
        self.inner.participant_counts(ids).await
    }

    async fn interacted_node_ids(&self, user_id: &str) -> crate::error::Result<HashSet<NodeId>> {
        self.inner.interacted_node_ids(user_id).await
    }

    async fn put_relation(&self, relation: &DirectRelation) -> crate::error::Result<()> {
        self.inner.put_relation(relation).await
    }

    async fn relations_touching(&self, ids: &[NodeId]) -> crate::error::Result<Vec<DirectRelation>> {
        self.inner.relations_touching(ids).await
    }

    async fn put_peer_review(&self, review: &PeerReview) -> crate::error::Result<()> {
        self.inner.put_peer_review(review).await
    }

    async fn peer_reviews(&self, node_id: NodeId) -> crate::error::Result<Vec<PeerReview>> {
        self.inner.peer_reviews(node_id).await
    }

    async fn put_quantity_response(&self, response: &QuantityResponse) -> crate::error::Result<()> {
        self.inner.put_quantity_response(response).await
    }

    async fn quantity_responses(&self, node_id: NodeId) -> crate::error::Result<Vec<QuantityResponse>> {
        self.inner.quantity_responses(node_id).await
    }

    async fn put_visibility(&self, preference: &VisibilityPreference) -> crate::error::Result<()> {
        self.inner.put_visibility(preference).await
    }

    async fn visibility(
        &self,
        node_id: NodeId,
        user_id: &str,
    ) -> crate::error::Result<Option<VisibilityPreference>> {
        self.inner.visibility(node_id, user_id).await
    }
}
