use super::{
    parse_id, required_user, requesting_user, AppError, AppResult, AppState, JsonResponse,
    UniversalGraphParams,
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use zero_core::{
    DirectRelation, GraphStore, Keyword, NodeId, NodeType, NodeVotes, PeerReviewSummary,
    PreferenceSource, QueryResponse, RawNode, RelatedBy, RelatedNode, ResponseStatistics,
    ReviewScores, UserVoteStatus, VisibilityPreference, VoteAxis, VoteDirection, VoteOutcome,
    ZeroError,
};

const DEFAULT_RELATED_LIMIT: usize = 10;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/graph/universal", get(universal_graph))
        .route("/nodes", post(create_node))
        .route("/relations", post(create_relation))
        .route("/nodes/:id/vote", post(cast_vote).delete(remove_vote))
        .route("/nodes/:id/vote-status", get(vote_status))
        .route("/nodes/:id/related", get(related_nodes))
        .route("/nodes/:id/visibility", put(set_visibility))
        .route("/nodes/:id/peer-review", post(submit_peer_review))
        .route("/nodes/:id/responses", post(submit_response))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    healthy: bool,
    version: String,
    uptime_seconds: u64,
}

async fn health(State(state): State<AppState>) -> Json<JsonResponse<HealthResponse>> {
    Json(JsonResponse::ok(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}

async fn universal_graph(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<UniversalGraphParams>,
) -> AppResult<Json<JsonResponse<QueryResponse>>> {
    let request = params.into_request(requesting_user(&headers))?;
    let response = state.engine.query(request).await?;
    Ok(Json(JsonResponse::ok(response)))
}

#[derive(Deserialize)]
struct KeywordBody {
    word: String,
    frequency: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateNodeBody {
    node_type: NodeType,
    content: String,
    #[serde(default)]
    keywords: Vec<KeywordBody>,
    #[serde(default)]
    category_ids: Vec<NodeId>,
    parent_id: Option<NodeId>,
    discussion_id: Option<NodeId>,
    public_credit: Option<bool>,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

async fn create_node(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateNodeBody>,
) -> AppResult<(StatusCode, Json<JsonResponse<RawNode>>)> {
    let user = required_user(&headers)?;

    let mut node = RawNode::new(body.node_type, body.content, user)
        .with_keywords(
            body.keywords
                .into_iter()
                .map(|k| Keyword::new(k.word.trim(), k.frequency.unwrap_or(1.0)))
                .collect(),
        )
        .with_categories(body.category_ids);
    node.parent_id = body.parent_id;
    node.discussion_id = body.discussion_id;
    node.public_credit = body.public_credit.unwrap_or(true);
    node.attributes = body.attributes;

    let node = state.engine.registry().create(node).await?;
    tracing::info!("Created {} node {}", node.node_type, node.id);
    Ok((StatusCode::CREATED, Json(JsonResponse::ok(node))))
}

#[derive(Deserialize)]
struct CreateRelationBody {
    source: NodeId,
    target: NodeId,
}

async fn create_relation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateRelationBody>,
) -> AppResult<(StatusCode, Json<JsonResponse<DirectRelation>>)> {
    let user = required_user(&headers)?;
    if body.source == body.target {
        return Err(AppError::bad_request("a node cannot relate to itself"));
    }

    let store = state.engine.store();
    for id in [body.source, body.target] {
        if store.get_node(id).await?.is_none() {
            return Err(ZeroError::NodeNotFound(id).into());
        }
    }

    let relation = DirectRelation::new(body.source, body.target, user);
    store.put_relation(&relation).await?;
    Ok((StatusCode::CREATED, Json(JsonResponse::ok(relation))))
}

#[derive(Deserialize)]
struct CastVoteBody {
    axis: VoteAxis,
    direction: VoteDirection,
}

async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CastVoteBody>,
) -> AppResult<Json<JsonResponse<VoteOutcome>>> {
    let node_id = parse_id(&id)?;
    let user = required_user(&headers)?;
    let outcome = state
        .engine
        .votes()
        .cast_vote(node_id, &user, body.axis, body.direction)
        .await?;
    Ok(Json(JsonResponse::ok(outcome)))
}

#[derive(Deserialize)]
struct RemoveVoteQuery {
    axis: String,
}

async fn remove_vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<RemoveVoteQuery>,
) -> AppResult<Json<JsonResponse<VoteOutcome>>> {
    let node_id = parse_id(&id)?;
    let user = required_user(&headers)?;
    let axis: VoteAxis = query.axis.parse()?;
    let outcome = state.engine.votes().remove_vote(node_id, &user, axis).await?;
    Ok(Json(JsonResponse::ok(outcome)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteStatusResponse {
    votes: NodeVotes,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_vote_status: Option<UserVoteStatus>,
}

async fn vote_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<JsonResponse<VoteStatusResponse>>> {
    let node_id = parse_id(&id)?;
    let votes = state.engine.votes().get_votes(node_id).await?;
    let user_vote_status = match requesting_user(&headers) {
        Some(user) => Some(
            state
                .engine
                .votes()
                .get_user_vote_status(node_id, &user)
                .await?,
        ),
        None => None,
    };
    Ok(Json(JsonResponse::ok(VoteStatusResponse {
        votes,
        user_vote_status,
    })))
}

#[derive(Deserialize)]
struct RelatedQuery {
    by: Option<String>,
    limit: Option<usize>,
}

async fn related_nodes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RelatedQuery>,
) -> AppResult<Json<JsonResponse<Vec<RelatedNode>>>> {
    let node_id = parse_id(&id)?;
    let by = query
        .by
        .as_deref()
        .map(str::parse::<RelatedBy>)
        .transpose()?
        .unwrap_or_default();
    let related = state
        .engine
        .tags()
        .find_related(node_id, by, query.limit.unwrap_or(DEFAULT_RELATED_LIMIT))
        .await?;
    Ok(Json(JsonResponse::ok(related)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisibilityBody {
    is_visible: bool,
    source: Option<PreferenceSource>,
}

async fn set_visibility(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<VisibilityBody>,
) -> AppResult<Json<JsonResponse<VisibilityPreference>>> {
    let node_id = parse_id(&id)?;
    let user = required_user(&headers)?;
    let preference = state
        .engine
        .preferences()
        .set_visibility(
            node_id,
            &user,
            body.is_visible,
            body.source.unwrap_or(PreferenceSource::User),
        )
        .await?;
    Ok(Json(JsonResponse::ok(preference)))
}

async fn submit_peer_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(scores): Json<ReviewScores>,
) -> AppResult<Json<JsonResponse<PeerReviewSummary>>> {
    let node_id = parse_id(&id)?;
    let user = required_user(&headers)?;
    let summary = state
        .engine
        .feedback()
        .submit_peer_review(node_id, &user, scores)
        .await?;
    Ok(Json(JsonResponse::ok(summary)))
}

#[derive(Deserialize)]
struct ResponseBody {
    value: f64,
}

async fn submit_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ResponseBody>,
) -> AppResult<Json<JsonResponse<Option<ResponseStatistics>>>> {
    let node_id = parse_id(&id)?;
    let user = required_user(&headers)?;
    let statistics = state
        .engine
        .feedback()
        .submit_quantity_response(node_id, &user, body.value)
        .await?;
    Ok(Json(JsonResponse::ok(statistics)))
}
