use crate::error::{Result, ZeroError};
use crate::storage::GraphStore;
use crate::types::{
    NodeId, NodeType, PeerReview, PeerReviewSummary, RawNode, ResponseStatistics, TypeSpecific,
};
use futures::future::try_join_all;
use std::collections::HashMap;

/// Build the type payload for every node in `raws` (all of `node_type`).
pub(super) async fn build_payloads<S: GraphStore>(
    store: &S,
    node_type: NodeType,
    raws: &[RawNode],
) -> Result<HashMap<NodeId, TypeSpecific>> {
    match node_type {
        NodeType::Answer => answer_payloads(store, raws).await,
        NodeType::Evidence => evidence_payloads(store, raws).await,
        NodeType::Quantity => quantity_payloads(store, raws).await,
        NodeType::Definition => definition_payloads(store, raws).await,
        NodeType::Comment => Ok(raws
            .iter()
            .map(|raw| {
                (
                    raw.id,
                    TypeSpecific::Comment {
                        parent_id: raw.parent_id,
                    },
                )
            })
            .collect()),
        _ => Ok(HashMap::new()),
    }
}

async fn parents_of<S: GraphStore>(store: &S, raws: &[RawNode]) -> Result<HashMap<NodeId, RawNode>> {
    let ids: Vec<NodeId> = raws.iter().filter_map(|r| r.parent_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    store.get_nodes(&ids).await
}

async fn answer_payloads<S: GraphStore>(
    store: &S,
    raws: &[RawNode],
) -> Result<HashMap<NodeId, TypeSpecific>> {
    let questions = parents_of(store, raws).await?;

    let mut payloads = HashMap::with_capacity(raws.len());
    for raw in raws {
        let question_id = raw.parent_id.ok_or_else(|| {
            ZeroError::validation(format!("answer {} is not attached to a question", raw.id))
        })?;
        let question = questions
            .get(&question_id)
            .ok_or(ZeroError::NodeNotFound(question_id))?;
        payloads.insert(
            raw.id,
            TypeSpecific::Answer {
                question_id,
                question_text: question.content.clone(),
            },
        );
    }
    Ok(payloads)
}

async fn evidence_payloads<S: GraphStore>(
    store: &S,
    raws: &[RawNode],
) -> Result<HashMap<NodeId, TypeSpecific>> {
    let parents = parents_of(store, raws).await?;
    let reviews = try_join_all(raws.iter().map(|raw| store.peer_reviews(raw.id))).await?;

    Ok(raws
        .iter()
        .zip(reviews)
        .map(|(raw, reviews)| {
            let parent = raw.parent_id.and_then(|id| parents.get(&id));
            (
                raw.id,
                TypeSpecific::Evidence {
                    parent_id: raw.parent_id,
                    parent_type: parent.map(|p| p.node_type),
                    parent_text: parent.map(|p| p.content.clone()),
                    url: raw.attribute("url").map(str::to_string),
                    evidence_type: raw.attribute("evidence_type").map(str::to_string),
                    peer_review: summarize_peer_reviews(&reviews),
                },
            )
        })
        .collect())
}

async fn quantity_payloads<S: GraphStore>(
    store: &S,
    raws: &[RawNode],
) -> Result<HashMap<NodeId, TypeSpecific>> {
    let responses = try_join_all(raws.iter().map(|raw| store.quantity_responses(raw.id))).await?;

    Ok(raws
        .iter()
        .zip(responses)
        .map(|(raw, responses)| {
            let values: Vec<f64> = responses.iter().map(|r| r.value).collect();
            (
                raw.id,
                TypeSpecific::Quantity {
                    unit: raw.attribute("unit").map(str::to_string),
                    statistics: summarize_responses(&values),
                },
            )
        })
        .collect())
}

async fn definition_payloads<S: GraphStore>(
    store: &S,
    raws: &[RawNode],
) -> Result<HashMap<NodeId, TypeSpecific>> {
    let words = parents_of(store, raws).await?;

    Ok(raws
        .iter()
        .map(|raw| {
            let word = raw.parent_id.and_then(|id| words.get(&id));
            (
                raw.id,
                TypeSpecific::Definition {
                    word_id: raw.parent_id,
                    word: word.map(|w| w.content.clone()),
                },
            )
        })
        .collect())
}

/// Mean of each peer-review score across reviewers. `overall` is the mean
/// of the three dimension means.
pub fn summarize_peer_reviews(reviews: &[PeerReview]) -> PeerReviewSummary {
    if reviews.is_empty() {
        return PeerReviewSummary::default();
    }

    let n = reviews.len() as f64;
    let mean = |score: fn(&PeerReview) -> u8| reviews.iter().map(|r| score(r) as f64).sum::<f64>() / n;

    let quality = mean(|r| r.quality);
    let independence = mean(|r| r.independence);
    let relevance = mean(|r| r.relevance);

    PeerReviewSummary {
        count: reviews.len() as u32,
        quality,
        independence,
        relevance,
        overall: (quality + independence + relevance) / 3.0,
    }
}

/// Descriptive statistics over submitted values. `None` when nobody has
/// responded yet. Standard deviation is the population deviation.
pub fn summarize_responses(values: &[f64]) -> Option<ResponseStatistics> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    Some(ResponseStatistics {
        count: count as u32,
        min: sorted[0],
        max: sorted[count - 1],
        mean,
        median,
        std_dev: variance.sqrt(),
    })
}
