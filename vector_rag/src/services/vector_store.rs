use async_trait::async_trait;
use biograph_models::{rank_candidates, CandidateDocument, PaperPayload};
use serde_json::{Map, Value};

use crate::errors::{VectorError, VectorResult};

/// A vector with its payload, keyed by numeric PMID
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

impl VectorPoint {
    pub fn from_payload(id: u64, vector: Vec<f32>, payload: &PaperPayload) -> VectorResult<Self> {
        let payload = match serde_json::to_value(payload)? {
            Value::Object(map) => map,
            other => {
                return Err(VectorError::InvalidQuery(format!(
                    "payload must serialize to an object, got {other}"
                )))
            }
        };
        Ok(Self { id, vector, payload })
    }
}

/// One search result as returned by a store, best first
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: Map<String, Value>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite points by id. Returns the number written.
    async fn upsert(&self, points: Vec<VectorPoint>) -> VectorResult<usize>;

    /// At most `top_k` hits ordered by descending similarity.
    async fn search(&self, vector: &[f32], top_k: usize) -> VectorResult<Vec<SearchHit>>;

    async fn count(&self) -> VectorResult<u64>;

    fn collection_name(&self) -> &str;

    fn dimension(&self) -> usize;
}

pub(crate) fn validate_search(vector: &[f32], top_k: usize, dimension: usize) -> VectorResult<()> {
    if top_k == 0 {
        return Err(VectorError::InvalidQuery("top_k must be at least 1".to_string()));
    }
    if vector.len() != dimension {
        return Err(VectorError::InvalidQuery(format!(
            "query vector has dimension {}, collection expects {}",
            vector.len(),
            dimension
        )));
    }
    Ok(())
}

/// Turn raw hits into ranked candidates. Hits whose payload has no paper
/// are dropped.
pub fn into_candidates(hits: Vec<SearchHit>) -> Vec<CandidateDocument> {
    let mut candidates: Vec<CandidateDocument> = hits
        .into_iter()
        .filter_map(|hit| {
            if !hit.payload.contains_key("paper") {
                tracing::debug!(id = %hit.id, "Dropping hit without paper payload");
                return None;
            }
            match serde_json::from_value::<PaperPayload>(Value::Object(hit.payload)) {
                Ok(payload) => {
                    let id = if payload.paper.pmid.is_empty() {
                        hit.id
                    } else {
                        payload.paper.pmid.clone()
                    };
                    Some(CandidateDocument { id, score: hit.score, payload })
                }
                Err(e) => {
                    tracing::warn!(id = %hit.id, "Dropping hit with malformed payload: {}", e);
                    None
                }
            }
        })
        .collect();

    rank_candidates(&mut candidates);
    candidates
}
