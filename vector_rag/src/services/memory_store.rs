use async_trait::async_trait;
use parking_lot::RwLock;

use crate::errors::{VectorError, VectorResult};
use crate::services::vector_store::{validate_search, SearchHit, VectorPoint, VectorStore};

/// Cosine-similarity store held in process memory.
///
/// Points keep their first insertion position, so equal scores always come
/// back in the same order.
pub struct InMemoryVectorStore {
    collection: String,
    dimension: usize,
    points: RwLock<Vec<VectorPoint>>,
}

impl InMemoryVectorStore {
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection: collection.into(),
            dimension,
            points: RwLock::new(Vec::new()),
        }
    }

    pub fn clear(&self) {
        self.points.write().clear();
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, points: Vec<VectorPoint>) -> VectorResult<usize> {
        if let Some(bad) = points.iter().find(|p| p.vector.len() != self.dimension) {
            return Err(VectorError::InvalidQuery(format!(
                "point {} has dimension {}, collection expects {}",
                bad.id,
                bad.vector.len(),
                self.dimension
            )));
        }

        let written = points.len();
        let mut stored = self.points.write();
        for point in points {
            match stored.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point,
                None => stored.push(point),
            }
        }
        Ok(written)
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> VectorResult<Vec<SearchHit>> {
        validate_search(vector, top_k, self.dimension)?;

        let stored = self.points.read();
        let mut hits: Vec<SearchHit> = stored
            .iter()
            .map(|p| SearchHit {
                id: p.id.to_string(),
                score: cosine_similarity(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self) -> VectorResult<u64> {
        Ok(self.points.read().len() as u64)
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
