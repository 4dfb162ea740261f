use async_trait::async_trait;
use biograph_config::OpenAiSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{VectorError, VectorResult};

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>>;

    fn dimension(&self) -> usize;
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Client for the OpenAI-compatible `/embeddings` endpoint
pub struct OpenAiEmbeddingClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl OpenAiEmbeddingClient {
    pub fn new(settings: &OpenAiSettings, dimension: usize, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.expose().to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            dimension,
            timeout,
        }
    }

    /// Only the text-embedding-3 family accepts a `dimensions` parameter
    fn requested_dimensions(&self) -> Option<u32> {
        self.model
            .starts_with("text-embedding-3")
            .then_some(self.dimension as u32)
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
            dimensions: self.requested_dimensions(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VectorError::Timeout(format!("embedding request after {:?}", self.timeout))
                } else {
                    VectorError::Embedding(format!("transport failure: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::Embedding(format!(
                "API returned {}: {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| VectorError::Embedding(format!("malformed response: {}", e)))?;

        let embedding = body
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| VectorError::Embedding("no embedding returned".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(VectorError::Embedding(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
