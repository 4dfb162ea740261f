use async_trait::async_trait;
use biograph_config::QdrantSettings;
use qdrant_client::{
    prelude::*,
    qdrant::{
        point_id::PointIdOptions, value::Kind, vectors_config::Config,
        with_payload_selector::SelectorOptions, CountPoints, CreateCollection, Distance, ListValue,
        PointId, PointStruct, SearchPoints, Struct, Value as QdrantValue, VectorParams,
        VectorsConfig, WithPayloadSelector,
    },
};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use crate::errors::{VectorError, VectorResult};
use crate::services::vector_store::{validate_search, SearchHit, VectorPoint, VectorStore};

/// Vector store backed by a Qdrant collection with unnamed cosine vectors
pub struct QdrantVectorStore {
    client: QdrantClient,
    collection: String,
    dimension: usize,
}

fn unavailable(e: impl std::fmt::Display) -> VectorError {
    VectorError::StoreUnavailable(e.to_string())
}

impl QdrantVectorStore {
    pub fn new(settings: &QdrantSettings) -> VectorResult<Self> {
        let mut builder = QdrantClient::from_url(&settings.url);
        if let Some(key) = &settings.api_key {
            builder = builder.with_api_key(key.expose().to_string());
        }
        let client = builder.build().map_err(unavailable)?;

        Ok(Self {
            client,
            collection: settings.collection_name.clone(),
            dimension: settings.embedding_dimension,
        })
    }

    pub async fn collection_exists(&self) -> VectorResult<bool> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(unavailable)?
            .collections;
        Ok(collections.iter().any(|c| c.name == self.collection))
    }

    pub async fn create_collection(&self) -> VectorResult<()> {
        let request = CreateCollection {
            collection_name: self.collection.clone(),
            vectors_config: Some(VectorsConfig {
                config: Some(Config::Params(VectorParams {
                    size: self.dimension as u64,
                    distance: Distance::Cosine.into(),
                    ..Default::default()
                })),
            }),
            ..Default::default()
        };
        self.client
            .create_collection(&request)
            .await
            .map_err(unavailable)?;
        tracing::info!("✅ Created collection '{}' ({} dims)", self.collection, self.dimension);
        Ok(())
    }

    /// Create the collection unless it already exists
    pub async fn ensure_collection(&self) -> VectorResult<()> {
        if self.collection_exists().await? {
            tracing::debug!("Collection '{}' already exists", self.collection);
            return Ok(());
        }
        self.create_collection().await
    }

    pub async fn delete_collection(&self) -> VectorResult<()> {
        self.client
            .delete_collection(&self.collection)
            .await
            .map_err(unavailable)?;
        tracing::info!("🗑️ Deleted collection '{}'", self.collection);
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn upsert(&self, points: Vec<VectorPoint>) -> VectorResult<usize> {
        if points.is_empty() {
            return Ok(0);
        }
        let written = points.len();
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| PointStruct::new(p.id, p.vector, json_to_payload(p.payload)))
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .map_err(unavailable)?;
        Ok(written)
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> VectorResult<Vec<SearchHit>> {
        validate_search(vector, top_k, self.dimension)?;

        let request = SearchPoints {
            collection_name: self.collection.clone(),
            vector: vector.to_vec(),
            limit: top_k as u64,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            ..Default::default()
        };

        let response = self.client.search_points(&request).await.map_err(unavailable)?;
        Ok(response
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: point.id.as_ref().map(point_id_to_string).unwrap_or_default(),
                score: point.score,
                payload: payload_to_json(point.payload),
            })
            .collect())
    }

    async fn count(&self) -> VectorResult<u64> {
        let request = CountPoints {
            collection_name: self.collection.clone(),
            exact: Some(true),
            ..Default::default()
        };
        let response = self.client.count(&request).await.map_err(unavailable)?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn point_id_to_string(id: &PointId) -> String {
    match &id.point_id_options {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => String::new(),
    }
}

fn json_to_payload(map: Map<String, Value>) -> Payload {
    let mut payload = Payload::new();
    for (key, value) in map {
        payload.insert(key, json_to_value(value));
    }
    payload
}

fn json_to_value(value: Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_value).collect(),
        }),
        Value::Object(map) => Kind::StructValue(Struct {
            fields: map.into_iter().map(|(k, v)| (k, json_to_value(v))).collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn payload_to_json(payload: HashMap<String, QdrantValue>) -> Map<String, Value> {
    payload
        .into_iter()
        .map(|(key, value)| (key, value_to_json(value)))
        .collect()
}

fn value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(payload_to_json(s.fields)),
    }
}
