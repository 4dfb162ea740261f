//! Embedding client, vector store adapters and paper ingestion.

pub mod errors;
pub mod services;

pub use errors::{VectorError, VectorResult};
pub use services::embedding::{EmbeddingClient, OpenAiEmbeddingClient};
pub use services::ingestion::{IngestionReport, PaperIngestor, DEFAULT_BATCH_SIZE};
pub use services::memory_store::InMemoryVectorStore;
pub use services::qdrant_store::QdrantVectorStore;
pub use services::vector_store::{into_candidates, SearchHit, VectorPoint, VectorStore};
