pub mod embedding;
pub mod ingestion;
pub mod memory_store;
pub mod qdrant_store;
pub mod vector_store;
