pub mod ingestion;
pub mod neo4j_store;
pub mod store;

pub use ingestion::{GraphIngestor, IngestionSummary};
pub use neo4j_store::Neo4jGraphStore;
pub use store::GraphStore;
