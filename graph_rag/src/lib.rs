//! Graph side of BioGraph: the tool catalogue and the Neo4j adapter.

pub mod catalogue;
pub mod errors;
pub mod graph_db;
pub mod models;

pub use catalogue::{
    describe_catalogue, tool_definitions, GraphTool, GraphToolCall, ParamValue,
    CATALOGUE_VERSION, GRAPH_SCHEMA,
};
pub use errors::{GraphError, GraphResult};
pub use graph_db::{GraphIngestor, GraphStore, IngestionSummary, Neo4jGraphStore};
pub use models::GraphStats;
