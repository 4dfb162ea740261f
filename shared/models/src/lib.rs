//! Shared data model for BioGraph.
//!
//! Ingestion-side records (papers, genes, datasets) mirror the JSON files
//! produced by the collection pipeline. Query-side records (candidates,
//! enrichment, answers) live for a single request only.

pub mod api;
pub mod dataset;
pub mod gene;
pub mod paper;
pub mod query;

pub use api::*;
pub use dataset::*;
pub use gene::*;
pub use paper::*;
pub use query::*;
