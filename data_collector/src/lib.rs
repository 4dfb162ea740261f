//! Builds the paper and gene datasets from NCBI E-utilities.

pub mod errors;
pub mod services;

pub use errors::{CollectorError, CollectorResult};
pub use services::eutils::{EutilsClient, LinkSet, LinkSetDb};
pub use services::gene::GeneCollector;
pub use services::pubmed::PubMedCollector;
pub use services::pubmed_xml::parse_articles;
