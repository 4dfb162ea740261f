pub mod eutils;
pub mod gene;
pub mod pubmed;
pub mod pubmed_xml;
