//! Typed result rows, one struct per catalogue tool.
//!
//! Node properties can be missing on partially ingested graphs, so text
//! columns are optional.

use biograph_models::NodeCounts;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaboratorRow {
    pub collaborator: Option<String>,
    pub papers: i64,
    #[serde(default)]
    pub sample_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionPairRow {
    pub institution1: Option<String>,
    pub institution2: Option<String>,
    pub collaborations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPaperRow {
    pub pmid: Option<String>,
    pub title: Option<String>,
    pub shared_terms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoMentionedGeneRow {
    pub gene: Option<String>,
    pub shared_papers: i64,
    #[serde(default)]
    pub example_pmids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorPaperRow {
    pub pmid: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPaperRow {
    pub pmid: Option<String>,
    pub title: Option<String>,
    pub mesh_term: Option<String>,
    pub is_major_topic: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationRow {
    pub source_pmid: Option<String>,
    pub source_title: Option<String>,
    pub related_pmid: Option<String>,
    pub related_title: Option<String>,
    pub distance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProlificAuthorRow {
    pub author: Option<String>,
    pub paper_count: i64,
}

/// Node and relationship counts of the whole graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub papers: i64,
    pub authors: i64,
    pub mesh_terms: i64,
    pub genes: i64,
    pub citations: i64,
}

impl GraphStats {
    pub fn node_counts(&self) -> NodeCounts {
        NodeCounts {
            papers: self.papers.max(0) as u64,
            authors: self.authors.max(0) as u64,
            mesh_terms: self.mesh_terms.max(0) as u64,
            genes: self.genes.max(0) as u64,
        }
    }

    pub fn citation_relationships(&self) -> u64 {
        self.citations.max(0) as u64
    }
}
