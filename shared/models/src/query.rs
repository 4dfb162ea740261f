use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::gene::GeneRecord;
use crate::paper::{CitationNetwork, Paper};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Vector search plus LLM synthesis only
    Vector,
    /// Vector search, graph tool enrichment, then fused synthesis
    #[default]
    Hybrid,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Vector => "vector",
            QueryMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload stored alongside every paper vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperPayload {
    pub paper: Paper,
    #[serde(default)]
    pub citation_network: Option<CitationNetwork>,
    #[serde(default)]
    pub genes: Vec<GeneRecord>,
}

/// A paper retrieved by vector similarity for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
    /// Source identifier (PMID)
    pub id: String,
    pub score: f32,
    pub payload: PaperPayload,
}

impl CandidateDocument {
    pub fn paper(&self) -> &Paper {
        &self.payload.paper
    }
}

/// Sort by descending score. The sort is stable, so equal scores keep
/// their retrieval order.
pub fn rank_candidates(candidates: &mut [CandidateDocument]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub tool_name: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Markdown-flavored prose
    pub text: String,
    pub sources: Vec<CandidateDocument>,
    /// Keyed by catalogue tool name; always empty in vector mode
    pub enrichment: BTreeMap<String, EnrichmentResult>,
    pub query_type: QueryMode,
    /// Tools that were selected but failed or timed out
    pub failed_tools: Vec<String>,
}
