//! JSON contracts of the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::query::{Answer, CandidateDocument, QueryMode, Row};

/// Authors listed per source in API responses
pub const SOURCE_AUTHOR_LIMIT: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub query_type: QueryMode,
    /// Falls back to the configured default when absent
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub pmid: String,
    pub title: String,
    pub score: f32,
    pub journal: Option<String>,
    pub publication_date: Option<String>,
    pub authors: Vec<String>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl From<&CandidateDocument> for SourceDocument {
    fn from(doc: &CandidateDocument) -> Self {
        let paper = doc.paper();
        Self {
            pmid: paper.pmid.clone(),
            title: paper.title.clone(),
            score: doc.score,
            journal: non_empty(&paper.journal),
            publication_date: non_empty(&paper.publication_date),
            authors: paper
                .author_names()
                .take(SOURCE_AUTHOR_LIMIT)
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceDocument>,
    pub query_type: QueryMode,
    /// Tool name → result rows; `null` for vector queries
    pub neo4j_enrichment: Option<BTreeMap<String, Vec<Row>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_tools: Vec<String>,
}

impl From<&Answer> for QueryResponse {
    fn from(answer: &Answer) -> Self {
        let neo4j_enrichment = match answer.query_type {
            QueryMode::Vector => None,
            QueryMode::Hybrid => Some(
                answer
                    .enrichment
                    .iter()
                    .map(|(name, result)| (name.clone(), result.rows.clone()))
                    .collect(),
            ),
        };

        Self {
            answer: answer.text.clone(),
            sources: answer.sources.iter().map(SourceDocument::from).collect(),
            query_type: answer.query_type,
            neo4j_enrichment,
            failed_tools: answer.failed_tools.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub papers: u64,
    pub authors: u64,
    pub mesh_terms: u64,
    pub genes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub papers_indexed: u64,
    pub neo4j_nodes: NodeCounts,
    pub citation_relationships: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub services: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::{Author, Paper};
    use crate::query::{EnrichmentResult, PaperPayload};
    use serde_json::json;

    fn doc() -> CandidateDocument {
        let authors = ["A One", "B Two", "C Three", "D Four"]
            .iter()
            .map(|n| Author { name: n.to_string(), ..Default::default() })
            .collect();
        CandidateDocument {
            id: "31".to_string(),
            score: 0.83,
            payload: PaperPayload {
                paper: Paper {
                    pmid: "31".to_string(),
                    title: "HIV gag processing".to_string(),
                    journal: "Cell".to_string(),
                    authors,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_source_document_truncates_authors() {
        let source = SourceDocument::from(&doc());
        assert_eq!(source.authors, vec!["A One", "B Two", "C Three"]);
        assert_eq!(source.journal.as_deref(), Some("Cell"));
        assert_eq!(source.publication_date, None);
    }

    #[test]
    fn test_query_request_defaults() {
        let req: QueryRequest = serde_json::from_value(json!({"question": "q"})).unwrap();
        assert_eq!(req.query_type, QueryMode::Hybrid);
        assert_eq!(req.top_k, None);
    }

    #[test]
    fn test_vector_answer_has_null_enrichment() {
        let answer = Answer {
            text: "text".to_string(),
            sources: vec![doc()],
            enrichment: BTreeMap::new(),
            query_type: QueryMode::Vector,
            failed_tools: vec![],
        };
        let json = serde_json::to_value(QueryResponse::from(&answer)).unwrap();

        assert!(json["neo4j_enrichment"].is_null());
        assert_eq!(json["query_type"], "vector");
        assert!(json.get("failed_tools").is_none());
    }

    #[test]
    fn test_hybrid_answer_flattens_enrichment() {
        let mut row = Row::new();
        row.insert("gene".to_string(), json!("pol"));
        let mut enrichment = BTreeMap::new();
        enrichment.insert(
            "get_genes_in_same_papers".to_string(),
            EnrichmentResult {
                tool_name: "get_genes_in_same_papers".to_string(),
                rows: vec![row],
            },
        );
        let answer = Answer {
            text: "text".to_string(),
            sources: vec![],
            enrichment,
            query_type: QueryMode::Hybrid,
            failed_tools: vec!["get_prolific_authors".to_string()],
        };
        let json = serde_json::to_value(QueryResponse::from(&answer)).unwrap();

        assert_eq!(json["neo4j_enrichment"]["get_genes_in_same_papers"][0]["gene"], "pol");
        assert_eq!(json["failed_tools"][0], "get_prolific_authors");
    }
}
