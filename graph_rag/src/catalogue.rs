//! The closed set of graph queries the LLM may ask for.
//!
//! Every tool is a fixed Cypher statement. Arguments are deserialized into
//! typed records, validated, and bound as query parameters.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::errors::{GraphError, GraphResult};

pub const CATALOGUE_VERSION: u32 = 1;

const MAX_TEXT_ARG_LEN: usize = 200;
const MAX_TOPICS: usize = 10;
const MAX_CITATION_DEPTH: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphTool {
    CollaboratorsWithTopics,
    CollaboratingInstitutions,
    RelatedPapersByMesh,
    GenesInSamePapers,
    PapersByAuthor,
    PapersByMeshTerm,
    CitationNetwork,
    ProlificAuthors,
}

impl GraphTool {
    pub const ALL: [GraphTool; 8] = [
        GraphTool::CollaboratorsWithTopics,
        GraphTool::CollaboratingInstitutions,
        GraphTool::RelatedPapersByMesh,
        GraphTool::GenesInSamePapers,
        GraphTool::PapersByAuthor,
        GraphTool::PapersByMeshTerm,
        GraphTool::CitationNetwork,
        GraphTool::ProlificAuthors,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GraphTool::CollaboratorsWithTopics => "get_collaborators_with_topics",
            GraphTool::CollaboratingInstitutions => "get_collaborating_institutions",
            GraphTool::RelatedPapersByMesh => "get_related_papers_by_mesh",
            GraphTool::GenesInSamePapers => "get_genes_in_same_papers",
            GraphTool::PapersByAuthor => "get_papers_by_author",
            GraphTool::PapersByMeshTerm => "get_papers_by_mesh_term",
            GraphTool::CitationNetwork => "get_citation_network",
            GraphTool::ProlificAuthors => "get_prolific_authors",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            GraphTool::CollaboratorsWithTopics => {
                "Get collaborators of an author on papers tagged with the given MeSH topics."
            }
            GraphTool::CollaboratingInstitutions => {
                "Get pairs of institutions whose authors frequently co-author papers."
            }
            GraphTool::RelatedPapersByMesh => {
                "Get papers sharing the most MeSH terms with a given PMID."
            }
            GraphTool::GenesInSamePapers => {
                "Find genes that co-occur in the same papers as a target gene, optionally \
                 restricted to papers with a MeSH topic (e.g. 'cancer', 'HIV'). Reveals \
                 potential biological associations based on co-mention frequency."
            }
            GraphTool::PapersByAuthor => "List papers written by an author, newest first.",
            GraphTool::PapersByMeshTerm => {
                "List papers indexed with a MeSH term, major topics first."
            }
            GraphTool::CitationNetwork => {
                "Get papers citing or cited by a PMID, up to a number of citation hops."
            }
            GraphTool::ProlificAuthors => "List authors with at least a number of papers.",
        }
    }

    /// Maximum rows a single invocation returns
    pub fn row_limit(&self) -> i64 {
        match self {
            GraphTool::PapersByAuthor
            | GraphTool::PapersByMeshTerm
            | GraphTool::CitationNetwork
            | GraphTool::ProlificAuthors
            | GraphTool::CollaboratingInstitutions => 25,
            _ => 10,
        }
    }

    /// JSON schema of the argument record
    pub fn parameters(&self) -> Value {
        match self {
            GraphTool::CollaboratorsWithTopics => json!({
                "type": "object",
                "properties": {
                    "author_name": {"type": "string", "description": "Full or partial author name"},
                    "topics": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "MeSH topic substrings"
                    },
                    "require_all": {
                        "type": "boolean",
                        "description": "Require every topic instead of any"
                    }
                },
                "required": ["author_name", "topics"]
            }),
            GraphTool::CollaboratingInstitutions => json!({
                "type": "object",
                "properties": {"min_collaborations": {"type": "integer", "minimum": 1}},
                "required": ["min_collaborations"]
            }),
            GraphTool::RelatedPapersByMesh => json!({
                "type": "object",
                "properties": {"pmid": {"type": "string", "description": "PubMed ID"}},
                "required": ["pmid"]
            }),
            GraphTool::GenesInSamePapers => json!({
                "type": "object",
                "properties": {
                    "target_gene": {
                        "type": "string",
                        "description": "Name or alias of the target gene (e.g. 'TP53', 'CCR5', 'gag'). Case-insensitive partial match."
                    },
                    "mesh_filter": {
                        "type": "string",
                        "description": "Optional MeSH term substring restricting the papers considered"
                    }
                },
                "required": ["target_gene"]
            }),
            GraphTool::PapersByAuthor => json!({
                "type": "object",
                "properties": {"author_name": {"type": "string"}},
                "required": ["author_name"]
            }),
            GraphTool::PapersByMeshTerm => json!({
                "type": "object",
                "properties": {"mesh_term": {"type": "string"}},
                "required": ["mesh_term"]
            }),
            GraphTool::CitationNetwork => json!({
                "type": "object",
                "properties": {
                    "pmid": {"type": "string"},
                    "depth": {"type": "integer", "minimum": 1, "maximum": MAX_CITATION_DEPTH}
                },
                "required": ["pmid"]
            }),
            GraphTool::ProlificAuthors => json!({
                "type": "object",
                "properties": {"min_papers": {"type": "integer", "minimum": 1}},
                "required": ["min_papers"]
            }),
        }
    }

    /// Chat-completions `tools` entry
    pub fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }

    pub fn cypher(&self) -> &'static str {
        match self {
            GraphTool::CollaboratorsWithTopics => COLLABORATORS_WITH_TOPICS,
            GraphTool::CollaboratingInstitutions => COLLABORATING_INSTITUTIONS,
            GraphTool::RelatedPapersByMesh => RELATED_PAPERS_BY_MESH,
            GraphTool::GenesInSamePapers => GENES_IN_SAME_PAPERS,
            GraphTool::PapersByAuthor => PAPERS_BY_AUTHOR,
            GraphTool::PapersByMeshTerm => PAPERS_BY_MESH_TERM,
            GraphTool::CitationNetwork => CITATION_NETWORK,
            GraphTool::ProlificAuthors => PROLIFIC_AUTHORS,
        }
    }
}

impl fmt::Display for GraphTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All tool definitions, in catalogue order
pub fn tool_definitions() -> Vec<Value> {
    GraphTool::ALL.iter().map(GraphTool::definition).collect()
}

/// Human-readable listing for prompts
pub fn describe_catalogue() -> String {
    GraphTool::ALL
        .iter()
        .map(|tool| format!("- {}: {} Arguments: {}", tool.name(), tool.description(), tool.parameters()["properties"]))
        .collect::<Vec<_>>()
        .join("\n")
}

pub const GRAPH_SCHEMA: &str = "\
Nodes:
- Paper {pmid, title, abstract, publication_date, doi}
- Author {name}
- Institution {name}
- MeshTerm {ui, term}
- Qualifier {name}
- Journal {name}
- Gene {gene_id, name, description, chromosome, map_location, organism, aliases, designations}

Relationships:
- (Author)-[:WROTE]->(Paper)
- (Author)-[:AFFILIATED_WITH]->(Institution)
- (Paper)-[:HAS_MESH_TERM {major_topic}]->(MeshTerm)
- (MeshTerm)-[:HAS_QUALIFIER]->(Qualifier)
- (Paper)-[:PUBLISHED_IN]->(Journal)
- (Paper)-[:CITES]->(Paper)
- (Gene)-[:MENTIONED_IN]->(Paper)";

const COLLABORATORS_WITH_TOPICS: &str = "
MATCH (a1:Author)-[:WROTE]->(p:Paper)<-[:WROTE]-(a2:Author)
WHERE toLower(a1.name) CONTAINS toLower($author_name) AND a1 <> a2
WITH DISTINCT a2, p
WHERE CASE WHEN $require_all
    THEN ALL(topic IN $topics WHERE EXISTS {
        MATCH (p)-[:HAS_MESH_TERM]->(t:MeshTerm) WHERE toLower(t.term) CONTAINS toLower(topic) })
    ELSE ANY(topic IN $topics WHERE EXISTS {
        MATCH (p)-[:HAS_MESH_TERM]->(t:MeshTerm) WHERE toLower(t.term) CONTAINS toLower(topic) })
    END
MATCH (p)-[:HAS_MESH_TERM]->(m:MeshTerm)
WHERE ANY(topic IN $topics WHERE toLower(m.term) CONTAINS toLower(topic))
RETURN a2.name AS collaborator,
       COUNT(DISTINCT p) AS papers,
       COLLECT(DISTINCT m.term)[0..3] AS sample_topics
ORDER BY papers DESC, collaborator
LIMIT $limit";

const COLLABORATING_INSTITUTIONS: &str = "
MATCH (i1:Institution)<-[:AFFILIATED_WITH]-(:Author)-[:WROTE]->(p:Paper)
      <-[:WROTE]-(:Author)-[:AFFILIATED_WITH]->(i2:Institution)
WHERE i1.name < i2.name
WITH i1, i2, COUNT(DISTINCT p) AS collaborations
WHERE collaborations >= $min_collaborations
RETURN i1.name AS institution1, i2.name AS institution2, collaborations
ORDER BY collaborations DESC, institution1, institution2
LIMIT $limit";

const RELATED_PAPERS_BY_MESH: &str = "
MATCH (p1:Paper {pmid: $pmid})-[:HAS_MESH_TERM]->(m:MeshTerm)<-[:HAS_MESH_TERM]-(p2:Paper)
WHERE p1 <> p2
WITH p2, COUNT(DISTINCT m) AS shared_terms
RETURN p2.pmid AS pmid, p2.title AS title, shared_terms
ORDER BY shared_terms DESC, pmid
LIMIT $limit";

const GENES_IN_SAME_PAPERS: &str = "
MATCH (g:Gene)
WHERE toLower(g.name) CONTAINS toLower($target_gene)
   OR toLower(g.aliases) CONTAINS toLower($target_gene)
MATCH (g)-[:MENTIONED_IN]->(p:Paper)
WHERE $mesh_filter = '' OR EXISTS {
    MATCH (p)-[:HAS_MESH_TERM]->(m:MeshTerm) WHERE toLower(m.term) CONTAINS toLower($mesh_filter) }
MATCH (p)<-[:MENTIONED_IN]-(g2:Gene)
WHERE g2 <> g
RETURN g2.name AS gene,
       COUNT(DISTINCT p) AS shared_papers,
       COLLECT(DISTINCT p.pmid)[..5] AS example_pmids
ORDER BY shared_papers DESC, gene
LIMIT $limit";

const PAPERS_BY_AUTHOR: &str = "
MATCH (a:Author)-[:WROTE]->(p:Paper)
WHERE toLower(a.name) CONTAINS toLower($author_name)
RETURN p.pmid AS pmid, p.title AS title, p.publication_date AS date, a.name AS author
ORDER BY date DESC, pmid
LIMIT $limit";

const PAPERS_BY_MESH_TERM: &str = "
MATCH (p:Paper)-[r:HAS_MESH_TERM]->(m:MeshTerm)
WHERE toLower(m.term) CONTAINS toLower($mesh_term)
RETURN p.pmid AS pmid, p.title AS title, m.term AS mesh_term, r.major_topic AS is_major_topic
ORDER BY is_major_topic DESC, p.publication_date DESC, pmid
LIMIT $limit";

const CITATION_NETWORK: &str = "
MATCH path = (p:Paper {pmid: $pmid})-[:CITES*1..3]-(cited:Paper)
WHERE length(path) <= $depth AND cited <> p
WITH p, cited, MIN(length(path)) AS distance
RETURN p.pmid AS source_pmid, p.title AS source_title,
       cited.pmid AS related_pmid, cited.title AS related_title, distance
ORDER BY distance, related_title
LIMIT $limit";

const PROLIFIC_AUTHORS: &str = "
MATCH (a:Author)-[:WROTE]->(p:Paper)
WITH a, COUNT(DISTINCT p) AS paper_count
WHERE paper_count >= $min_papers
RETURN a.name AS author, paper_count
ORDER BY paper_count DESC, author
LIMIT $limit";

/// PMIDs sometimes arrive as JSON numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn default_depth() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorsArgs {
    pub author_name: String,
    pub topics: Vec<String>,
    #[serde(default)]
    pub require_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionsArgs {
    pub min_collaborations: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmidArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub pmid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneCoMentionArgs {
    pub target_gene: String,
    #[serde(default)]
    pub mesh_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorArgs {
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTermArgs {
    pub mesh_term: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationArgs {
    #[serde(deserialize_with = "string_or_number")]
    pub pmid: String,
    #[serde(default = "default_depth")]
    pub depth: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProlificAuthorsArgs {
    pub min_papers: i64,
}

/// A validated request to run one catalogue tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum GraphToolCall {
    GetCollaboratorsWithTopics(CollaboratorsArgs),
    GetCollaboratingInstitutions(InstitutionsArgs),
    GetRelatedPapersByMesh(PmidArgs),
    GetGenesInSamePapers(GeneCoMentionArgs),
    GetPapersByAuthor(AuthorArgs),
    GetPapersByMeshTerm(MeshTermArgs),
    GetCitationNetwork(CitationArgs),
    GetProlificAuthors(ProlificAuthorsArgs),
}

/// Query parameter value bound to a Cypher statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Flag(bool),
    TextList(Vec<String>),
}

fn clean_text(tool: GraphTool, field: &str, value: String) -> GraphResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GraphError::invalid(tool.name(), format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_TEXT_ARG_LEN {
        return Err(GraphError::invalid(
            tool.name(),
            format!("{field} exceeds {MAX_TEXT_ARG_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn clean_pmid(tool: GraphTool, value: String) -> GraphResult<String> {
    let pmid = clean_text(tool, "pmid", value)?;
    if !pmid.chars().all(|c| c.is_ascii_digit()) {
        return Err(GraphError::invalid(tool.name(), format!("pmid '{pmid}' is not numeric")));
    }
    Ok(pmid)
}

fn at_least_one(tool: GraphTool, field: &str, value: i64) -> GraphResult<i64> {
    if value < 1 {
        return Err(GraphError::invalid(tool.name(), format!("{field} must be at least 1")));
    }
    Ok(value)
}

impl GraphToolCall {
    /// Parse and validate an LLM tool directive. `arguments` is the raw JSON
    /// string the model produced.
    pub fn from_raw(name: &str, arguments: &str) -> GraphResult<Self> {
        let tool = GraphTool::from_name(name)
            .ok_or_else(|| GraphError::UnknownTool(name.to_string()))?;

        let arguments: Value = if arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(arguments)
                .map_err(|e| GraphError::invalid(name, format!("arguments are not JSON: {e}")))?
        };
        if !arguments.is_object() {
            return Err(GraphError::invalid(name, "arguments must be a JSON object"));
        }

        let call: GraphToolCall =
            serde_json::from_value(json!({ "name": tool.name(), "arguments": arguments }))
                .map_err(|e| GraphError::invalid(name, e.to_string()))?;
        call.validated()
    }

    pub fn tool(&self) -> GraphTool {
        match self {
            GraphToolCall::GetCollaboratorsWithTopics(_) => GraphTool::CollaboratorsWithTopics,
            GraphToolCall::GetCollaboratingInstitutions(_) => GraphTool::CollaboratingInstitutions,
            GraphToolCall::GetRelatedPapersByMesh(_) => GraphTool::RelatedPapersByMesh,
            GraphToolCall::GetGenesInSamePapers(_) => GraphTool::GenesInSamePapers,
            GraphToolCall::GetPapersByAuthor(_) => GraphTool::PapersByAuthor,
            GraphToolCall::GetPapersByMeshTerm(_) => GraphTool::PapersByMeshTerm,
            GraphToolCall::GetCitationNetwork(_) => GraphTool::CitationNetwork,
            GraphToolCall::GetProlificAuthors(_) => GraphTool::ProlificAuthors,
        }
    }

    pub fn name(&self) -> &'static str {
        self.tool().name()
    }

    /// Check argument ranges and normalize text fields
    pub fn validated(self) -> GraphResult<Self> {
        let tool = self.tool();
        let call = match self {
            GraphToolCall::GetCollaboratorsWithTopics(args) => {
                let topics = args
                    .topics
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>();
                if topics.is_empty() {
                    return Err(GraphError::invalid(tool.name(), "at least one topic is required"));
                }
                if topics.len() > MAX_TOPICS {
                    return Err(GraphError::invalid(
                        tool.name(),
                        format!("at most {MAX_TOPICS} topics are allowed"),
                    ));
                }
                let topics = topics
                    .into_iter()
                    .map(|t| clean_text(tool, "topic", t))
                    .collect::<GraphResult<Vec<_>>>()?;
                GraphToolCall::GetCollaboratorsWithTopics(CollaboratorsArgs {
                    author_name: clean_text(tool, "author_name", args.author_name)?,
                    topics,
                    require_all: args.require_all,
                })
            }
            GraphToolCall::GetCollaboratingInstitutions(args) => {
                GraphToolCall::GetCollaboratingInstitutions(InstitutionsArgs {
                    min_collaborations: at_least_one(
                        tool,
                        "min_collaborations",
                        args.min_collaborations,
                    )?,
                })
            }
            GraphToolCall::GetRelatedPapersByMesh(args) => {
                GraphToolCall::GetRelatedPapersByMesh(PmidArgs {
                    pmid: clean_pmid(tool, args.pmid)?,
                })
            }
            GraphToolCall::GetGenesInSamePapers(args) => {
                let mesh_filter = match args.mesh_filter {
                    Some(filter) if !filter.trim().is_empty() => {
                        Some(clean_text(tool, "mesh_filter", filter)?)
                    }
                    _ => None,
                };
                GraphToolCall::GetGenesInSamePapers(GeneCoMentionArgs {
                    target_gene: clean_text(tool, "target_gene", args.target_gene)?,
                    mesh_filter,
                })
            }
            GraphToolCall::GetPapersByAuthor(args) => GraphToolCall::GetPapersByAuthor(AuthorArgs {
                author_name: clean_text(tool, "author_name", args.author_name)?,
            }),
            GraphToolCall::GetPapersByMeshTerm(args) => {
                GraphToolCall::GetPapersByMeshTerm(MeshTermArgs {
                    mesh_term: clean_text(tool, "mesh_term", args.mesh_term)?,
                })
            }
            GraphToolCall::GetCitationNetwork(args) => {
                if !(1..=MAX_CITATION_DEPTH).contains(&args.depth) {
                    return Err(GraphError::invalid(
                        tool.name(),
                        format!("depth must be between 1 and {MAX_CITATION_DEPTH}"),
                    ));
                }
                GraphToolCall::GetCitationNetwork(CitationArgs {
                    pmid: clean_pmid(tool, args.pmid)?,
                    depth: args.depth,
                })
            }
            GraphToolCall::GetProlificAuthors(args) => {
                GraphToolCall::GetProlificAuthors(ProlificAuthorsArgs {
                    min_papers: at_least_one(tool, "min_papers", args.min_papers)?,
                })
            }
        };
        Ok(call)
    }

    pub fn cypher(&self) -> &'static str {
        self.tool().cypher()
    }

    /// Parameters for [`Self::cypher`], including the row limit
    pub fn params(&self) -> Vec<(&'static str, ParamValue)> {
        let mut params = match self {
            GraphToolCall::GetCollaboratorsWithTopics(args) => vec![
                ("author_name", ParamValue::Text(args.author_name.clone())),
                ("topics", ParamValue::TextList(args.topics.clone())),
                ("require_all", ParamValue::Flag(args.require_all)),
            ],
            GraphToolCall::GetCollaboratingInstitutions(args) => vec![(
                "min_collaborations",
                ParamValue::Integer(args.min_collaborations),
            )],
            GraphToolCall::GetRelatedPapersByMesh(args) => {
                vec![("pmid", ParamValue::Text(args.pmid.clone()))]
            }
            GraphToolCall::GetGenesInSamePapers(args) => vec![
                ("target_gene", ParamValue::Text(args.target_gene.clone())),
                (
                    "mesh_filter",
                    ParamValue::Text(args.mesh_filter.clone().unwrap_or_default()),
                ),
            ],
            GraphToolCall::GetPapersByAuthor(args) => {
                vec![("author_name", ParamValue::Text(args.author_name.clone()))]
            }
            GraphToolCall::GetPapersByMeshTerm(args) => {
                vec![("mesh_term", ParamValue::Text(args.mesh_term.clone()))]
            }
            GraphToolCall::GetCitationNetwork(args) => vec![
                ("pmid", ParamValue::Text(args.pmid.clone())),
                ("depth", ParamValue::Integer(args.depth)),
            ],
            GraphToolCall::GetProlificAuthors(args) => {
                vec![("min_papers", ParamValue::Integer(args.min_papers))]
            }
        };
        params.push(("limit", ParamValue::Integer(self.tool().row_limit())));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_names_round_trip() {
        let names: HashSet<_> = GraphTool::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), GraphTool::ALL.len());
        for tool in GraphTool::ALL {
            assert_eq!(GraphTool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(GraphTool::from_name("drop_database"), None);
    }

    #[test]
    fn test_definitions_declare_required_arguments() {
        for definition in tool_definitions() {
            assert_eq!(definition["type"], "function");
            let params = &definition["function"]["parameters"];
            let properties = params["properties"].as_object().unwrap();
            for required in params["required"].as_array().unwrap() {
                assert!(properties.contains_key(required.as_str().unwrap()));
            }
        }
    }

    #[test]
    fn test_from_raw_genes() {
        let call = GraphToolCall::from_raw(
            "get_genes_in_same_papers",
            r#"{"target_gene": " gag ", "mesh_filter": "  "}"#,
        )
        .unwrap();
        assert_eq!(
            call,
            GraphToolCall::GetGenesInSamePapers(GeneCoMentionArgs {
                target_gene: "gag".to_string(),
                mesh_filter: None,
            })
        );
    }

    #[test]
    fn test_unknown_tool_rejected() {
        let err = GraphToolCall::from_raw("run_cypher", r#"{"query": "MATCH (n) DELETE n"}"#)
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownTool(name) if name == "run_cypher"));
    }

    #[test]
    fn test_missing_required_argument() {
        let err = GraphToolCall::from_raw("get_papers_by_author", "{}").unwrap_err();
        assert!(matches!(err, GraphError::InvalidArguments { .. }));
    }

    #[test]
    fn test_malformed_json_arguments() {
        let err = GraphToolCall::from_raw("get_prolific_authors", "{min_papers: 2").unwrap_err();
        assert!(matches!(err, GraphError::InvalidArguments { .. }));
        let err = GraphToolCall::from_raw("get_prolific_authors", "[2]").unwrap_err();
        assert!(matches!(err, GraphError::InvalidArguments { .. }));
    }

    #[test]
    fn test_numeric_ranges() {
        assert!(GraphToolCall::from_raw("get_prolific_authors", r#"{"min_papers": 0}"#).is_err());
        assert!(GraphToolCall::from_raw(
            "get_collaborating_institutions",
            r#"{"min_collaborations": -3}"#
        )
        .is_err());
        assert!(GraphToolCall::from_raw("get_citation_network", r#"{"pmid": "1", "depth": 4}"#)
            .is_err());
        assert!(GraphToolCall::from_raw("get_citation_network", r#"{"pmid": "1", "depth": 3}"#)
            .is_ok());
    }

    #[test]
    fn test_citation_depth_default_and_numeric_pmid() {
        let call = GraphToolCall::from_raw("get_citation_network", r#"{"pmid": 31415}"#).unwrap();
        assert_eq!(
            call,
            GraphToolCall::GetCitationNetwork(CitationArgs {
                pmid: "31415".to_string(),
                depth: 1,
            })
        );
    }

    #[test]
    fn test_pmid_must_be_numeric() {
        let err = GraphToolCall::from_raw("get_related_papers_by_mesh", r#"{"pmid": "1' OR 1=1"}"#)
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidArguments { .. }));
    }

    #[test]
    fn test_topics_are_required_and_trimmed() {
        assert!(GraphToolCall::from_raw(
            "get_collaborators_with_topics",
            r#"{"author_name": "Smith", "topics": ["", " "]}"#
        )
        .is_err());

        let call = GraphToolCall::from_raw(
            "get_collaborators_with_topics",
            r#"{"author_name": "Smith", "topics": [" HIV ", "Vaccines"], "require_all": true}"#,
        )
        .unwrap();
        let params = call.params();
        assert!(params.contains(&(
            "topics",
            ParamValue::TextList(vec!["HIV".to_string(), "Vaccines".to_string()])
        )));
        assert!(params.contains(&("require_all", ParamValue::Flag(true))));
    }

    #[test]
    fn test_values_travel_as_parameters() {
        let hostile = "x'}) DETACH DELETE n //";
        let call = GraphToolCall::from_raw(
            "get_papers_by_author",
            &json!({ "author_name": hostile }).to_string(),
        )
        .unwrap();

        assert!(!call.cypher().contains(hostile));
        assert!(call.cypher().contains("$author_name"));
        assert!(call
            .params()
            .contains(&("author_name", ParamValue::Text(hostile.to_string()))));
    }

    #[test]
    fn test_every_statement_binds_its_params() {
        let calls = vec![
            GraphToolCall::from_raw("get_collaborators_with_topics", r#"{"author_name": "a", "topics": ["t"]}"#),
            GraphToolCall::from_raw("get_collaborating_institutions", r#"{"min_collaborations": 1}"#),
            GraphToolCall::from_raw("get_related_papers_by_mesh", r#"{"pmid": "1"}"#),
            GraphToolCall::from_raw("get_genes_in_same_papers", r#"{"target_gene": "gag", "mesh_filter": "HIV"}"#),
            GraphToolCall::from_raw("get_papers_by_author", r#"{"author_name": "a"}"#),
            GraphToolCall::from_raw("get_papers_by_mesh_term", r#"{"mesh_term": "HIV"}"#),
            GraphToolCall::from_raw("get_citation_network", r#"{"pmid": "1", "depth": 2}"#),
            GraphToolCall::from_raw("get_prolific_authors", r#"{"min_papers": 2}"#),
        ];

        for call in calls {
            let call = call.unwrap();
            for (key, _) in call.params() {
                assert!(
                    call.cypher().contains(&format!("${key}")),
                    "{} does not use ${}",
                    call.name(),
                    key
                );
            }
        }
    }

    #[test]
    fn test_row_limits() {
        assert_eq!(GraphTool::GenesInSamePapers.row_limit(), 10);
        assert_eq!(GraphTool::PapersByAuthor.row_limit(), 25);
    }

    #[test]
    fn test_describe_catalogue_lists_every_tool() {
        let listing = describe_catalogue();
        for tool in GraphTool::ALL {
            assert!(listing.contains(tool.name()));
        }
    }
}
