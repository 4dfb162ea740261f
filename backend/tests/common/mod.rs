//! In-process fakes for the orchestrator's collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use biograph_backend::services::{LlmClient, LlmError, LlmResult, QueryOrchestrator, RawToolCall};
use biograph_config::QuerySettings;
use biograph_models::{Author, GeneRecord, MeshTerm, Paper, PaperPayload, Row};
use graph_rag::{GraphError, GraphResult, GraphStats, GraphStore, GraphToolCall};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vector_rag::{
    EmbeddingClient, InMemoryVectorStore, SearchHit, VectorError, VectorPoint, VectorResult,
    VectorStore,
};

pub const DIMENSION: usize = 16;

/// Bag-of-words embedding: each word lands in a bucket picked by its bytes
pub struct HashEmbedder {
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            fail: false,
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSION];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word.bytes().map(usize::from).sum::<usize>() % DIMENSION;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbedder {
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(VectorError::Embedding("embedding API returned 500".to_string()));
        }
        Ok(Self::vector(text))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

/// A vector store whose backend is always down
pub struct UnavailableVectorStore;

#[async_trait]
impl VectorStore for UnavailableVectorStore {
    async fn upsert(&self, _points: Vec<VectorPoint>) -> VectorResult<usize> {
        Err(VectorError::StoreUnavailable("connection refused".to_string()))
    }

    async fn search(&self, _vector: &[f32], _top_k: usize) -> VectorResult<Vec<SearchHit>> {
        Err(VectorError::StoreUnavailable("connection refused".to_string()))
    }

    async fn count(&self) -> VectorResult<u64> {
        Err(VectorError::StoreUnavailable("connection refused".to_string()))
    }

    fn collection_name(&self) -> &str {
        "papers"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

/// Wraps a store and stalls every search and count
pub struct SlowVectorStore {
    pub inner: Arc<dyn VectorStore>,
    pub delay: Duration,
}

#[async_trait]
impl VectorStore for SlowVectorStore {
    async fn upsert(&self, points: Vec<VectorPoint>) -> VectorResult<usize> {
        self.inner.upsert(points).await
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> VectorResult<Vec<SearchHit>> {
        tokio::time::sleep(self.delay).await;
        self.inner.search(vector, top_k).await
    }

    async fn count(&self) -> VectorResult<u64> {
        tokio::time::sleep(self.delay).await;
        self.inner.count().await
    }

    fn collection_name(&self) -> &str {
        self.inner.collection_name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

fn paper(pmid: &str, title: &str, abstract_text: &str, authors: &[&str], mesh: &[&str]) -> Paper {
    Paper {
        pmid: pmid.to_string(),
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
        journal: "Retrovirology".to_string(),
        publication_date: "2022-05-01".to_string(),
        authors: authors
            .iter()
            .map(|name| Author {
                name: name.to_string(),
                ..Default::default()
            })
            .collect(),
        mesh_terms: mesh
            .iter()
            .map(|term| MeshTerm {
                term: term.to_string(),
                major_topic: true,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn gene(name: &str, pmids: &[&str]) -> GeneRecord {
    GeneRecord {
        gene_id: format!("id-{name}"),
        name: name.to_string(),
        organism: "Human immunodeficiency virus 1".to_string(),
        linked_pmids: pmids.iter().map(|p| p.to_string()).collect(),
        ..Default::default()
    }
}

pub fn corpus() -> Vec<PaperPayload> {
    let gag = gene("gag", &["101", "104"]);
    let pol = gene("pol", &["104"]);
    vec![
        PaperPayload {
            paper: paper(
                "101",
                "Gag polyprotein processing in HIV-1",
                "The gag gene encodes the Gag polyprotein which drives HIV-1 virion assembly.",
                &["Ada Lovelace", "Alan Turing"],
                &["HIV-1", "Gene Products, gag"],
            ),
            genes: vec![gag.clone()],
            ..Default::default()
        },
        PaperPayload {
            paper: paper(
                "102",
                "CCR5 co-receptor usage",
                "CCR5 is the main HIV co-receptor and CCR5 deletion protects against infection.",
                &["Grace Hopper"],
                &["Receptors, CCR5"],
            ),
            ..Default::default()
        },
        PaperPayload {
            paper: paper(
                "103",
                "Checkpoint immunotherapy in melanoma",
                "Checkpoint immunotherapy improves survival in advanced melanoma.",
                &["Barbara Liskov"],
                &["Immunotherapy", "Melanoma"],
            ),
            ..Default::default()
        },
        PaperPayload {
            paper: paper(
                "104",
                "Gag and pol in viral replication",
                "The gag and pol genes are expressed together through ribosomal frameshifting.",
                &["Ada Lovelace", "Edsger Dijkstra"],
                &["HIV-1", "Frameshifting, Ribosomal"],
            ),
            genes: vec![gag, pol],
            ..Default::default()
        },
        PaperPayload {
            paper: paper(
                "105",
                "Gene editing of CCR5",
                "Gene editing of CCR5 in hematopoietic stem cells confers HIV resistance.",
                &["Grace Hopper", "Alan Turing"],
                &["Gene Editing", "Receptors, CCR5"],
            ),
            ..Default::default()
        },
        PaperPayload {
            paper: paper(
                "106",
                "Nef and immune evasion",
                "Nef downregulates MHC class I to help HIV-1 evade immune responses.",
                &["Donald Knuth"],
                &["HIV-1", "Immune Evasion"],
            ),
            ..Default::default()
        },
    ]
}

pub async fn seeded_store() -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new("papers", DIMENSION));
    let points = corpus()
        .iter()
        .map(|payload| {
            let id = payload.paper.pmid.parse().unwrap();
            VectorPoint::from_payload(id, HashEmbedder::vector(&payload.paper.abstract_text), payload)
                .unwrap()
        })
        .collect();
    store.upsert(points).await.unwrap();
    store
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub enum ToolBehavior {
    Rows(Vec<Row>),
    Fail,
    /// Fails with a transient error on the first call only
    FlakyOnce(Vec<Row>),
    Delay(Duration, Vec<Row>),
}

/// Graph store answering each tool from a script and recording executions
#[derive(Default)]
pub struct FakeGraphStore {
    behaviors: HashMap<&'static str, ToolBehavior>,
    pub executed: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    pub stats: GraphStats,
    stats_delay: Option<Duration>,
}

impl FakeGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: &'static str, behavior: ToolBehavior) -> Self {
        self.behaviors.insert(tool, behavior);
        self
    }

    pub fn with_stats(mut self, stats: GraphStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_slow_stats(mut self, delay: Duration) -> Self {
        self.stats_delay = Some(delay);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl GraphStore for FakeGraphStore {
    async fn execute(&self, call: &GraphToolCall) -> GraphResult<Vec<Row>> {
        self.executed.lock().push(call.name().to_string());
        match self.behaviors.get(call.name()) {
            None => Ok(Vec::new()),
            Some(ToolBehavior::Rows(rows)) => Ok(rows.clone()),
            Some(ToolBehavior::Fail) => Err(GraphError::Neo4j("syntax error near MATCH".to_string())),
            Some(ToolBehavior::FlakyOnce(rows)) => {
                if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(GraphError::Unavailable("connection reset".to_string()))
                } else {
                    Ok(rows.clone())
                }
            }
            Some(ToolBehavior::Delay(delay, rows)) => {
                tokio::time::sleep(*delay).await;
                Ok(rows.clone())
            }
        }
    }

    async fn stats(&self) -> GraphResult<GraphStats> {
        if let Some(delay) = self.stats_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.stats)
    }
}

/// LLM returning scripted tool calls and a fixed answer, keeping every prompt
pub struct ScriptedLlm {
    tool_calls: Vec<RawToolCall>,
    fail_selection: bool,
    fail_completion: bool,
    selection_delay: Option<Duration>,
    completion_delay: Option<Duration>,
    answer: String,
    pub selection_prompts: Mutex<Vec<String>>,
    pub completion_prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            tool_calls: Vec::new(),
            fail_selection: false,
            fail_completion: false,
            selection_delay: None,
            completion_delay: None,
            answer: answer.to_string(),
            selection_prompts: Mutex::new(Vec::new()),
            completion_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tool(mut self, name: &str, arguments: Value) -> Self {
        self.tool_calls.push(RawToolCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        });
        self
    }

    pub fn with_raw_tool(mut self, name: &str, arguments: &str) -> Self {
        self.tool_calls.push(RawToolCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        });
        self
    }

    pub fn failing_selection(mut self) -> Self {
        self.fail_selection = true;
        self
    }

    pub fn failing_completion(mut self) -> Self {
        self.fail_completion = true;
        self
    }

    pub fn slow_selection(mut self, delay: Duration) -> Self {
        self.selection_delay = Some(delay);
        self
    }

    pub fn slow_completion(mut self, delay: Duration) -> Self {
        self.completion_delay = Some(delay);
        self
    }

    pub fn last_completion_prompt(&self) -> String {
        self.completion_prompts.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn select_tools(&self, prompt: &str, _tools: &[Value]) -> LlmResult<Vec<RawToolCall>> {
        self.selection_prompts.lock().push(prompt.to_string());
        if let Some(delay) = self.selection_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_selection {
            return Err(LlmError::Api {
                status: 429,
                body: "rate limited".to_string(),
            });
        }
        Ok(self.tool_calls.clone())
    }

    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        self.completion_prompts.lock().push(prompt.to_string());
        if let Some(delay) = self.completion_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_completion {
            return Err(LlmError::EmptyResponse);
        }
        Ok(self.answer.clone())
    }
}

pub fn fast_settings() -> QuerySettings {
    QuerySettings {
        timeout_secs: 1,
        read_retries: 0,
        retry_backoff_ms: 1,
        ..QuerySettings::default()
    }
}

pub fn orchestrator(
    vectors: Arc<dyn VectorStore>,
    graph: Option<Arc<FakeGraphStore>>,
    llm: Arc<ScriptedLlm>,
    settings: QuerySettings,
) -> QueryOrchestrator {
    orchestrator_with_embedder(HashEmbedder::new(), vectors, graph, llm, settings)
}

pub fn orchestrator_with_embedder(
    embedder: HashEmbedder,
    vectors: Arc<dyn VectorStore>,
    graph: Option<Arc<FakeGraphStore>>,
    llm: Arc<ScriptedLlm>,
    settings: QuerySettings,
) -> QueryOrchestrator {
    QueryOrchestrator::new(
        Arc::new(embedder),
        vectors,
        graph.map(|g| g as Arc<dyn GraphStore>),
        llm,
        settings,
    )
}

pub fn gene_rows() -> Vec<Row> {
    vec![row(&[
        ("gene", json!("pol")),
        ("shared_papers", json!(1)),
        ("example_pmids", json!(["104"])),
    ])]
}
