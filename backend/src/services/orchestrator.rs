//! Query fusion: vector retrieval, graph tool enrichment and synthesis.

use biograph_config::QuerySettings;
use biograph_models::{Answer, CandidateDocument, EnrichmentResult, QueryMode};
use futures::future::join_all;
use graph_rag::{describe_catalogue, tool_definitions, GraphError, GraphStore, GraphToolCall, GRAPH_SCHEMA};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use vector_rag::{into_candidates, EmbeddingClient, VectorError, VectorStore};

use crate::errors::{QueryError, QueryResult};
use crate::services::llm::LlmClient;
use crate::services::prompts;

/// Read failures that may be retried and that have a timeout form
trait ReadError: std::fmt::Display {
    fn timed_out(what: String) -> Self;
    fn is_transient(&self) -> bool;
}

impl ReadError for VectorError {
    fn timed_out(what: String) -> Self {
        VectorError::Timeout(what)
    }

    fn is_transient(&self) -> bool {
        VectorError::is_transient(self)
    }
}

impl ReadError for GraphError {
    fn timed_out(what: String) -> Self {
        GraphError::Timeout(what)
    }

    fn is_transient(&self) -> bool {
        GraphError::is_transient(self)
    }
}

pub struct QueryOrchestrator {
    embedder: Arc<dyn EmbeddingClient>,
    vectors: Arc<dyn VectorStore>,
    graph: Option<Arc<dyn GraphStore>>,
    llm: Arc<dyn LlmClient>,
    settings: QuerySettings,
}

impl QueryOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        vectors: Arc<dyn VectorStore>,
        graph: Option<Arc<dyn GraphStore>>,
        llm: Arc<dyn LlmClient>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            embedder,
            vectors,
            graph,
            llm,
            settings,
        }
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Requested `top_k`, or the configured default. Zero is rejected and
    /// anything above the maximum is clamped.
    pub fn resolve_top_k(&self, requested: Option<usize>) -> QueryResult<usize> {
        match requested {
            None => Ok(self.settings.default_top_k.clamp(1, self.settings.max_top_k.max(1))),
            Some(0) => Err(QueryError::InvalidRequest("top_k must be at least 1".to_string())),
            Some(k) => Ok(k.min(self.settings.max_top_k.max(1))),
        }
    }

    pub async fn handle_query(
        &self,
        question: &str,
        mode: QueryMode,
        top_k: Option<usize>,
    ) -> QueryResult<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::InvalidRequest("question must not be empty".to_string()));
        }
        let top_k = self.resolve_top_k(top_k)?;
        let graph = match mode {
            QueryMode::Vector => None,
            QueryMode::Hybrid => Some(self.graph.as_deref().ok_or_else(|| {
                QueryError::InvalidRequest("hybrid queries need a graph store".to_string())
            })?),
        };

        let started = Instant::now();
        info!("🔷 {} query (top_k={}): {}", mode, top_k, question);

        let embedding = self.embed(question).await?;
        let candidates = self.retrieve(&embedding, top_k).await?;
        info!("📚 Retrieved {} candidate papers", candidates.len());

        let (enrichment, failed_tools) = match graph {
            Some(graph) => {
                let calls = self.select_tools(question, &candidates).await;
                self.enrich(graph, calls).await
            }
            None => (BTreeMap::new(), Vec::new()),
        };

        let budget = self.settings.context_char_budget;
        let prompt = match mode {
            QueryMode::Vector => prompts::vector_answer_prompt(question, &candidates, budget),
            QueryMode::Hybrid => prompts::fusion_prompt(question, &candidates, &enrichment, budget),
        };
        let text = self.synthesize(&prompt).await?;

        info!(
            "✅ {} query answered in {:?} ({} sources, {} tools, {} failed)",
            mode,
            started.elapsed(),
            candidates.len(),
            enrichment.len(),
            failed_tools.len()
        );

        Ok(Answer {
            text,
            sources: candidates,
            enrichment,
            query_type: mode,
            failed_tools,
        })
    }

    async fn embed(&self, question: &str) -> QueryResult<Vec<f32>> {
        let limit = self.settings.timeout();
        match timeout(limit, self.embedder.embed(question)).await {
            Ok(result) => result.map_err(QueryError::from),
            Err(_) => Err(QueryError::DownstreamTimeout(format!("embedding after {limit:?}"))),
        }
    }

    /// Vector search. A timeout yields no candidates rather than an error.
    async fn retrieve(&self, embedding: &[f32], top_k: usize) -> QueryResult<Vec<CandidateDocument>> {
        let vectors = self.vectors.as_ref();
        match self
            .read_with_retries("vector search", move || vectors.search(embedding, top_k))
            .await
        {
            Ok(hits) => {
                let mut candidates = into_candidates(hits);
                candidates.truncate(top_k);
                Ok(candidates)
            }
            Err(VectorError::Timeout(what)) => {
                warn!("⚠️ Vector search timed out ({}), continuing without candidates", what);
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Ask the LLM for graph tools. Any failure means no tools; invalid
    /// directives are dropped.
    async fn select_tools(&self, question: &str, candidates: &[CandidateDocument]) -> Vec<GraphToolCall> {
        let prompt =
            prompts::tool_selection_prompt(question, candidates, GRAPH_SCHEMA, &describe_catalogue());
        let tools = tool_definitions();

        let raw_calls = match timeout(self.settings.timeout(), self.llm.select_tools(&prompt, &tools)).await {
            Ok(Ok(calls)) => calls,
            Ok(Err(err)) => {
                warn!("⚠️ Tool selection failed, continuing without graph tools: {}", err);
                return Vec::new();
            }
            Err(_) => {
                warn!("⚠️ Tool selection timed out, continuing without graph tools");
                return Vec::new();
            }
        };

        raw_calls
            .into_iter()
            .filter_map(|raw| match GraphToolCall::from_raw(&raw.name, &raw.arguments) {
                Ok(call) => Some(call),
                Err(err) => {
                    warn!("⚠️ Dropping tool directive {}: {}", raw.name, err);
                    None
                }
            })
            .collect()
    }

    /// Run every call concurrently. Failed tools are reported by name and
    /// contribute no rows.
    async fn enrich(
        &self,
        graph: &dyn GraphStore,
        calls: Vec<GraphToolCall>,
    ) -> (BTreeMap<String, EnrichmentResult>, Vec<String>) {
        if !calls.is_empty() {
            let names: Vec<&str> = calls.iter().map(GraphToolCall::name).collect();
            info!("🧬 Running graph tools: {}", names.join(", "));
        }

        let runs = calls.iter().map(|call| async move {
            let outcome = self
                .read_with_retries(call.name(), move || graph.execute(call))
                .await;
            (call.name(), outcome)
        });
        let outcomes = join_all(runs).await;

        let mut enrichment: BTreeMap<String, EnrichmentResult> = BTreeMap::new();
        let mut failed_tools: Vec<String> = Vec::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(rows) => {
                    enrichment
                        .entry(name.to_string())
                        .or_insert_with(|| EnrichmentResult {
                            tool_name: name.to_string(),
                            rows: Vec::new(),
                        })
                        .rows
                        .extend(rows);
                }
                Err(err) => {
                    warn!("⚠️ Graph tool {} failed: {}", name, err);
                    if !failed_tools.iter().any(|failed| failed == name) {
                        failed_tools.push(name.to_string());
                    }
                }
            }
        }

        (enrichment, failed_tools)
    }

    async fn synthesize(&self, prompt: &str) -> QueryResult<String> {
        let limit = self.settings.timeout();
        match timeout(limit, self.llm.complete(prompt)).await {
            Ok(result) => result.map_err(QueryError::from),
            Err(_) => Err(QueryError::DownstreamTimeout(format!("answer synthesis after {limit:?}"))),
        }
    }

    /// Run an idempotent read under the per-call timeout, retrying
    /// transient failures with a fixed backoff.
    async fn read_with_retries<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: ReadError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let limit = self.settings.timeout();
        let mut attempt = 0u32;
        loop {
            let result = match timeout(limit, op()).await {
                Ok(result) => result,
                Err(_) => Err(E::timed_out(format!("{what} after {limit:?}"))),
            };
            match result {
                Err(err) if err.is_transient() && attempt < self.settings.read_retries => {
                    attempt += 1;
                    warn!(
                        "⚠️ {} failed ({}), retry {}/{}",
                        what, err, attempt, self.settings.read_retries
                    );
                    sleep(self.settings.retry_backoff()).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::{LlmResult, RawToolCall};
    use async_trait::async_trait;
    use serde_json::Value;
    use vector_rag::InMemoryVectorStore;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingClient for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, VectorError> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct SilentLlm;

    #[async_trait]
    impl LlmClient for SilentLlm {
        async fn select_tools(&self, _prompt: &str, _tools: &[Value]) -> LlmResult<Vec<RawToolCall>> {
            Ok(Vec::new())
        }

        async fn complete(&self, _prompt: &str) -> LlmResult<String> {
            Ok("answer".to_string())
        }
    }

    fn orchestrator(settings: QuerySettings) -> QueryOrchestrator {
        QueryOrchestrator::new(
            Arc::new(FixedEmbedder),
            Arc::new(InMemoryVectorStore::new("papers", 2)),
            None,
            Arc::new(SilentLlm),
            settings,
        )
    }

    #[test]
    fn test_resolve_top_k() {
        let orch = orchestrator(QuerySettings::default());
        assert_eq!(orch.resolve_top_k(None).unwrap(), 5);
        assert_eq!(orch.resolve_top_k(Some(3)).unwrap(), 3);
        assert_eq!(orch.resolve_top_k(Some(500)).unwrap(), 50);
        assert!(matches!(
            orch.resolve_top_k(Some(0)),
            Err(QueryError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let orch = orchestrator(QuerySettings::default());
        let err = orch.handle_query("   ", QueryMode::Vector, None).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_hybrid_without_graph_store() {
        let orch = orchestrator(QuerySettings::default());
        let err = orch.handle_query("gag?", QueryMode::Hybrid, None).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_read_retries_transient_errors() {
        let settings = QuerySettings {
            read_retries: 2,
            retry_backoff_ms: 1,
            ..QuerySettings::default()
        };
        let orch = orchestrator(settings);

        let mut calls = 0;
        let result: Result<u32, GraphError> = orch
            .read_with_retries("flaky", || {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt < 3 {
                        Err(GraphError::Unavailable("down".to_string()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_read_does_not_retry_permanent_errors() {
        let orch = orchestrator(QuerySettings {
            read_retries: 3,
            retry_backoff_ms: 1,
            ..QuerySettings::default()
        });

        let mut calls = 0;
        let result: Result<(), GraphError> = orch
            .read_with_retries("bad", || {
                calls += 1;
                async { Err(GraphError::Neo4j("syntax".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(GraphError::Neo4j(_))));
        assert_eq!(calls, 1);
    }
}
