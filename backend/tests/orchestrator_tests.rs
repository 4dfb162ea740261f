mod common;

use biograph_backend::QueryError;
use biograph_models::QueryMode;
use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vector_rag::InMemoryVectorStore;

const GAG_QUESTION: &str = "Which genes are mentioned in the same papers as gag?";

#[tokio::test]
async fn test_vector_mode_respects_top_k_and_order() {
    let llm = Arc::new(ScriptedLlm::answering("Gag drives assembly [PMID 101]."));
    let orch = orchestrator(seeded_store().await, None, llm.clone(), fast_settings());

    for top_k in 1..=6 {
        let answer = orch
            .handle_query("HIV gag polyprotein assembly", QueryMode::Vector, Some(top_k))
            .await
            .unwrap();

        assert!(answer.sources.len() <= top_k);
        assert!(answer
            .sources
            .windows(2)
            .all(|pair| pair[0].score >= pair[1].score));
        assert!(answer.enrichment.is_empty());
        assert!(answer.failed_tools.is_empty());
        assert_eq!(answer.query_type, QueryMode::Vector);
    }

    // Vector mode never asks for tools
    assert!(llm.selection_prompts.lock().is_empty());
}

#[tokio::test]
async fn test_vector_mode_uses_vector_prompt() {
    let llm = Arc::new(ScriptedLlm::answering("answer"));
    let orch = orchestrator(seeded_store().await, None, llm.clone(), fast_settings());

    orch.handle_query("CCR5 deletion", QueryMode::Vector, Some(2))
        .await
        .unwrap();

    let prompt = llm.last_completion_prompt();
    assert!(prompt.contains("Question: CCR5 deletion"));
    assert!(!prompt.contains("Knowledge Graph Results"));
}

#[tokio::test]
async fn test_empty_store_answers_without_sources() {
    let graph = Arc::new(FakeGraphStore::new());
    let llm = Arc::new(ScriptedLlm::answering("No papers matched."));
    let orch = orchestrator(
        Arc::new(InMemoryVectorStore::new("papers", DIMENSION)),
        Some(graph),
        llm,
        fast_settings(),
    );

    for mode in [QueryMode::Vector, QueryMode::Hybrid] {
        let answer = orch.handle_query("anything at all", mode, None).await.unwrap();
        assert!(answer.sources.is_empty());
        assert_eq!(answer.text, "No papers matched.");
    }
}

#[tokio::test]
async fn test_gag_end_to_end() {
    let graph = Arc::new(FakeGraphStore::new().with(
        "get_genes_in_same_papers",
        ToolBehavior::Rows(gene_rows()),
    ));
    let llm = Arc::new(
        ScriptedLlm::answering("gag co-occurs with pol [PMID 104].")
            .with_tool("get_genes_in_same_papers", json!({"target_gene": "gag"})),
    );
    let orch = orchestrator(seeded_store().await, Some(graph.clone()), llm.clone(), fast_settings());

    let answer = orch
        .handle_query(GAG_QUESTION, QueryMode::Hybrid, Some(5))
        .await
        .unwrap();

    assert!(!answer.sources.is_empty());
    assert!(answer.sources.len() <= 5);
    assert!(!answer.text.is_empty());
    let genes = &answer.enrichment["get_genes_in_same_papers"];
    assert_eq!(genes.rows[0]["gene"], "pol");
    assert_eq!(graph.executed(), vec!["get_genes_in_same_papers"]);

    let selection = llm.selection_prompts.lock()[0].clone();
    assert!(selection.contains(GAG_QUESTION));
    assert!(selection.contains("get_genes_in_same_papers"));

    let synthesis = llm.last_completion_prompt();
    assert!(synthesis.contains("\"pol\""));
    assert!(synthesis.contains("[PMID"));
}

#[tokio::test]
async fn test_unknown_and_malformed_tools_are_never_executed() {
    let graph = Arc::new(FakeGraphStore::new().with(
        "get_genes_in_same_papers",
        ToolBehavior::Rows(gene_rows()),
    ));
    let llm = Arc::new(
        ScriptedLlm::answering("answer")
            .with_tool("drop_database", json!({}))
            .with_raw_tool("get_papers_by_author", "{not json")
            .with_tool("get_citation_network", json!({"pmid": "101", "depth": 9}))
            .with_tool("get_genes_in_same_papers", json!({"target_gene": "gag"})),
    );
    let orch = orchestrator(seeded_store().await, Some(graph.clone()), llm, fast_settings());

    let answer = orch
        .handle_query(GAG_QUESTION, QueryMode::Hybrid, None)
        .await
        .unwrap();

    assert_eq!(graph.executed(), vec!["get_genes_in_same_papers"]);
    assert_eq!(
        answer.enrichment.keys().collect::<Vec<_>>(),
        vec!["get_genes_in_same_papers"]
    );
    // Dropped directives are not failures
    assert!(answer.failed_tools.is_empty());
}

#[tokio::test]
async fn test_failing_tool_is_isolated() {
    let graph = Arc::new(
        FakeGraphStore::new()
            .with("get_genes_in_same_papers", ToolBehavior::Rows(gene_rows()))
            .with("get_prolific_authors", ToolBehavior::Fail),
    );
    let llm = Arc::new(
        ScriptedLlm::answering("answer")
            .with_tool("get_genes_in_same_papers", json!({"target_gene": "gag"}))
            .with_tool("get_prolific_authors", json!({"min_papers": 2})),
    );
    let orch = orchestrator(seeded_store().await, Some(graph), llm.clone(), fast_settings());

    let answer = orch
        .handle_query(GAG_QUESTION, QueryMode::Hybrid, None)
        .await
        .unwrap();

    assert!(answer.enrichment.contains_key("get_genes_in_same_papers"));
    assert!(!answer.enrichment.contains_key("get_prolific_authors"));
    assert_eq!(answer.failed_tools, vec!["get_prolific_authors"]);
    assert!(!llm.last_completion_prompt().contains("get_prolific_authors"));
}

#[tokio::test]
async fn test_slow_tool_times_out_alone() {
    let graph = Arc::new(
        FakeGraphStore::new()
            .with("get_genes_in_same_papers", ToolBehavior::Rows(gene_rows()))
            .with(
                "get_collaborating_institutions",
                ToolBehavior::Delay(Duration::from_secs(5), Vec::new()),
            ),
    );
    let llm = Arc::new(
        ScriptedLlm::answering("answer")
            .with_tool("get_collaborating_institutions", json!({"min_collaborations": 1}))
            .with_tool("get_genes_in_same_papers", json!({"target_gene": "gag"})),
    );
    let orch = orchestrator(seeded_store().await, Some(graph), llm, fast_settings());

    let answer = orch
        .handle_query(GAG_QUESTION, QueryMode::Hybrid, None)
        .await
        .unwrap();

    assert!(answer.enrichment.contains_key("get_genes_in_same_papers"));
    assert_eq!(answer.failed_tools, vec!["get_collaborating_institutions"]);
}

#[tokio::test]
async fn test_transient_tool_failure_is_retried() {
    let graph = Arc::new(FakeGraphStore::new().with(
        "get_genes_in_same_papers",
        ToolBehavior::FlakyOnce(gene_rows()),
    ));
    let llm = Arc::new(
        ScriptedLlm::answering("answer")
            .with_tool("get_genes_in_same_papers", json!({"target_gene": "gag"})),
    );
    let settings = biograph_config::QuerySettings {
        read_retries: 1,
        ..fast_settings()
    };
    let orch = orchestrator(seeded_store().await, Some(graph.clone()), llm, settings);

    let answer = orch
        .handle_query(GAG_QUESTION, QueryMode::Hybrid, None)
        .await
        .unwrap();

    assert_eq!(graph.executed().len(), 2);
    assert!(answer.failed_tools.is_empty());
    assert_eq!(answer.enrichment["get_genes_in_same_papers"].rows.len(), 1);
}

#[tokio::test]
async fn test_repeated_tool_rows_are_concatenated() {
    let graph = Arc::new(FakeGraphStore::new().with(
        "get_genes_in_same_papers",
        ToolBehavior::Rows(gene_rows()),
    ));
    let llm = Arc::new(
        ScriptedLlm::answering("answer")
            .with_tool("get_genes_in_same_papers", json!({"target_gene": "gag"}))
            .with_tool("get_genes_in_same_papers", json!({"target_gene": "pol"})),
    );
    let orch = orchestrator(seeded_store().await, Some(graph), llm, fast_settings());

    let answer = orch
        .handle_query(GAG_QUESTION, QueryMode::Hybrid, None)
        .await
        .unwrap();

    assert_eq!(answer.enrichment.len(), 1);
    assert_eq!(answer.enrichment["get_genes_in_same_papers"].rows.len(), 2);
}

#[tokio::test]
async fn test_tool_selection_failure_degrades_to_no_tools() {
    let graph = Arc::new(FakeGraphStore::new());
    let llm = Arc::new(ScriptedLlm::answering("answer from papers").failing_selection());
    let orch = orchestrator(seeded_store().await, Some(graph.clone()), llm, fast_settings());

    let answer = orch
        .handle_query(GAG_QUESTION, QueryMode::Hybrid, None)
        .await
        .unwrap();

    assert!(graph.executed().is_empty());
    assert!(answer.enrichment.is_empty());
    assert_eq!(answer.text, "answer from papers");
}

#[tokio::test]
async fn test_repeated_searches_return_same_order() {
    let llm = Arc::new(ScriptedLlm::answering("answer"));
    let orch = orchestrator(seeded_store().await, None, llm, fast_settings());

    let first = orch
        .handle_query("HIV-1 gag pol", QueryMode::Vector, Some(6))
        .await
        .unwrap();
    let second = orch
        .handle_query("HIV-1 gag pol", QueryMode::Vector, Some(6))
        .await
        .unwrap();

    let ids = |answer: &biograph_models::Answer| {
        answer.sources.iter().map(|s| s.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[tokio::test]
async fn test_fatal_failures() {
    let store = seeded_store().await;

    let llm = Arc::new(ScriptedLlm::answering("unused").failing_completion());
    let orch = orchestrator(store.clone(), None, llm, fast_settings());
    let err = orch
        .handle_query("gag", QueryMode::Vector, None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Synthesis(_)));

    let llm = Arc::new(ScriptedLlm::answering("unused"));
    let orch = orchestrator(Arc::new(UnavailableVectorStore), None, llm, fast_settings());
    let err = orch
        .handle_query("gag", QueryMode::Vector, None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::StoreUnavailable(_)));
    assert!(err.retryable());

    let orch = orchestrator_with_embedder(
        HashEmbedder::failing(),
        store,
        None,
        Arc::new(ScriptedLlm::answering("unused")),
        fast_settings(),
    );
    let err = orch
        .handle_query("gag", QueryMode::Vector, None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Embedding(_)));
}

#[tokio::test]
async fn test_invalid_requests() {
    let llm = Arc::new(ScriptedLlm::answering("answer"));
    let orch = orchestrator(seeded_store().await, None, llm, fast_settings());

    assert!(matches!(
        orch.handle_query("gag", QueryMode::Vector, Some(0)).await,
        Err(QueryError::InvalidRequest(_))
    ));
    assert!(matches!(
        orch.handle_query(" \n ", QueryMode::Vector, None).await,
        Err(QueryError::InvalidRequest(_))
    ));

    let answer = orch
        .handle_query("gag", QueryMode::Vector, Some(10_000))
        .await
        .unwrap();
    assert!(answer.sources.len() <= 6);
}

#[tokio::test]
async fn test_embedding_timeout_is_fatal() {
    let llm = Arc::new(ScriptedLlm::answering("unused"));
    let orch = orchestrator_with_embedder(
        HashEmbedder::slow(Duration::from_secs(5)),
        seeded_store().await,
        None,
        llm.clone(),
        fast_settings(),
    );

    let err = orch
        .handle_query("gag", QueryMode::Vector, None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::DownstreamTimeout(_)));
    assert!(err.retryable());
    assert!(llm.completion_prompts.lock().is_empty());
}

#[tokio::test]
async fn test_synthesis_timeout_is_fatal() {
    let llm = Arc::new(ScriptedLlm::answering("late").slow_completion(Duration::from_secs(5)));
    let orch = orchestrator(seeded_store().await, None, llm, fast_settings());

    let err = orch
        .handle_query("gag", QueryMode::Vector, None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::DownstreamTimeout(_)));
}

#[tokio::test]
async fn test_search_timeout_answers_without_sources() {
    let store = Arc::new(SlowVectorStore {
        inner: seeded_store().await,
        delay: Duration::from_secs(5),
    });
    let llm = Arc::new(ScriptedLlm::answering("Nothing retrieved."));
    let orch = orchestrator(store, None, llm.clone(), fast_settings());

    let answer = orch
        .handle_query("gag", QueryMode::Vector, None)
        .await
        .unwrap();
    assert!(answer.sources.is_empty());
    assert_eq!(answer.text, "Nothing retrieved.");
    assert!(llm.last_completion_prompt().contains("(no papers retrieved)"));
}

#[tokio::test]
async fn test_tool_selection_timeout_runs_no_tools() {
    let graph = Arc::new(
        FakeGraphStore::new().with("get_genes_in_same_papers", ToolBehavior::Rows(gene_rows())),
    );
    let llm = Arc::new(
        ScriptedLlm::answering("gag appears with pol.")
            .with_tool("get_genes_in_same_papers", json!({"target_gene": "gag"}))
            .slow_selection(Duration::from_secs(5)),
    );
    let orch = orchestrator(seeded_store().await, Some(graph.clone()), llm, fast_settings());

    let answer = orch
        .handle_query(GAG_QUESTION, QueryMode::Hybrid, None)
        .await
        .unwrap();
    assert!(!answer.sources.is_empty());
    assert!(answer.enrichment.is_empty());
    assert!(answer.failed_tools.is_empty());
    assert!(graph.executed().is_empty());
}

#[tokio::test]
async fn test_placeholder_in_question_is_kept_verbatim() {
    let llm = Arc::new(ScriptedLlm::answering("answer"));
    let orch = orchestrator(seeded_store().await, None, llm.clone(), fast_settings());

    let answer = orch
        .handle_query("explain {papers} please", QueryMode::Vector, Some(2))
        .await
        .unwrap();

    let prompt = llm.last_completion_prompt();
    assert!(prompt.contains("Question: explain {papers} please"));
    assert_eq!(prompt.matches("[PMID ").count(), answer.sources.len());
}
