//! Answer a question from the vector store alone

use anyhow::{Context, Result};
use biograph_backend::services::{OpenAiChatClient, QueryOrchestrator};
use biograph_config::AppConfig;
use biograph_models::{QueryMode, SourceDocument};
use biograph_observability::{init_tracing, TracingConfig};
use clap::Parser;
use std::sync::Arc;
use vector_rag::{OpenAiEmbeddingClient, QdrantVectorStore};

const DEFAULT_QUESTION: &str = "Which institutions have collaborated most frequently on papers about 'Gene Editing' and 'Immunotherapy'?";

#[derive(Parser)]
#[command(name = "query_vectorstore")]
#[command(about = "Vector-only question answering over the paper collection", long_about = None)]
struct Cli {
    #[arg(long, default_value = DEFAULT_QUESTION)]
    ask: String,

    #[arg(long)]
    top_k: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(TracingConfig::for_cli("query_vectorstore"));

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    config.require_openai_key()?;

    let timeout = config.query.timeout();
    let orchestrator = QueryOrchestrator::new(
        Arc::new(OpenAiEmbeddingClient::new(
            &config.openai,
            config.qdrant.embedding_dimension,
            timeout,
        )),
        Arc::new(QdrantVectorStore::new(&config.qdrant)?),
        None,
        Arc::new(OpenAiChatClient::new(&config.openai, timeout)),
        config.query.clone(),
    );

    let answer = orchestrator
        .handle_query(&cli.ask, QueryMode::Vector, cli.top_k)
        .await?;

    println!("Question: {}\n", cli.ask);
    println!("{}\n", answer.text);
    println!("Sources:");
    for source in answer.sources.iter().map(SourceDocument::from) {
        println!("  [{:.3}] PMID {} - {}", source.score, source.pmid, source.title);
    }

    Ok(())
}
