//! Hybrid question answering from the command line

use anyhow::{Context, Result};
use biograph_backend::services::{OpenAiChatClient, QueryOrchestrator};
use biograph_config::AppConfig;
use biograph_models::{Answer, QueryMode, SourceDocument};
use biograph_observability::{init_tracing, TracingConfig};
use clap::Parser;
use graph_rag::{GraphStore, Neo4jGraphStore};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use vector_rag::{OpenAiEmbeddingClient, QdrantVectorStore};

const EXAMPLE_QUESTIONS: [&str; 4] = [
    "Which genes are mentioned in the same papers as gag?",
    "Which genes co-occur with CCR5 in HIV-related papers?",
    "Which authors have published the most papers in the collection?",
    "Which institutions collaborate most often on HIV research?",
];

#[derive(Parser)]
#[command(name = "fusion_query")]
#[command(about = "Answer questions with vector search plus knowledge graph enrichment", long_about = None)]
struct Cli {
    /// Question to answer; read from stdin when omitted
    #[arg(long, conflicts_with = "examples")]
    ask: Option<String>,

    /// Run the built-in example questions
    #[arg(long)]
    examples: bool,

    #[arg(long)]
    top_k: Option<usize>,
}

fn print_answer(question: &str, answer: &Answer) {
    println!("{}", "=".repeat(80));
    println!("Question: {question}\n");
    println!("{}\n", answer.text);

    println!("Sources:");
    for source in answer.sources.iter().map(SourceDocument::from) {
        println!("  [{:.3}] PMID {} - {}", source.score, source.pmid, source.title);
    }

    if !answer.enrichment.is_empty() {
        println!("\nGraph enrichment:");
        for (tool, result) in &answer.enrichment {
            println!("  {} ({} rows)", tool, result.rows.len());
        }
    }
    if !answer.failed_tools.is_empty() {
        println!("\nFailed tools: {}", answer.failed_tools.join(", "));
    }
}

fn read_question() -> Result<String> {
    print!("Question: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(TracingConfig::for_cli("fusion_query"));

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    config.require_openai_key()?;

    let timeout = config.query.timeout();
    let graph: Arc<dyn GraphStore> = Arc::new(
        Neo4jGraphStore::connect(&config.neo4j)
            .await
            .context("Failed to connect to Neo4j")?,
    );
    let orchestrator = QueryOrchestrator::new(
        Arc::new(OpenAiEmbeddingClient::new(
            &config.openai,
            config.qdrant.embedding_dimension,
            timeout,
        )),
        Arc::new(QdrantVectorStore::new(&config.qdrant)?),
        Some(graph),
        Arc::new(OpenAiChatClient::new(&config.openai, timeout)),
        config.query.clone(),
    );

    let questions: Vec<String> = match (cli.ask, cli.examples) {
        (Some(question), _) => vec![question],
        (None, true) => EXAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        (None, false) => vec![read_question()?],
    };

    for question in &questions {
        match orchestrator
            .handle_query(question, QueryMode::Hybrid, cli.top_k)
            .await
        {
            Ok(answer) => print_answer(question, &answer),
            // One failed example should not stop the rest
            Err(e) if questions.len() > 1 => eprintln!("Query failed for '{question}': {e}"),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
