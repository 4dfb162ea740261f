//! Administrative CLI for the Neo4j knowledge graph

use anyhow::{Context, Result};
use biograph_config::AppConfig;
use biograph_models::{GeneDataset, PaperDataset, Row};
use biograph_observability::{init_tracing, TracingConfig};
use clap::{Parser, Subcommand};
use graph_rag::{GraphStore, GraphToolCall, Neo4jGraphStore, GRAPH_SCHEMA};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "graph_admin")]
#[command(about = "Build, inspect and query the biomedical knowledge graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the paper dataset and, when present, the gene dataset
    Create {
        #[arg(long, default_value = "data/pubmed_dataset.json")]
        papers: PathBuf,

        #[arg(long, default_value = "data/gene_dataset.json")]
        genes: PathBuf,
    },

    /// Delete every node and relationship
    Delete,

    /// Print node and citation counts
    Stats,

    /// Run a few catalogue queries against the graph
    Examples,

    /// Run one catalogue tool with JSON arguments
    Tool {
        name: String,

        #[arg(long, default_value = "{}")]
        args: String,
    },
}

fn print_rows(rows: &[Row], limit: usize) {
    if rows.is_empty() {
        println!("  (no results)");
    }
    for row in rows.iter().take(limit) {
        let fields: Vec<String> = row.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("  - {}", fields.join(", "));
    }
}

async fn run_tool(store: &Neo4jGraphStore, name: &str, args: &str, limit: usize) -> Result<()> {
    let call = GraphToolCall::from_raw(name, args)?;
    let rows = store.execute(&call).await?;
    println!("{} ({} rows)", call.name(), rows.len());
    print_rows(&rows, limit);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(TracingConfig::for_cli("graph_admin"));

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let store = Neo4jGraphStore::connect(&config.neo4j).await?;

    match cli.command {
        Commands::Create { papers, genes } => {
            let dataset = PaperDataset::load(&papers)
                .with_context(|| format!("Failed to load papers from {}", papers.display()))?;
            let ingestor = store.ingestor();
            let summary = ingestor.ingest_papers(&dataset).await?;
            println!(
                "Papers: {} ({} relationship failures), citations: {}",
                summary.papers, summary.relationship_failures, summary.citations
            );

            if genes.exists() {
                let gene_dataset = GeneDataset::load(&genes)
                    .with_context(|| format!("Failed to load genes from {}", genes.display()))?;
                let summary = ingestor.ingest_genes(&gene_dataset).await?;
                println!(
                    "Genes: {} ({} link failures)",
                    summary.genes, summary.gene_link_failures
                );
            } else {
                tracing::warn!("⚠️ Gene dataset {} not found, skipping genes", genes.display());
            }
        }
        Commands::Delete => {
            store.delete_graph().await?;
            println!("Graph deleted");
        }
        Commands::Stats => {
            let stats = store.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats.node_counts())?);
            println!("citation_relationships: {}", stats.citation_relationships());
        }
        Commands::Examples => {
            println!("GRAPH SCHEMA\n{}\n", GRAPH_SCHEMA);
            run_tool(&store, "get_prolific_authors", r#"{"min_papers": 1}"#, 5).await?;
            run_tool(&store, "get_papers_by_mesh_term", r#"{"mesh_term": "HIV"}"#, 3).await?;
            run_tool(
                &store,
                "get_collaborating_institutions",
                r#"{"min_collaborations": 1}"#,
                3,
            )
            .await?;
            run_tool(&store, "get_genes_in_same_papers", r#"{"target_gene": "gag"}"#, 5).await?;
        }
        Commands::Tool { name, args } => {
            run_tool(&store, &name, &args, usize::MAX).await?;
        }
    }

    Ok(())
}
