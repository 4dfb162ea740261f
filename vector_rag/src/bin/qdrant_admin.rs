//! Administrative CLI for the paper vector collection

use anyhow::{Context, Result};
use biograph_config::AppConfig;
use biograph_models::{GeneDataset, PaperDataset};
use biograph_observability::{init_tracing, TracingConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vector_rag::{OpenAiEmbeddingClient, PaperIngestor, QdrantVectorStore, VectorStore};

#[derive(Parser)]
#[command(name = "qdrant_admin")]
#[command(about = "Manage the Qdrant paper collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the collection if it does not exist
    CreateCollection,

    /// Drop the collection and all of its points
    DeleteCollection,

    /// Print the number of indexed papers
    Count,

    /// Embed papers and upsert them into the collection
    Ingest {
        /// Drop and recreate the collection first
        #[arg(long)]
        recreate: bool,

        /// Paper dataset JSON
        #[arg(long, default_value = "data/pubmed_dataset.json")]
        papers: PathBuf,

        /// Gene dataset JSON, used when present
        #[arg(long, default_value = "data/gene_dataset.json")]
        genes: PathBuf,

        #[arg(long, default_value_t = vector_rag::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(TracingConfig::for_cli("qdrant_admin"));

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let store = QdrantVectorStore::new(&config.qdrant).context("Failed to build Qdrant client")?;

    match cli.command {
        Commands::CreateCollection => {
            store.ensure_collection().await?;
            println!("Collection '{}' is ready", store.collection_name());
        }
        Commands::DeleteCollection => {
            store.delete_collection().await?;
            println!("Collection '{}' deleted", store.collection_name());
        }
        Commands::Count => {
            let count = store.count().await?;
            println!("{}: {} papers", store.collection_name(), count);
        }
        Commands::Ingest {
            recreate,
            papers,
            genes,
            batch_size,
        } => {
            config.require_openai_key()?;

            let paper_dataset = PaperDataset::load(&papers)
                .with_context(|| format!("Failed to load papers from {}", papers.display()))?;
            let gene_dataset = if genes.exists() {
                Some(
                    GeneDataset::load(&genes)
                        .with_context(|| format!("Failed to load genes from {}", genes.display()))?,
                )
            } else {
                tracing::warn!("⚠️ Gene dataset {} not found, ingesting without genes", genes.display());
                None
            };

            if recreate && store.collection_exists().await? {
                store.delete_collection().await?;
            }
            store.ensure_collection().await?;

            let embedder = OpenAiEmbeddingClient::new(
                &config.openai,
                config.qdrant.embedding_dimension,
                config.query.timeout(),
            );
            let report = PaperIngestor::new(&store, &embedder)
                .with_batch_size(batch_size)
                .ingest(&paper_dataset, gene_dataset.as_ref())
                .await?;

            println!(
                "Processed {} papers, skipped {} ({} incomplete, {} embedding failures)",
                report.processed,
                report.skipped(),
                report.skipped_incomplete,
                report.skipped_embedding
            );
        }
    }

    Ok(())
}
