//! Collects the paper and gene datasets from NCBI

use anyhow::{Context, Result};
use biograph_config::AppConfig;
use biograph_models::PaperDataset;
use biograph_observability::{init_tracing, TracingConfig};
use clap::{Parser, Subcommand};
use data_collector::{EutilsClient, GeneCollector, PubMedCollector};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "data_admin")]
#[command(about = "Build BioGraph datasets from PubMed and NCBI Gene", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search PubMed, fetch papers and citations, then resolve their genes
    Collect {
        /// PubMed search term
        #[arg(long)]
        query: String,

        #[arg(long, default_value_t = 100)]
        max_results: usize,

        /// Paper dataset JSON to write
        #[arg(long, default_value = "data/pubmed_dataset.json")]
        papers: PathBuf,

        /// Gene dataset JSON to write
        #[arg(long, default_value = "data/gene_dataset.json")]
        genes: PathBuf,

        /// Stop after the paper dataset
        #[arg(long)]
        skip_genes: bool,
    },

    /// Resolve genes for an existing paper dataset
    CollectGenes {
        /// Paper dataset JSON to read
        #[arg(long, default_value = "data/pubmed_dataset.json")]
        papers: PathBuf,

        /// Gene dataset JSON to write
        #[arg(long, default_value = "data/gene_dataset.json")]
        genes: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(TracingConfig::for_cli("data_admin"));

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    if config.ncbi.email.is_none() {
        tracing::warn!("⚠️ NCBI_EMAIL is not set; NCBI may throttle anonymous clients");
    }
    let eutils = EutilsClient::new(&config.ncbi);

    match cli.command {
        Commands::Collect {
            query,
            max_results,
            papers,
            genes,
            skip_genes,
        } => {
            let dataset = PubMedCollector::new(&eutils)
                .collect(&query, max_results)
                .await
                .with_context(|| format!("Failed to collect papers for '{}'", query))?;
            dataset.save(&papers)?;
            println!(
                "Wrote {} papers ({} with citation data) to {}",
                dataset.metadata.total_papers,
                dataset.metadata.papers_with_citations,
                papers.display()
            );

            if !skip_genes {
                write_genes(&eutils, &dataset, &genes).await?;
            }
        }
        Commands::CollectGenes { papers, genes } => {
            let dataset = PaperDataset::load(&papers)
                .with_context(|| format!("Failed to load papers from {}", papers.display()))?;
            write_genes(&eutils, &dataset, &genes).await?;
        }
    }

    Ok(())
}

async fn write_genes(eutils: &EutilsClient, papers: &PaperDataset, path: &Path) -> Result<()> {
    let dataset = GeneCollector::new(eutils)
        .collect(&papers.pmids())
        .await
        .context("Failed to collect genes")?;
    dataset.save(path)?;
    println!(
        "Wrote {} genes ({} linked to papers) to {}",
        dataset.metadata.total_genes,
        dataset.metadata.genes_with_pubmed_links,
        path.display()
    );
    Ok(())
}
