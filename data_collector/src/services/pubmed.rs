use biograph_models::{CitationNetwork, Paper, PaperDataset, PaperMetadata};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::errors::CollectorResult;
use crate::services::eutils::EutilsClient;
use crate::services::pubmed_xml::parse_articles;

/// PMIDs per efetch request
pub const FETCH_BATCH_SIZE: usize = 200;
/// PMIDs per elink request
pub const LINK_BATCH_SIZE: usize = 50;

const CITED_BY: &str = "pubmed_pubmed_citedin";
const REFERENCES: &str = "pubmed_pubmed_refs";

/// Searches PubMed and assembles a [`PaperDataset`] with its citation network
pub struct PubMedCollector<'a> {
    eutils: &'a EutilsClient,
}

impl<'a> PubMedCollector<'a> {
    pub fn new(eutils: &'a EutilsClient) -> Self {
        Self { eutils }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> CollectorResult<Vec<String>> {
        let pmids = self.eutils.esearch("pubmed", query, max_results, "relevance").await?;
        info!("🔍 PubMed search '{}' matched {} papers", query, pmids.len());
        Ok(pmids)
    }

    pub async fn fetch_papers(&self, pmids: &[String]) -> CollectorResult<Vec<Paper>> {
        let mut papers = Vec::with_capacity(pmids.len());
        for batch in pmids.chunks(FETCH_BATCH_SIZE) {
            let xml = self.eutils.efetch_xml("pubmed", batch).await?;
            papers.extend(parse_articles(&xml)?);
        }
        info!("📚 Fetched {} of {} papers", papers.len(), pmids.len());
        Ok(papers)
    }

    /// Citing and referenced PMIDs for every paper.
    ///
    /// A batch that still fails after retries leaves its papers with empty
    /// lists rather than discarding the papers already fetched.
    pub async fn fetch_citations(
        &self,
        pmids: &[String],
    ) -> CollectorResult<HashMap<String, CitationNetwork>> {
        let mut network: HashMap<String, CitationNetwork> = pmids
            .iter()
            .map(|pmid| {
                let entry = CitationNetwork {
                    pmid: pmid.clone(),
                    ..Default::default()
                };
                (pmid.clone(), entry)
            })
            .collect();

        for linkname in [CITED_BY, REFERENCES] {
            for batch in pmids.chunks(LINK_BATCH_SIZE) {
                let linksets = match self.eutils.elink("pubmed", "pubmed", batch, Some(linkname)).await {
                    Ok(linksets) => linksets,
                    Err(e) if e.is_transient() => {
                        warn!("⚠️ {} lookup failed for {} papers: {}", linkname, batch.len(), e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                for set in &linksets {
                    let Some(entry) = set.source_id().and_then(|id| network.get_mut(id)) else {
                        continue;
                    };
                    let links: Vec<String> = set.links_named(linkname).map(str::to_string).collect();
                    if linkname == CITED_BY {
                        entry.cited_by = links;
                    } else {
                        entry.references = links;
                    }
                }
            }
        }

        Ok(network)
    }

    pub async fn collect(&self, query: &str, max_results: usize) -> CollectorResult<PaperDataset> {
        let pmids = self.search(query, max_results).await?;
        let papers = self.fetch_papers(&pmids).await?;

        let fetched: Vec<String> = papers.iter().map(|p| p.pmid.clone()).collect();
        let citation_network = self.fetch_citations(&fetched).await?;

        let metadata = PaperMetadata {
            collection_date: Utc::now().to_rfc3339(),
            query: query.to_string(),
            total_papers: papers.len(),
            papers_with_citations: citation_network.len(),
            // Author and MeSH mentions, not distinct people or terms
            total_authors: papers.iter().map(|p| p.authors.len()).sum(),
            total_mesh_terms: papers.iter().map(|p| p.mesh_terms.len()).sum(),
        };

        info!(
            "✅ Collected {} papers ({} with citations)",
            metadata.total_papers, metadata.papers_with_citations
        );

        Ok(PaperDataset {
            metadata,
            papers,
            citation_network,
        })
    }
}
