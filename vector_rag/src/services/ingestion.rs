use biograph_models::{GeneDataset, GeneRecord, PaperDataset, PaperPayload};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;

use crate::errors::VectorResult;
use crate::services::embedding::EmbeddingClient;
use crate::services::vector_store::{VectorPoint, VectorStore};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Concurrent embedding requests within one batch
const EMBED_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub processed: usize,
    pub skipped_incomplete: usize,
    pub skipped_embedding: usize,
}

impl IngestionReport {
    pub fn skipped(&self) -> usize {
        self.skipped_incomplete + self.skipped_embedding
    }
}

/// Embeds paper abstracts and writes them to a vector store in batches
pub struct PaperIngestor<'a> {
    store: &'a dyn VectorStore,
    embedder: &'a dyn EmbeddingClient,
    batch_size: usize,
}

impl<'a> PaperIngestor<'a> {
    pub fn new(store: &'a dyn VectorStore, embedder: &'a dyn EmbeddingClient) -> Self {
        Self {
            store,
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embed and upsert every complete paper. Embedding failures skip the
    /// paper; an upsert failure aborts the run.
    pub async fn ingest(
        &self,
        papers: &PaperDataset,
        genes: Option<&GeneDataset>,
    ) -> VectorResult<IngestionReport> {
        let genes_by_pmid: HashMap<String, Vec<GeneRecord>> =
            genes.map(GeneDataset::genes_by_pmid).unwrap_or_default();
        let mut report = IngestionReport::default();

        let eligible: Vec<_> = papers
            .papers
            .iter()
            .filter_map(|paper| match (paper.is_complete(), paper.numeric_id()) {
                (true, Some(id)) => Some((id, paper)),
                _ => {
                    tracing::debug!(pmid = %paper.pmid, "Skipping incomplete paper");
                    report.skipped_incomplete += 1;
                    None
                }
            })
            .collect();

        tracing::info!(
            "📚 Ingesting {} papers into '{}' ({} skipped as incomplete)",
            eligible.len(),
            self.store.collection_name(),
            report.skipped_incomplete
        );

        for (batch_index, batch) in eligible.chunks(self.batch_size).enumerate() {
            let embedded: Vec<_> = stream::iter(batch.iter())
                .map(|(id, paper)| async move {
                    (*id, *paper, self.embedder.embed(&paper.abstract_text).await)
                })
                .buffered(EMBED_CONCURRENCY)
                .collect()
                .await;

            let mut points = Vec::with_capacity(embedded.len());
            for (id, paper, result) in embedded {
                let vector = match result {
                    Ok(vector) => vector,
                    Err(e) => {
                        tracing::warn!(pmid = %paper.pmid, "Skipping paper, embedding failed: {}", e);
                        report.skipped_embedding += 1;
                        continue;
                    }
                };
                let payload = PaperPayload {
                    paper: paper.clone(),
                    citation_network: papers.citation_network.get(&paper.pmid).cloned(),
                    genes: genes_by_pmid.get(&paper.pmid).cloned().unwrap_or_default(),
                };
                points.push(VectorPoint::from_payload(id, vector, &payload)?);
            }

            let written = self.store.upsert(points).await?;
            report.processed += written;
            tracing::info!(
                "Batch {} upserted ({} papers, {} total)",
                batch_index + 1,
                written,
                report.processed
            );
        }

        tracing::info!(
            "✅ Ingestion finished: {} processed, {} skipped",
            report.processed,
            report.skipped()
        );
        Ok(report)
    }
}
