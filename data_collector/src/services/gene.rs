use biograph_models::{GeneDataset, GeneMetadata, GeneRecord};
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use crate::errors::CollectorResult;
use crate::services::eutils::{EutilsClient, LinkSet};

/// PMIDs per pubmed→gene elink request
pub const GENE_LINK_BATCH_SIZE: usize = 50;
/// GeneIDs per esummary request
pub const SUMMARY_BATCH_SIZE: usize = 200;

/// Resolves the genes mentioned by a set of papers into a [`GeneDataset`]
pub struct GeneCollector<'a> {
    eutils: &'a EutilsClient,
}

impl<'a> GeneCollector<'a> {
    pub fn new(eutils: &'a EutilsClient) -> Self {
        Self { eutils }
    }

    /// PMID → sorted, deduplicated GeneIDs, in input order.
    ///
    /// A batch that fails after retries is retried one PMID at a time;
    /// PMIDs that still fail are skipped.
    pub async fn link_genes(&self, pmids: &[String]) -> Vec<(String, Vec<String>)> {
        let mut links: HashMap<String, BTreeSet<String>> = HashMap::new();

        for batch in pmids.chunks(GENE_LINK_BATCH_SIZE) {
            match self.eutils.elink("pubmed", "gene", batch, None).await {
                Ok(linksets) => absorb(&mut links, &linksets),
                Err(e) => {
                    warn!(
                        "⚠️ Gene link batch of {} failed, falling back to single PMIDs: {}",
                        batch.len(),
                        e
                    );
                    for pmid in batch {
                        match self.eutils.elink("pubmed", "gene", std::slice::from_ref(pmid), None).await {
                            Ok(linksets) => absorb(&mut links, &linksets),
                            Err(e) => warn!("⚠️ Skipping gene links for PMID {}: {}", pmid, e),
                        }
                    }
                }
            }
        }

        pmids
            .iter()
            .filter_map(|pmid| {
                let genes = links.remove(pmid)?;
                (!genes.is_empty()).then(|| (pmid.clone(), genes.into_iter().collect()))
            })
            .collect()
    }

    pub async fn fetch_genes(&self, gene_ids: &[String]) -> CollectorResult<Vec<GeneRecord>> {
        let mut genes = Vec::with_capacity(gene_ids.len());
        for batch in gene_ids.chunks(SUMMARY_BATCH_SIZE) {
            let summaries = self.eutils.esummary("gene", batch).await?;
            genes.extend(summaries.iter().filter_map(gene_record));
        }
        Ok(genes)
    }

    pub async fn collect(&self, pmids: &[String]) -> CollectorResult<GeneDataset> {
        info!("🧬 Resolving GeneIDs from {} PMIDs", pmids.len());
        let pmid_to_genes = self.link_genes(pmids).await;

        let gene_ids: Vec<String> = pmid_to_genes
            .iter()
            .flat_map(|(_, genes)| genes.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        info!("🧬 Resolved {} unique GeneIDs, fetching summaries", gene_ids.len());

        let mut linked: HashMap<&str, Vec<String>> = HashMap::new();
        for (pmid, genes) in &pmid_to_genes {
            for gene in genes {
                linked.entry(gene.as_str()).or_default().push(pmid.clone());
            }
        }

        let mut genes = self.fetch_genes(&gene_ids).await?;
        for gene in &mut genes {
            gene.linked_pmids = linked.remove(gene.gene_id.as_str()).unwrap_or_default();
        }

        let metadata = GeneMetadata {
            collection_date: Utc::now().to_rfc3339(),
            total_genes: genes.len(),
            genes_with_pubmed_links: genes.iter().filter(|g| !g.linked_pmids.is_empty()).count(),
            total_linked_pmids: genes.iter().map(|g| g.linked_pmids.len()).sum(),
        };

        info!(
            "✅ Collected {} genes ({} linked to papers)",
            metadata.total_genes, metadata.genes_with_pubmed_links
        );

        Ok(GeneDataset { metadata, genes })
    }
}

fn absorb(links: &mut HashMap<String, BTreeSet<String>>, linksets: &[LinkSet]) {
    for set in linksets {
        if let Some(pmid) = set.source_id() {
            links
                .entry(pmid.to_string())
                .or_default()
                .extend(set.links_to("gene").map(str::to_string));
        }
    }
}

/// Gene esummary document; entries NCBI could not resolve carry an `error` field
fn gene_record(doc: &Value) -> Option<GeneRecord> {
    if doc.get("error").is_some() {
        return None;
    }
    let field = |key: &str| doc.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

    let gene_id = field("uid");
    if gene_id.is_empty() {
        return None;
    }
    let description = match field("description") {
        d if d.is_empty() => field("summary"),
        d => d,
    };

    Some(GeneRecord {
        gene_id,
        name: field("name"),
        description,
        chromosome: field("chromosome"),
        map_location: field("maplocation"),
        organism: doc
            .pointer("/organism/scientificname")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        aliases: field("otheraliases"),
        designations: field("otherdesignations"),
        linked_pmids: Vec::new(),
    })
}
