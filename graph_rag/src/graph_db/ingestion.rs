//! Batched graph writes for paper and gene datasets.

use biograph_models::{CitationNetwork, GeneDataset, GeneRecord, Paper, PaperDataset};
use futures::stream::{self, StreamExt};
use neo4rs::{query, Graph, Query};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{GraphError, GraphResult};

pub const DEFAULT_CONCURRENCY: usize = 25;
pub const DEFAULT_BATCH_SIZE: usize = 100;

const CONSTRAINTS: [&str; 7] = [
    "CREATE CONSTRAINT IF NOT EXISTS FOR (p:Paper) REQUIRE p.pmid IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (a:Author) REQUIRE a.name IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (i:Institution) REQUIRE i.name IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (m:MeshTerm) REQUIRE m.ui IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (q:Qualifier) REQUIRE q.name IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (j:Journal) REQUIRE j.name IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (g:Gene) REQUIRE g.gene_id IS UNIQUE",
];

const PAPER_BATCH: &str = "
UNWIND range(0, size($pmids) - 1) AS i
MERGE (p:Paper {pmid: $pmids[i]})
SET p.title = $titles[i],
    p.abstract = $abstracts[i],
    p.publication_date = $dates[i],
    p.doi = $dois[i]";

const JOURNAL: &str = "
MERGE (j:Journal {name: $journal})
MERGE (p:Paper {pmid: $pmid})
MERGE (p)-[:PUBLISHED_IN]->(j)";

const AUTHORS: &str = "
MERGE (p:Paper {pmid: $pmid})
WITH p
UNWIND $names AS name
MERGE (a:Author {name: name})
MERGE (a)-[:WROTE]->(p)";

const AFFILIATIONS: &str = "
UNWIND range(0, size($authors) - 1) AS i
MERGE (a:Author {name: $authors[i]})
MERGE (inst:Institution {name: $institutions[i]})
MERGE (a)-[:AFFILIATED_WITH]->(inst)";

const MESH_TERMS: &str = "
MERGE (p:Paper {pmid: $pmid})
WITH p
UNWIND range(0, size($uis) - 1) AS i
MERGE (m:MeshTerm {ui: $uis[i]})
SET m.term = $terms[i]
MERGE (p)-[r:HAS_MESH_TERM]->(m)
SET r.major_topic = $major[i]";

const QUALIFIERS: &str = "
UNWIND range(0, size($uis) - 1) AS i
MERGE (m:MeshTerm {ui: $uis[i]})
MERGE (q:Qualifier {name: $qualifiers[i]})
MERGE (m)-[:HAS_QUALIFIER]->(q)";

const CITATIONS: &str = "
UNWIND range(0, size($citing) - 1) AS i
MATCH (p1:Paper {pmid: $citing[i]})
MATCH (p2:Paper {pmid: $cited[i]})
MERGE (p1)-[:CITES]->(p2)";

const GENE_BATCH: &str = "
UNWIND range(0, size($ids) - 1) AS i
MERGE (g:Gene {gene_id: $ids[i]})
SET g.name = $names[i],
    g.description = $descriptions[i],
    g.chromosome = $chromosomes[i],
    g.map_location = $locations[i],
    g.organism = $organisms[i],
    g.aliases = $aliases[i],
    g.designations = $designations[i]";

const GENE_MENTIONS: &str = "
MERGE (g:Gene {gene_id: $gene_id})
WITH g
UNWIND $pmids AS pmid
MERGE (p:Paper {pmid: pmid})
MERGE (g)-[:MENTIONED_IN]->(p)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    pub papers: usize,
    pub relationship_failures: usize,
    pub citations: usize,
    pub genes: usize,
    pub gene_link_failures: usize,
}

/// Relationship parameters derived from one paper
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PaperRelations {
    pub pmid: String,
    pub journal: Option<String>,
    pub authors: Vec<String>,
    /// Parallel (author, institution) lists
    pub affiliation_authors: Vec<String>,
    pub affiliation_institutions: Vec<String>,
    pub mesh_uis: Vec<String>,
    pub mesh_terms: Vec<String>,
    pub mesh_major: Vec<bool>,
    /// Parallel (mesh ui, qualifier) lists
    pub qualifier_uis: Vec<String>,
    pub qualifiers: Vec<String>,
}

impl PaperRelations {
    pub fn from_paper(paper: &Paper) -> Self {
        let mut relations = PaperRelations {
            pmid: paper.pmid.clone(),
            journal: Some(paper.journal.trim())
                .filter(|j| !j.is_empty())
                .map(str::to_string),
            ..Default::default()
        };

        for author in paper.authors.iter().filter(|a| !a.name.trim().is_empty()) {
            relations.authors.push(author.name.clone());
            for affiliation in author.affiliations.iter().filter(|a| !a.trim().is_empty()) {
                relations.affiliation_authors.push(author.name.clone());
                relations.affiliation_institutions.push(affiliation.clone());
            }
        }

        for mesh in paper.mesh_terms.iter().filter(|m| !m.ui.trim().is_empty()) {
            relations.mesh_uis.push(mesh.ui.clone());
            relations.mesh_terms.push(mesh.term.clone());
            relations.mesh_major.push(mesh.major_topic);
            for qualifier in mesh.qualifiers.iter().filter(|q| !q.trim().is_empty()) {
                relations.qualifier_uis.push(mesh.ui.clone());
                relations.qualifiers.push(qualifier.clone());
            }
        }
        relations
    }

    fn statements(&self) -> Vec<Query> {
        let mut statements = Vec::new();
        if let Some(journal) = &self.journal {
            statements.push(
                query(JOURNAL)
                    .param("journal", journal.clone())
                    .param("pmid", self.pmid.clone()),
            );
        }
        if !self.authors.is_empty() {
            statements.push(
                query(AUTHORS)
                    .param("pmid", self.pmid.clone())
                    .param("names", self.authors.clone()),
            );
        }
        if !self.affiliation_authors.is_empty() {
            statements.push(
                query(AFFILIATIONS)
                    .param("authors", self.affiliation_authors.clone())
                    .param("institutions", self.affiliation_institutions.clone()),
            );
        }
        if !self.mesh_uis.is_empty() {
            statements.push(
                query(MESH_TERMS)
                    .param("pmid", self.pmid.clone())
                    .param("uis", self.mesh_uis.clone())
                    .param("terms", self.mesh_terms.clone())
                    .param("major", self.mesh_major.clone()),
            );
        }
        if !self.qualifier_uis.is_empty() {
            statements.push(
                query(QUALIFIERS)
                    .param("uis", self.qualifier_uis.clone())
                    .param("qualifiers", self.qualifiers.clone()),
            );
        }
        statements
    }
}

/// Flatten the citation map into parallel (citing, cited) lists, sorted by
/// citing PMID for a stable write order.
pub(crate) fn citation_edges(network: &HashMap<String, CitationNetwork>) -> Vec<(String, String)> {
    let mut citing: Vec<_> = network.keys().collect();
    citing.sort();

    citing
        .into_iter()
        .flat_map(|pmid| {
            network[pmid]
                .references
                .iter()
                .filter(move |r| !r.is_empty() && *r != pmid)
                .map(move |reference| (pmid.clone(), reference.clone()))
        })
        .collect()
}

fn linked_pmids(gene: &GeneRecord) -> Vec<String> {
    gene.linked_pmids
        .iter()
        .filter(|p| !p.trim().is_empty())
        .cloned()
        .collect()
}

/// Writes datasets into Neo4j with MERGE semantics, so reruns are safe
pub struct GraphIngestor {
    graph: Arc<Graph>,
    concurrency: usize,
    batch_size: usize,
}

impl GraphIngestor {
    pub fn new(graph: Arc<Graph>) -> Self {
        Self {
            graph,
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn run(&self, q: Query) -> GraphResult<()> {
        self.graph.run(q).await.map_err(GraphError::from)
    }

    pub async fn create_constraints(&self) -> GraphResult<()> {
        for constraint in CONSTRAINTS {
            self.run(query(constraint)).await?;
        }
        tracing::info!("✅ Constraints verified or created");
        Ok(())
    }

    /// Papers, their relationships, then citations
    pub async fn ingest_papers(&self, dataset: &PaperDataset) -> GraphResult<IngestionSummary> {
        self.create_constraints().await?;

        let papers: Vec<&Paper> = dataset
            .papers
            .iter()
            .filter(|p| !p.pmid.trim().is_empty())
            .collect();
        tracing::info!("🧾 Ingesting {} papers", papers.len());

        let mut summary = IngestionSummary::default();
        for batch in papers.chunks(self.batch_size) {
            let q = query(PAPER_BATCH)
                .param("pmids", batch.iter().map(|p| p.pmid.clone()).collect::<Vec<_>>())
                .param("titles", batch.iter().map(|p| p.title.clone()).collect::<Vec<_>>())
                .param(
                    "abstracts",
                    batch.iter().map(|p| p.abstract_text.clone()).collect::<Vec<_>>(),
                )
                .param(
                    "dates",
                    batch.iter().map(|p| p.publication_date.clone()).collect::<Vec<_>>(),
                )
                .param("dois", batch.iter().map(|p| p.doi.clone()).collect::<Vec<_>>());
            self.run(q).await?;
            summary.papers += batch.len();
            tracing::info!("  → Inserted {} / {} papers", summary.papers, papers.len());
        }

        let failures: Vec<bool> = stream::iter(papers.iter().copied())
            .map(|paper| async move {
                let relations = PaperRelations::from_paper(paper);
                for statement in relations.statements() {
                    if let Err(e) = self.run(statement).await {
                        tracing::warn!(
                            "⚠️ Failed to ingest relationships for paper {}: {}",
                            paper.pmid,
                            e
                        );
                        return true;
                    }
                }
                false
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        summary.relationship_failures = failures.into_iter().filter(|failed| *failed).count();
        tracing::info!("✅ Paper relationships created");

        summary.citations = self.ingest_citations(&dataset.citation_network).await?;
        tracing::info!("✅ Paper ingestion complete");
        Ok(summary)
    }

    pub async fn ingest_citations(
        &self,
        network: &HashMap<String, CitationNetwork>,
    ) -> GraphResult<usize> {
        let edges = citation_edges(network);
        for batch in edges.chunks(self.batch_size * 5) {
            let (citing, cited): (Vec<String>, Vec<String>) = batch.iter().cloned().unzip();
            self.run(query(CITATIONS).param("citing", citing).param("cited", cited))
                .await?;
        }
        tracing::info!("Created {} citation relationships", edges.len());
        Ok(edges.len())
    }

    /// Gene nodes, then MENTIONED_IN edges to their papers
    pub async fn ingest_genes(&self, dataset: &GeneDataset) -> GraphResult<IngestionSummary> {
        self.create_constraints().await?;

        let genes: Vec<&GeneRecord> = dataset
            .genes
            .iter()
            .filter(|g| !g.gene_id.trim().is_empty())
            .collect();
        tracing::info!("🧬 Ingesting {} genes", genes.len());

        let mut summary = IngestionSummary::default();
        for batch in genes.chunks(self.batch_size) {
            let column = |f: fn(&GeneRecord) -> &String| {
                batch.iter().map(|g| f(g).clone()).collect::<Vec<_>>()
            };
            let q = query(GENE_BATCH)
                .param("ids", column(|g| &g.gene_id))
                .param("names", column(|g| &g.name))
                .param("descriptions", column(|g| &g.description))
                .param("chromosomes", column(|g| &g.chromosome))
                .param("locations", column(|g| &g.map_location))
                .param("organisms", column(|g| &g.organism))
                .param("aliases", column(|g| &g.aliases))
                .param("designations", column(|g| &g.designations));
            self.run(q).await?;
            summary.genes += batch.len();
            tracing::info!("  → Inserted {} / {} genes", summary.genes, genes.len());
        }

        let failures: Vec<bool> = stream::iter(genes.iter().copied())
            .map(|gene| async move {
                let pmids = linked_pmids(gene);
                if pmids.is_empty() {
                    return false;
                }
                let q = query(GENE_MENTIONS)
                    .param("gene_id", gene.gene_id.clone())
                    .param("pmids", pmids);
                match self.run(q).await {
                    Ok(()) => false,
                    Err(e) => {
                        tracing::warn!("⚠️ Failed linking gene {} to papers: {}", gene.gene_id, e);
                        true
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        summary.gene_link_failures = failures.into_iter().filter(|failed| *failed).count();
        tracing::info!("✅ Gene ingestion complete");
        Ok(summary)
    }
}
