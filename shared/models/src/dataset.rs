use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::gene::GeneRecord;
use crate::paper::{CitationNetwork, Paper};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dataset {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode dataset: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperMetadata {
    pub collection_date: String,
    pub query: String,
    pub total_papers: usize,
    pub papers_with_citations: usize,
    pub total_authors: usize,
    pub total_mesh_terms: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperDataset {
    pub metadata: PaperMetadata,
    pub papers: Vec<Paper>,
    /// PMID → citation details
    pub citation_network: HashMap<String, CitationNetwork>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneMetadata {
    pub collection_date: String,
    pub total_genes: usize,
    pub genes_with_pubmed_links: usize,
    pub total_linked_pmids: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneDataset {
    pub metadata: GeneMetadata,
    pub genes: Vec<GeneRecord>,
}

impl GeneDataset {
    /// PMID → genes mentioned in that paper, in dataset order
    pub fn genes_by_pmid(&self) -> HashMap<String, Vec<GeneRecord>> {
        let mut index: HashMap<String, Vec<GeneRecord>> = HashMap::new();
        for gene in &self.genes {
            for pmid in gene.linked_pmids.iter().filter(|p| !p.is_empty()) {
                index.entry(pmid.clone()).or_default().push(gene.clone());
            }
        }
        index
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, DatasetError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| DatasetError::Parse { path: display, source })
}

/// Pretty-printed JSON, creating parent directories as needed
fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    };
    let content = serde_json::to_string_pretty(value).map_err(DatasetError::Encode)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, content).map_err(io_err)
}

impl PaperDataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        load_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        save_json(self, path.as_ref())
    }

    pub fn pmids(&self) -> Vec<String> {
        self.papers
            .iter()
            .map(|p| p.pmid.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

impl GeneDataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        load_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        save_json(self, path.as_ref())
    }
}
