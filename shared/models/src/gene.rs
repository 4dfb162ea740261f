use serde::{Deserialize, Serialize};

/// NCBI Gene record with the PubMed papers that mention it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneRecord {
    /// NCBI GeneID
    pub gene_id: String,
    /// Gene symbol
    pub name: String,
    pub description: String,
    pub chromosome: String,
    pub map_location: String,
    pub organism: String,
    /// Raw comma-separated alias string from NCBI
    pub aliases: String,
    pub designations: String,
    pub linked_pmids: Vec<String>,
}

impl GeneRecord {
    pub fn alias_list(&self) -> Vec<&str> {
        self.aliases
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }
}
