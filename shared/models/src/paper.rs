use serde::{Deserialize, Serialize};

/// Author information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    /// Full name as printed on the paper
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    /// Institutional affiliations
    pub affiliations: Vec<String>,
}

/// Medical Subject Heading term
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshTerm {
    pub term: String,
    /// MeSH unique identifier, e.g. `D000818`
    pub ui: String,
    pub major_topic: bool,
    pub qualifiers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paper {
    pub pmid: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<Author>,
    pub mesh_terms: Vec<MeshTerm>,
    pub publication_date: String,
    pub journal: String,
    pub doi: String,
}

impl Paper {
    /// Papers without a PMID, title or abstract are not indexed anywhere.
    pub fn is_complete(&self) -> bool {
        !self.pmid.trim().is_empty()
            && !self.title.trim().is_empty()
            && !self.abstract_text.trim().is_empty()
    }

    /// Numeric point id for the vector store
    pub fn numeric_id(&self) -> Option<u64> {
        self.pmid.trim().parse().ok()
    }

    pub fn author_names(&self) -> impl Iterator<Item = &str> {
        self.authors.iter().map(|a| a.name.as_str()).filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationNetwork {
    pub pmid: String,
    /// PMIDs that cite this paper
    pub cited_by: Vec<String>,
    /// PMIDs referenced by this paper
    pub references: Vec<String>,
}
