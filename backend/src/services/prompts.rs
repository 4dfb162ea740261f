//! Prompt templates and context formatting.

use biograph_models::{CandidateDocument, EnrichmentResult};
use std::collections::BTreeMap;

const TOOL_SELECTION_PROMPT: &str = "\
You are a biomedical reasoning assistant with access to a Neo4j knowledge graph.

Steps:
1. Read the user question and the retrieved papers.
2. Identify biomedical entities (PMIDs, authors, genes, MeSH terms, institutions).
3. Decide which graph enrichment tool(s) would add evidence the papers alone cannot give.
4. Provide tool arguments taken from the question or the retrieved papers.
Call only tools from the catalogue below. Call none if no tool applies.

Neo4j Graph Schema:
{schema}

Tool Catalogue:
{catalogue}

User Question:
{question}

Retrieved Papers:
{papers}
";

const FUSION_SUMMARY_PROMPT: &str = "\
You are a biomedical research assistant combining two data sources:

- Semantic search results over paper abstracts (text-based)
- Knowledge graph query results (structured)

Synthesize both sources into one concise, factual answer for a biomedical researcher.

Instructions:
- Mention how the graph results confirm, extend, or contradict the retrieved papers.
- Highlight novel relationships discovered through the graph.
- Focus on key genes, institutions, authors, and MeSH terms.
- Cite papers by PMID.
- Avoid repetition; prefer clarity and precision.

User Question:
{question}

Retrieved Papers:
{papers}

Knowledge Graph Results (JSON):
{graph}
";

const VECTOR_ANSWER_PROMPT: &str = "\
You are a biomedical research assistant.

Answer the question as accurately as possible using only the context from the
biomedical research papers below. Cite papers by PMID. If the context does not
contain the answer, say so.

Context:
{papers}

Question: {question}
Answer:
";

const NO_PAPERS: &str = "(no papers retrieved)";
const TRUNCATION_MARK: &str = "…";

/// Substitute `{key}` slots in one pass. Inserted values are never
/// scanned again, so a question containing `{papers}` stays literal.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let slot = values.iter().find_map(|(key, value)| {
            let after = tail.strip_prefix('{')?.strip_prefix(*key)?.strip_prefix('}')?;
            Some((*value, after))
        });
        match slot {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Cut `text` to at most `max_chars` characters, marking the cut
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(TRUNCATION_MARK);
    cut
}

/// One line per candidate for tool selection: PMID, title, authors and
/// major MeSH terms.
pub fn candidate_summary(candidates: &[CandidateDocument]) -> String {
    if candidates.is_empty() {
        return NO_PAPERS.to_string();
    }
    candidates
        .iter()
        .map(|doc| {
            let paper = doc.paper();
            let authors: Vec<&str> = paper.author_names().take(5).collect();
            let topics: Vec<&str> = paper
                .mesh_terms
                .iter()
                .filter(|m| m.major_topic)
                .map(|m| m.term.as_str())
                .collect();
            let genes: Vec<&str> = doc.payload.genes.iter().map(|g| g.name.as_str()).collect();
            format!(
                "- PMID {} | {} | authors: {} | major topics: {} | genes: {}",
                doc.id,
                paper.title,
                authors.join(", "),
                topics.join(", "),
                genes.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full candidate context for synthesis, best first, never longer than
/// `budget` characters. Abstracts are cut before whole papers are dropped.
pub fn candidate_context(candidates: &[CandidateDocument], budget: usize) -> String {
    if candidates.is_empty() {
        return NO_PAPERS.to_string();
    }

    let mut context = String::new();
    let mut used = 0usize;
    for doc in candidates {
        let paper = doc.paper();
        let header = format!(
            "[PMID {}] {} ({}, {}) score={:.3}\nAuthors: {}\n",
            doc.id,
            paper.title,
            paper.journal,
            paper.publication_date,
            doc.score,
            paper.author_names().collect::<Vec<_>>().join(", ")
        );
        let header_len = header.chars().count();
        // Room for at least a short abstract excerpt
        if used + header_len + 16 > budget {
            break;
        }
        let remaining = budget - used - header_len;
        let abstract_line = format!("Abstract: {}\n\n", paper.abstract_text);
        let abstract_line = truncate_chars(&abstract_line, remaining);

        used += header_len + abstract_line.chars().count();
        context.push_str(&header);
        context.push_str(&abstract_line);
    }

    if context.is_empty() {
        truncate_chars(NO_PAPERS, budget)
    } else {
        context
    }
}

pub fn tool_selection_prompt(
    question: &str,
    candidates: &[CandidateDocument],
    schema: &str,
    catalogue: &str,
) -> String {
    fill(
        TOOL_SELECTION_PROMPT,
        &[
            ("schema", schema),
            ("catalogue", catalogue),
            ("question", question),
            ("papers", &candidate_summary(candidates)),
        ],
    )
}

pub fn fusion_prompt(
    question: &str,
    candidates: &[CandidateDocument],
    enrichment: &BTreeMap<String, EnrichmentResult>,
    budget: usize,
) -> String {
    let graph: BTreeMap<&str, _> = enrichment
        .iter()
        .map(|(name, result)| (name.as_str(), &result.rows))
        .collect();
    let graph = serde_json::to_string_pretty(&graph).unwrap_or_else(|_| "{}".to_string());

    fill(
        FUSION_SUMMARY_PROMPT,
        &[
            ("question", question),
            ("papers", &candidate_context(candidates, budget)),
            ("graph", &graph),
        ],
    )
}

pub fn vector_answer_prompt(question: &str, candidates: &[CandidateDocument], budget: usize) -> String {
    fill(
        VECTOR_ANSWER_PROMPT,
        &[
            ("question", question),
            ("papers", &candidate_context(candidates, budget)),
        ],
    )
}
