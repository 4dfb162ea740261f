//! `PubmedArticleSet` XML into [`Paper`] records.

use biograph_models::{Author, MeshTerm, Paper};
use roxmltree::{Document, Node, ParsingOptions};

use crate::errors::{CollectorError, CollectorResult};

/// Every `PubmedArticle` with a PMID; articles without one are skipped
pub fn parse_articles(xml: &str) -> CollectorResult<Vec<Paper>> {
    // efetch output always carries a DOCTYPE
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| CollectorError::Malformed(format!("PubMed XML: {}", e)))?;

    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("PubmedArticle"))
        .filter_map(parse_article)
        .collect())
}

fn parse_article(article: Node) -> Option<Paper> {
    let citation = child(article, "MedlineCitation")?;
    let pmid = path_text(citation, &["PMID"]);
    if pmid.is_empty() {
        return None;
    }
    let details = child(citation, "Article");

    let abstract_text = details
        .and_then(|a| child(a, "Abstract"))
        .map(|abs| {
            children(abs, "AbstractText")
                .map(text)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    let authors = details
        .and_then(|a| child(a, "AuthorList"))
        .map(|list| children(list, "Author").filter_map(parse_author).collect())
        .unwrap_or_default();

    let mesh_terms = child(citation, "MeshHeadingList")
        .map(|list| children(list, "MeshHeading").filter_map(parse_mesh).collect())
        .unwrap_or_default();

    let doi = path(article, &["PubmedData", "ArticleIdList"])
        .and_then(|ids| {
            children(ids, "ArticleId").find(|id| id.attribute("IdType") == Some("doi"))
        })
        .map(text)
        .unwrap_or_default();

    Some(Paper {
        pmid,
        title: details.map(|a| path_text(a, &["ArticleTitle"])).unwrap_or_default(),
        abstract_text,
        authors,
        mesh_terms,
        publication_date: details
            .and_then(|a| path(a, &["Journal", "JournalIssue", "PubDate"]))
            .map(publication_date)
            .unwrap_or_default(),
        journal: details.map(|a| path_text(a, &["Journal", "Title"])).unwrap_or_default(),
        doi,
    })
}

fn parse_author(node: Node) -> Option<Author> {
    let first_name = path_text(node, &["ForeName"]);
    let last_name = path_text(node, &["LastName"]);
    let affiliations = children(node, "AffiliationInfo")
        .map(|info| path_text(info, &["Affiliation"]))
        .filter(|a| !a.is_empty())
        .collect();

    if !last_name.is_empty() {
        let name = if first_name.is_empty() {
            last_name.clone()
        } else {
            format!("{} {}", first_name, last_name)
        };
        return Some(Author {
            name,
            first_name,
            last_name,
            affiliations,
        });
    }

    let collective = path_text(node, &["CollectiveName"]);
    (!collective.is_empty()).then(|| Author {
        name: collective,
        affiliations,
        ..Default::default()
    })
}

fn parse_mesh(heading: Node) -> Option<MeshTerm> {
    let descriptor = child(heading, "DescriptorName")?;
    let term = text(descriptor);
    if term.is_empty() {
        return None;
    }
    Some(MeshTerm {
        term,
        ui: descriptor.attribute("UI").unwrap_or_default().to_string(),
        major_topic: descriptor.attribute("MajorTopicYN") == Some("Y"),
        qualifiers: children(heading, "QualifierName")
            .map(text)
            .filter(|q| !q.is_empty())
            .collect(),
    })
}

/// `YYYY-MM-DD`, defaulting a missing month or day to `01`; empty without a year
fn publication_date(pub_date: Node) -> String {
    let year = path_text(pub_date, &["Year"]);
    if year.is_empty() {
        return String::new();
    }
    let month = match path_text(pub_date, &["Month"]) {
        m if m.is_empty() => "01".to_string(),
        m => month_number(&m),
    };
    let day = match path_text(pub_date, &["Day"]) {
        d if d.is_empty() => "01".to_string(),
        d => d,
    };
    format!("{}-{:0>2}-{:0>2}", year, month, day)
}

fn month_number(month: &str) -> String {
    let number = match month {
        "Jan" => "01",
        "Feb" => "02",
        "Mar" => "03",
        "Apr" => "04",
        "May" => "05",
        "Jun" => "06",
        "Jul" => "07",
        "Aug" => "08",
        "Sep" => "09",
        "Oct" => "10",
        "Nov" => "11",
        "Dec" => "12",
        numeric => numeric,
    };
    number.to_string()
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.has_tag_name(name))
}

fn path<'a, 'input>(node: Node<'a, 'input>, names: &[&str]) -> Option<Node<'a, 'input>> {
    names.iter().try_fold(node, |current, name| child(current, name))
}

fn path_text(node: Node, names: &[&str]) -> String {
    path(node, names).map(text).unwrap_or_default()
}

/// Concatenated text of a node and its descendants, so inline markup
/// like `<i>` inside titles is kept as plain text
fn text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}
