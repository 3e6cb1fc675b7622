//! Local citation formatting.
//!
//! Used when no external citation processor is available: assembles a
//! plain-text citation for a record in one of four styles, and a CSL-JSON
//! item that a processor could consume instead.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::LazyLock;

use crate::models::CanonicalRecord;
use crate::text::{collapse_whitespace, parse_published};

pub const DEFAULT_PUBLISHER: &str = "Council on Library and Information Resources";

static DOI_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^doi:\s*").unwrap());
static DOI_RESOLVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://(dx\.)?doi\.org/").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CitationStyle {
    #[default]
    Chicago,
    Mla,
    Harvard,
    Vancouver,
}

impl CitationStyle {
    /// Parse a style key; unknown keys fall back to Chicago.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "mla" => CitationStyle::Mla,
            "harvard" => CitationStyle::Harvard,
            "vancouver" => CitationStyle::Vancouver,
            _ => CitationStyle::Chicago,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStyle::Chicago => "chicago",
            CitationStyle::Mla => "mla",
            CitationStyle::Harvard => "harvard",
            CitationStyle::Vancouver => "vancouver",
        }
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The citable subset of a record.
#[derive(Debug, Clone, Default)]
pub struct CitationSource {
    pub title: String,
    pub creators: Vec<String>,
    pub published: String,
    pub publisher: String,
    pub doi: String,
    /// Canonical landing page for the item.
    pub url: String,
}

impl CitationSource {
    /// `creator_details` names take precedence over plain `creators`.
    pub fn from_record(record: &CanonicalRecord, publisher: &str, url: &str) -> Self {
        let detailed: Vec<String> = record
            .creator_details
            .iter()
            .map(|c| c.name.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let creators = if detailed.is_empty() {
            record
                .creators
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        } else {
            detailed
        };
        Self {
            title: record.title.clone(),
            creators,
            published: record.published.clone(),
            publisher: publisher.to_string(),
            doi: record.doi.clone(),
            url: url.to_string(),
        }
    }
}

/// Strip `doi:` and resolver URL prefixes from a DOI.
pub fn normalize_doi(value: &str) -> String {
    let without_scheme = DOI_SCHEME_RE.replace(value.trim(), "");
    DOI_RESOLVER_RE.replace(&without_scheme, "").into_owned()
}

/// Four-digit publication year, or `n.d.`.
pub fn format_year(published: &str) -> String {
    parse_published(published)
        .map(|dt| dt.year().to_string())
        .unwrap_or_else(|| "n.d.".to_string())
}

pub fn join_authors(creators: &[String], style: CitationStyle) -> String {
    match creators {
        [] => String::new(),
        [only] => only.clone(),
        [first, ..] if style == CitationStyle::Mla => format!("{} et al.", first),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Assemble a plain-text citation. `accessed` is the date printed in
/// Harvard's "Accessed" clause.
pub fn fallback_citation(
    source: &CitationSource,
    style: CitationStyle,
    accessed: NaiveDate,
) -> String {
    let authors = collapse_whitespace(&join_authors(&source.creators, style));
    let year = format_year(&source.published);
    let title = match collapse_whitespace(&source.title) {
        t if t.is_empty() => "[Untitled]".to_string(),
        t => t,
    };
    let publisher = match collapse_whitespace(&source.publisher) {
        p if p.is_empty() => DEFAULT_PUBLISHER.to_string(),
        p => p,
    };
    let doi = normalize_doi(&source.doi);
    let doi_url = if doi.is_empty() {
        String::new()
    } else {
        format!("https://doi.org/{}", doi)
    };
    let url = match collapse_whitespace(&source.url) {
        u if u.is_empty() => doi_url.clone(),
        u => u,
    };
    let link = if doi_url.is_empty() { url.clone() } else { doi_url };

    let parts: Vec<String> = match style {
        CitationStyle::Mla => vec![
            authors,
            format!("\u{201c}{}.\u{201d}", title),
            format!("{},", publisher),
            format!("{}.", year),
            link,
        ],
        CitationStyle::Harvard => {
            let (available, accessed) = if url.is_empty() {
                (String::new(), String::new())
            } else {
                (
                    format!("Available at: {}", url),
                    format!("(Accessed: {}).", accessed.format("%Y-%m-%d")),
                )
            };
            vec![
                authors,
                format!("({})", year),
                format!("{}.", title),
                format!("{}.", publisher),
                available,
                accessed,
            ]
        }
        CitationStyle::Vancouver => vec![
            authors,
            format!("{}.", title),
            format!("{};", publisher),
            format!("{}.", year),
            if url.is_empty() {
                String::new()
            } else {
                format!("Available from: {}", url)
            },
        ],
        CitationStyle::Chicago => vec![
            authors,
            format!("{}.", year),
            format!("{}.", title),
            format!("{}.", publisher),
            link,
        ],
    };

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// CSL name object: `"Family, Given"`, `"Given Middle Family"`, or a
/// single-word literal.
pub fn split_name(name: &str) -> Option<Value> {
    let text = name.trim();
    if text.is_empty() {
        return None;
    }
    if let Some((family, given)) = text.split_once(',') {
        let given = given.trim();
        let mut obj = Map::new();
        obj.insert("family".to_string(), json!(family.trim()));
        if !given.is_empty() {
            obj.insert("given".to_string(), json!(given));
        }
        return Some(Value::Object(obj));
    }
    let mut parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 2 {
        return Some(json!({ "literal": text }));
    }
    let family = parts.pop().unwrap_or_default();
    Some(json!({ "family": family, "given": parts.join(" ") }))
}

/// CSL-JSON item for the source.
pub fn csl_json(source: &CitationSource) -> Value {
    let doi = normalize_doi(&source.doi);
    let id = [source.url.as_str(), doi.as_str(), source.title.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("clir-item");

    let mut item = Map::new();
    item.insert("id".to_string(), json!(id));
    item.insert("type".to_string(), json!("report"));
    item.insert("title".to_string(), json!(source.title));

    let authors: Vec<Value> = source.creators.iter().filter_map(|n| split_name(n)).collect();
    if !authors.is_empty() {
        item.insert("author".to_string(), Value::Array(authors));
    }
    if let Some(dt) = parse_published(&source.published) {
        item.insert(
            "issued".to_string(),
            json!({ "date-parts": [[dt.year(), dt.month(), dt.day()]] }),
        );
    }
    if !source.publisher.is_empty() {
        item.insert("publisher".to_string(), json!(source.publisher));
    }
    if !doi.is_empty() {
        item.insert("DOI".to_string(), json!(doi));
    }
    if !source.url.is_empty() {
        item.insert("URL".to_string(), json!(source.url));
    }
    Value::Object(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(creators: &[&str]) -> CitationSource {
        CitationSource {
            title: "Stable Systems Report".to_string(),
            creators: creators.iter().map(|s| s.to_string()).collect(),
            published: "2024-06-01".to_string(),
            publisher: DEFAULT_PUBLISHER.to_string(),
            doi: "doi: 10.5281/zenodo.987".to_string(),
            url: "https://zenodo.org/records/987".to_string(),
        }
    }

    fn accessed() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
    }

    #[test]
    fn test_normalize_doi() {
        assert_eq!(normalize_doi("doi:10.1/x"), "10.1/x");
        assert_eq!(normalize_doi("https://dx.doi.org/10.1/x"), "10.1/x");
        assert_eq!(normalize_doi("HTTP://doi.org/10.1/x"), "10.1/x");
        assert_eq!(normalize_doi("10.1/x"), "10.1/x");
        assert_eq!(normalize_doi("doi: https://doi.org/10.1/x"), "10.1/x");
    }

    #[test]
    fn test_join_authors() {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_authors(&names(&[]), CitationStyle::Chicago), "");
        assert_eq!(join_authors(&names(&["A"]), CitationStyle::Mla), "A");
        assert_eq!(join_authors(&names(&["A", "B"]), CitationStyle::Chicago), "A and B");
        assert_eq!(join_authors(&names(&["A", "B"]), CitationStyle::Mla), "A et al.");
        assert_eq!(
            join_authors(&names(&["A", "B", "C"]), CitationStyle::Harvard),
            "A, B, and C"
        );
    }

    #[test]
    fn test_chicago() {
        let text = fallback_citation(&source(&["Jane Doe"]), CitationStyle::Chicago, accessed());
        assert_eq!(
            text,
            "Jane Doe 2024. Stable Systems Report. Council on Library and Information Resources. https://doi.org/10.5281/zenodo.987"
        );
    }

    #[test]
    fn test_mla() {
        let text = fallback_citation(&source(&["Jane Doe", "John Roe"]), CitationStyle::Mla, accessed());
        assert_eq!(
            text,
            "Jane Doe et al. \u{201c}Stable Systems Report.\u{201d} Council on Library and Information Resources, 2024. https://doi.org/10.5281/zenodo.987"
        );
    }

    #[test]
    fn test_harvard_includes_access_date() {
        let text = fallback_citation(&source(&["Jane Doe"]), CitationStyle::Harvard, accessed());
        assert!(text.starts_with("Jane Doe (2024) Stable Systems Report."));
        assert!(text.ends_with("Available at: https://zenodo.org/records/987 (Accessed: 2025-01-02)."));
    }

    #[test]
    fn test_vancouver_without_metadata() {
        let empty = CitationSource::default();
        let text = fallback_citation(&empty, CitationStyle::Vancouver, accessed());
        assert_eq!(
            text,
            "[Untitled]. Council on Library and Information Resources; n.d.."
        );
    }

    #[test]
    fn test_style_parse_falls_back() {
        assert_eq!(CitationStyle::parse("MLA"), CitationStyle::Mla);
        assert_eq!(CitationStyle::parse("apa"), CitationStyle::Chicago);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("Doe, Jane").unwrap(),
            json!({"family": "Doe", "given": "Jane"})
        );
        assert_eq!(
            split_name("Jane Q. Doe").unwrap(),
            json!({"family": "Doe", "given": "Jane Q."})
        );
        assert_eq!(split_name("CLIR").unwrap(), json!({"literal": "CLIR"}));
        assert!(split_name("  ").is_none());
    }

    #[test]
    fn test_csl_json() {
        let item = csl_json(&source(&["Doe, Jane"]));
        assert_eq!(item["id"], "https://zenodo.org/records/987");
        assert_eq!(item["DOI"], "10.5281/zenodo.987");
        assert_eq!(item["issued"]["date-parts"][0][0], 2024);
        assert_eq!(item["author"][0]["family"], "Doe");
    }

    #[test]
    fn test_source_prefers_creator_details() {
        let mut record = CanonicalRecord::new(1, "T");
        record.creators = vec!["Plain Name".to_string()];
        record.creator_details = vec![crate::models::CreatorDetail {
            name: "Detailed Name".to_string(),
            ..Default::default()
        }];
        let src = CitationSource::from_record(&record, DEFAULT_PUBLISHER, "");
        assert_eq!(src.creators, vec!["Detailed Name"]);
    }
}
