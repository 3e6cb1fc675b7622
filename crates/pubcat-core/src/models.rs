//! Core data models used throughout pubcat.
//!
//! [`CanonicalRecord`] is the normalized bibliographic entry produced by the
//! Zenodo connector and consumed by the index build. [`SearchDocument`] is its
//! index-ready projection, and [`SearchIndexArtifact`] is the JSON bundle
//! written to disk and loaded by the query engine.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::index::InvertedIndex;

/// Record type used when upstream metadata carries no `type:` keyword.
pub const DEFAULT_RECORD_TYPE: &str = "report";

/// Keyword marking a record as part of the annual report series.
pub const ANNUAL_REPORT_KEYWORD: &str = "series:annual-report";

/// Treat an explicit JSON `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_record_type() -> String {
    DEFAULT_RECORD_TYPE.to_string()
}

fn record_type_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|t| !t.is_empty())
        .unwrap_or_else(default_record_type))
}

/// Normalized bibliographic record.
///
/// Every textual field deserializes to an empty string when absent or
/// `null`. Fields the core does not interpret (license, funders, related
/// identifiers, and anything unknown in `extra`) are carried through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: String,
    pub zenodo_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub creators: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub creator_details: Vec<CreatorDetail>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub doi: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(
        rename = "type",
        default = "default_record_type",
        deserialize_with = "record_type_or_default"
    )]
    pub record_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zenodo_html: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: RecordLinks,
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<RecordFile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub related_identifiers: Vec<RelatedIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub communities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub funders: Vec<Funder>,
    /// Upstream fields with no dedicated slot.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorDetail {
    pub name: String,
    pub orcid: String,
    pub affiliation: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordLinks {
    /// Thumbnail URLs keyed by pixel size (`"100"`, `"250"`, `"750"`).
    pub thumbnails: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFile {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedIdentifier {
    pub identifier: String,
    pub scheme: String,
    pub relation: String,
    pub resource_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Funder {
    pub id: String,
    pub name: String,
}

impl CanonicalRecord {
    /// Minimal record with the given identifier and title; everything else
    /// takes its default.
    pub fn new(zenodo_id: u64, title: impl Into<String>) -> Self {
        Self {
            kind: "zenodo".to_string(),
            zenodo_id,
            title: title.into(),
            published: String::new(),
            description: String::new(),
            creators: Vec::new(),
            creator_details: Vec::new(),
            doi: String::new(),
            keywords: Vec::new(),
            record_type: default_record_type(),
            zenodo_html: String::new(),
            links: RecordLinks::default(),
            files: Vec::new(),
            related_identifiers: Vec::new(),
            license: None,
            communities: Vec::new(),
            funders: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Composite identifier shared by search documents and catalog cards.
    pub fn document_id(&self) -> String {
        format!("zenodo-{}", self.zenodo_id)
    }

    /// Site-relative URL of the record's report page.
    pub fn report_url(&self) -> String {
        format!("/reports/zenodo-{}/", self.zenodo_id)
    }

    /// Whether the record belongs to the annual report series.
    ///
    /// Only Zenodo reports qualify. The series keyword wins; otherwise the
    /// title must mention "annual report".
    pub fn is_annual_report(&self) -> bool {
        if self.kind != "zenodo" || self.record_type != DEFAULT_RECORD_TYPE {
            return false;
        }
        if self
            .keywords
            .iter()
            .any(|k| k.to_lowercase() == ANNUAL_REPORT_KEYWORD)
        {
            return true;
        }
        self.title.to_lowercase().contains("annual report")
    }
}

/// Index-ready projection of a [`CanonicalRecord`].
///
/// All fields default to empty strings when reading an artifact, whether
/// absent or `null`, so a partially populated `docs` entry still scores
/// (against empty fields).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    /// `"zenodo-" + identifier`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Description with markup stripped.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Creator names joined with `"; "`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub creators: String,
    /// Keywords joined with `"; "`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: String,
    /// ISO-8601 publication date.
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub doc_type: String,
    /// `"/reports/zenodo-" + identifier + "/"`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Lowercase, whitespace-normalized match blob.
    #[serde(default, deserialize_with = "null_as_default")]
    pub searchable: String,
}

/// The persisted search bundle: inverted index plus stored documents in
/// record order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexArtifact {
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub index: InvertedIndex,
    pub docs: Vec<SearchDocument>,
}
