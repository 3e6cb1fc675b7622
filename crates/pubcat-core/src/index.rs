//! Search index build.
//!
//! Turns [`CanonicalRecord`]s into [`SearchDocument`]s and an
//! [`InvertedIndex`] over the fields `title`, `description`, `creators` and
//! `keywords`, with `title`, `published`, `type` and `url` stored per
//! document. The whole bundle serializes deterministically: building twice
//! from the same records yields byte-identical `index` and `docs`.
//!
//! # Document mapping
//!
//! | Field | Source |
//! |-------|--------|
//! | `id` | `"zenodo-" + zenodo_id` |
//! | `description` | [`strip_markup`] of the record description |
//! | `creators`, `keywords` | joined with `"; "` |
//! | `type` | record type (`"report"` by default) |
//! | `url` | `"/reports/zenodo-" + zenodo_id + "/"` |
//! | `searchable` | lowercase title + first 1200 description chars + creators + keywords |

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::{CanonicalRecord, SearchDocument, SearchIndexArtifact};
use crate::text::{collapse_whitespace, strip_markup, truncate_chars};

/// Indexed fields, in posting field-ordinal order.
pub const INDEX_FIELDS: [&str; 4] = ["title", "description", "creators", "keywords"];

/// Fields kept verbatim per document inside the index.
pub const STORE_FIELDS: [&str; 4] = ["title", "published", "type", "url"];

/// Description prefix length folded into the `searchable` blob.
pub const SEARCHABLE_DESCRIPTION_CHARS: usize = 1200;

/// One term occurrence list entry: document ordinal, field ordinal, count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: usize,
    pub field: usize,
    pub tf: u32,
}

/// Stored fields for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredFields {
    pub id: String,
    pub title: String,
    pub published: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub url: String,
}

/// Term → postings map over the indexed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvertedIndex {
    pub fields: Vec<String>,
    pub store_fields: Vec<String>,
    pub document_count: usize,
    /// Token count per document per field.
    pub field_lengths: Vec<[u32; 4]>,
    pub terms: BTreeMap<String, Vec<Posting>>,
    pub stored_fields: Vec<StoredFields>,
}

/// Split field text into index terms: lowercase alphanumeric runs.
pub fn index_terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl InvertedIndex {
    /// Build the index over `docs`; document ordinals follow slice order.
    pub fn build(docs: &[SearchDocument]) -> Self {
        let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        let mut field_lengths = Vec::with_capacity(docs.len());
        let mut stored_fields = Vec::with_capacity(docs.len());

        for (doc_idx, doc) in docs.iter().enumerate() {
            let values = [
                doc.title.as_str(),
                doc.description.as_str(),
                doc.creators.as_str(),
                doc.keywords.as_str(),
            ];
            let mut lengths = [0u32; 4];

            for (field_idx, value) in values.iter().enumerate() {
                let mut counts: BTreeMap<String, u32> = BTreeMap::new();
                for term in index_terms(value) {
                    lengths[field_idx] += 1;
                    *counts.entry(term).or_insert(0) += 1;
                }
                for (term, tf) in counts {
                    terms.entry(term).or_default().push(Posting {
                        doc: doc_idx,
                        field: field_idx,
                        tf,
                    });
                }
            }

            field_lengths.push(lengths);
            stored_fields.push(StoredFields {
                id: doc.id.clone(),
                title: doc.title.clone(),
                published: doc.published.clone(),
                doc_type: doc.doc_type.clone(),
                url: doc.url.clone(),
            });
        }

        Self {
            fields: INDEX_FIELDS.iter().map(|f| f.to_string()).collect(),
            store_fields: STORE_FIELDS.iter().map(|f| f.to_string()).collect(),
            document_count: docs.len(),
            field_lengths,
            terms,
            stored_fields,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Terms ordered by document frequency (desc), then alphabetically.
    pub fn top_terms(&self, n: usize) -> Vec<(&str, usize)> {
        let mut freq: Vec<(&str, usize)> = self
            .terms
            .iter()
            .map(|(term, postings)| {
                let docs: HashSet<usize> = postings.iter().map(|p| p.doc).collect();
                (term.as_str(), docs.len())
            })
            .collect();
        freq.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        freq.truncate(n);
        freq
    }
}

/// Lowercase, whitespace-normalized match blob for a record.
///
/// `description` must already be stripped of markup.
pub fn searchable_blob(record: &CanonicalRecord, description: &str) -> String {
    let joined = [
        record.title.as_str(),
        truncate_chars(description, SEARCHABLE_DESCRIPTION_CHARS),
        record.creators.join(" ").as_str(),
        record.keywords.join(" ").as_str(),
    ]
    .join(" ");
    collapse_whitespace(&joined.to_lowercase())
}

/// Project one record into its search document.
pub fn build_document(record: &CanonicalRecord) -> SearchDocument {
    let description = strip_markup(&record.description);
    let searchable = searchable_blob(record, &description);
    SearchDocument {
        id: record.document_id(),
        title: record.title.clone(),
        description,
        creators: record.creators.join("; "),
        keywords: record.keywords.join("; "),
        published: record.published.clone(),
        doc_type: record.record_type.clone(),
        url: record.report_url(),
        searchable,
    }
}

/// Project every record, in order.
///
/// Fails if two records share an identifier.
pub fn build_documents(records: &[CanonicalRecord]) -> Result<Vec<SearchDocument>> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.zenodo_id) {
            bail!("duplicate record identifier: {}", record.zenodo_id);
        }
    }
    Ok(records.iter().map(build_document).collect())
}

/// Build the complete artifact. `generated_at` is stamped verbatim.
pub fn build_artifact(
    records: &[CanonicalRecord],
    generated_at: impl Into<String>,
) -> Result<SearchIndexArtifact> {
    let docs = build_documents(records)?;
    let index = InvertedIndex::build(&docs);
    Ok(SearchIndexArtifact {
        generated_at: generated_at.into(),
        index,
        docs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CanonicalRecord {
        let mut r = CanonicalRecord::new(987, "Stable Systems Report");
        r.published = "2024-06-01".to_string();
        r.description = "<p>Detailed report body</p>".to_string();
        r.creators = vec!["A. Author".to_string()];
        r.keywords = vec!["type:report".to_string(), "topic:stability".to_string()];
        r
    }

    #[test]
    fn test_document_mapping() {
        let doc = build_document(&sample_record());
        assert_eq!(doc.id, "zenodo-987");
        assert_eq!(doc.url, "/reports/zenodo-987/");
        assert_eq!(doc.description, "Detailed report body");
        assert_eq!(doc.creators, "A. Author");
        assert_eq!(doc.keywords, "type:report; topic:stability");
        assert_eq!(doc.doc_type, "report");
        assert!(doc.searchable.contains("stable systems report"));
        assert_eq!(doc.searchable, doc.searchable.to_lowercase());
    }

    #[test]
    fn test_searchable_is_normalized_with_empty_parts() {
        let r = CanonicalRecord::new(1, "  Lone   Title ");
        let doc = build_document(&r);
        assert_eq!(doc.searchable, "lone title");
    }

    #[test]
    fn test_searchable_truncates_description() {
        let mut r = CanonicalRecord::new(1, "T");
        r.description = format!("{}zzzz", "a".repeat(SEARCHABLE_DESCRIPTION_CHARS));
        let doc = build_document(&r);
        assert!(!doc.searchable.contains('z'));
        assert!(doc.description.ends_with("zzzz"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let records = vec![sample_record(), sample_record()];
        assert!(build_documents(&records).is_err());
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut other = CanonicalRecord::new(12, "Digital Preservation Handbook");
        other.creators = vec!["B. Writer".to_string()];
        let records = vec![sample_record(), other];

        let a = build_artifact(&records, "t1").unwrap();
        let b = build_artifact(&records, "t2").unwrap();
        assert_eq!(
            serde_json::to_string(&a.docs).unwrap(),
            serde_json::to_string(&b.docs).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&a.index).unwrap(),
            serde_json::to_string(&b.index).unwrap()
        );
        assert_ne!(a.generated_at, b.generated_at);
    }

    #[test]
    fn test_docs_keep_record_order() {
        let records = vec![
            CanonicalRecord::new(3, "C"),
            CanonicalRecord::new(1, "A"),
            CanonicalRecord::new(2, "B"),
        ];
        let artifact = build_artifact(&records, "now").unwrap();
        let ids: Vec<&str> = artifact.docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["zenodo-3", "zenodo-1", "zenodo-2"]);
    }

    #[test]
    fn test_postings_record_field_ordinals() {
        let artifact = build_artifact(&[sample_record()], "now").unwrap();
        let index = &artifact.index;

        let postings = &index.terms["stable"];
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].field, 0);
        assert_eq!(index.terms["stability"][0].field, 3);
        assert!(!index.terms.contains_key("Stable"));

        assert_eq!(index.stored_fields[0].url, "/reports/zenodo-987/");
        assert_eq!(index.document_count, 1);
    }

    #[test]
    fn test_top_terms_by_document_frequency() {
        let records = vec![
            CanonicalRecord::new(1, "Library report"),
            CanonicalRecord::new(2, "Library data"),
        ];
        let artifact = build_artifact(&records, "now").unwrap();
        let top = artifact.index.top_terms(1);
        assert_eq!(top, vec![("library", 2)]);
    }
}
