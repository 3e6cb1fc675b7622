//! schema.org `Report` markup for record pages.

use serde_json::{json, Map, Value};

use crate::citation::DEFAULT_PUBLISHER;
use crate::models::{CanonicalRecord, DEFAULT_RECORD_TYPE};
use crate::text::strip_tags;

/// Thumbnail sizes tried for `image`, largest first.
const THUMBNAIL_SIZES: [&str; 3] = ["750", "250", "100"];

/// Drop nulls, empty strings, and empty arrays or objects, recursively.
///
/// Containers emptied by the pass are dropped too. A top-level value that
/// compacts to nothing is returned as-is (an empty array or object).
pub fn compact(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(compact)
                .filter(|v| !is_blank(v))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, compact(v)))
                .filter(|(_, v)| !is_blank(v))
                .collect(),
        ),
        other => other,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn orcid_url(orcid: &str) -> String {
    if orcid.is_empty() {
        return String::new();
    }
    let bare = orcid
        .strip_prefix("https://orcid.org/")
        .or_else(|| orcid.strip_prefix("http://orcid.org/"))
        .unwrap_or(orcid);
    format!("https://orcid.org/{}", bare)
}

fn authors(record: &CanonicalRecord) -> Vec<Value> {
    if record.creator_details.is_empty() {
        return record
            .creators
            .iter()
            .map(|name| json!({ "@type": "Person", "name": name }))
            .collect();
    }
    record
        .creator_details
        .iter()
        .map(|creator| {
            let affiliation: Vec<Value> = creator
                .affiliation
                .iter()
                .map(|name| json!({ "@type": "Organization", "name": name }))
                .collect();
            compact(json!({
                "@type": "Person",
                "name": creator.name,
                "sameAs": orcid_url(&creator.orcid),
                "affiliation": affiliation,
            }))
        })
        .collect()
}

fn identifiers(record: &CanonicalRecord) -> Vec<Value> {
    let mut out = Vec::new();
    if !record.doi.is_empty() {
        out.push(json!({ "@type": "PropertyValue", "propertyID": "DOI", "value": record.doi }));
    }
    if record.zenodo_id != 0 {
        out.push(json!({
            "@type": "PropertyValue",
            "propertyID": "Zenodo",
            "value": record.zenodo_id.to_string(),
        }));
    }
    out
}

fn related_works(record: &CanonicalRecord) -> Vec<Value> {
    record
        .related_identifiers
        .iter()
        .filter(|r| !r.identifier.is_empty())
        .map(|r| {
            let url = if r.scheme.eq_ignore_ascii_case("doi") {
                format!("https://doi.org/{}", r.identifier)
            } else {
                String::new()
            };
            compact(json!({
                "@type": "CreativeWork",
                "identifier": r.identifier,
                "url": url,
                "additionalType": r.resource_type,
            }))
        })
        .collect()
}

fn funders(record: &CanonicalRecord) -> Vec<Value> {
    record
        .funders
        .iter()
        .map(|f| compact(json!({ "@type": "Organization", "name": f.name, "identifier": f.id })))
        .filter(|v| v.get("name").is_some())
        .collect()
}

/// JSON-LD for a Zenodo report page, or `None` for any other record.
pub fn report_json_ld(record: &CanonicalRecord) -> Option<Value> {
    if record.kind != "zenodo" || record.record_type != DEFAULT_RECORD_TYPE {
        return None;
    }

    let doi_url = if record.doi.is_empty() {
        String::new()
    } else {
        format!("https://doi.org/{}", record.doi)
    };
    let canonical = if record.zenodo_html.is_empty() {
        doi_url.clone()
    } else {
        record.zenodo_html.clone()
    };
    let image = THUMBNAIL_SIZES
        .iter()
        .filter_map(|size| record.links.thumbnails.get(*size))
        .find(|url| !url.is_empty())
        .cloned()
        .unwrap_or_default();
    let encoding = record
        .files
        .first()
        .filter(|f| !f.url.is_empty())
        .map(|f| json!({ "@type": "MediaObject", "contentUrl": f.url }))
        .unwrap_or(Value::Null);
    let license = record
        .license
        .as_ref()
        .map(|l| l.url.clone())
        .unwrap_or_default();

    let mut doc = Map::new();
    doc.insert("@context".into(), json!("https://schema.org"));
    doc.insert("@type".into(), json!("Report"));
    doc.insert("@id".into(), json!(canonical));
    doc.insert("name".into(), json!(record.title));
    doc.insert("headline".into(), json!(record.title));
    doc.insert("description".into(), json!(strip_tags(&record.description)));
    doc.insert("datePublished".into(), json!(record.published));
    doc.insert("url".into(), json!(canonical));
    doc.insert("sameAs".into(), json!(doi_url));
    doc.insert("author".into(), Value::Array(authors(record)));
    doc.insert(
        "publisher".into(),
        json!({
            "@type": "Organization",
            "name": DEFAULT_PUBLISHER,
            "alternateName": "CLIR",
            "url": "https://www.clir.org",
        }),
    );
    doc.insert("identifier".into(), Value::Array(identifiers(record)));
    doc.insert("image".into(), json!(image));
    doc.insert("encoding".into(), encoding);
    doc.insert("license".into(), json!(license));
    doc.insert("citation".into(), Value::Array(related_works(record)));
    doc.insert("funder".into(), Value::Array(funders(record)));
    doc.insert("keywords".into(), json!(record.keywords));

    Some(compact(Value::Object(doc)))
}
