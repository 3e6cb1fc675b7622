//! Zenodo connector.
//!
//! Pages through the Zenodo records API for one community and normalizes
//! each hit into a [`CanonicalRecord`]. The result is written as a pretty
//! JSON array to `paths.records`, which the index build and the page
//! renderer read.
//!
//! # Request
//!
//! ```text
//! GET {base_url}?communities=<community>&page=<n>&size=<page_size>&sort=mostrecent
//! Accept: application/json
//! Authorization: Bearer <ZENODO_TOKEN>      (only when set)
//! ```
//!
//! # Paging
//!
//! Pages are requested from 1 upward until a page comes back empty or the
//! number of collected records reaches `hits.total` (a number, or an object
//! with a numeric `value`). When no total is reported the collected count
//! stands in, so a single page is read.
//!
//! Hits without a numeric `id` or an object `metadata` are skipped.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use pubcat_core::models::{
    CanonicalRecord, CreatorDetail, Funder, License, RecordFile, RecordLinks, RelatedIdentifier,
    DEFAULT_RECORD_TYPE,
};

use crate::config::{Config, ZenodoConfig};
use crate::fsutil::write_atomic;

/// One page of raw search results.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, page: usize) -> Result<Value>;
}

/// HTTP client for the Zenodo records API.
pub struct ZenodoClient {
    client: reqwest::Client,
    config: ZenodoConfig,
}

impl ZenodoClient {
    pub fn new(config: ZenodoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn page_url(&self, page: usize) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.config.base_url)
            .with_context(|| format!("Invalid zenodo.base_url: {}", self.config.base_url))?;
        url.query_pairs_mut()
            .append_pair("communities", &self.config.community)
            .append_pair("page", &page.to_string())
            .append_pair("size", &self.config.page_size.to_string())
            .append_pair("sort", "mostrecent");
        Ok(url)
    }
}

#[async_trait]
impl PageFetcher for ZenodoClient {
    async fn fetch_page(&self, page: usize) -> Result<Value> {
        let url = self.page_url(page)?;
        debug!(%url, "fetching Zenodo page");

        let mut request = self
            .client
            .get(url.clone())
            .header("Accept", "application/json");
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Zenodo request failed | URL: {}", url))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Zenodo fetch failed: {} | URL: {} | Body: {}", status, url, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Zenodo returned malformed JSON | URL: {}", url))
    }
}

/// Reported total hit count, if any.
pub fn hits_total(page: &Value) -> Option<u64> {
    let total = page.pointer("/hits/total")?;
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
}

/// Collect and normalize every record across pages.
pub async fn collect_records<F: PageFetcher + ?Sized>(fetcher: &F) -> Result<Vec<CanonicalRecord>> {
    let mut all: Vec<CanonicalRecord> = Vec::new();
    let mut page = 1;

    loop {
        let data = fetcher.fetch_page(page).await?;
        let hits = data
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if hits.is_empty() {
            break;
        }

        for hit in hits {
            match normalize_hit(hit) {
                Some(record) => all.push(record),
                None => warn!(page, "skipping malformed Zenodo hit"),
            }
        }

        let total = hits_total(&data).unwrap_or(all.len() as u64);
        info!(page, collected = all.len(), total, "fetched Zenodo page");
        if all.len() as u64 >= total {
            break;
        }
        page += 1;
    }

    Ok(all)
}

/// A hit is usable when it has a numeric `id` and an object `metadata`.
pub fn is_valid_hit(hit: &Value) -> bool {
    hit.get("id").is_some_and(Value::is_number) && hit.get("metadata").is_some_and(Value::is_object)
}

/// Record type from the first `type:<x>` keyword, `report` when none.
///
/// `type:` with an empty value yields `other`.
pub fn infer_type_from_keywords(keywords: &[String]) -> String {
    let tag = keywords.iter().find(|k| {
        k.get(..5)
            .is_some_and(|head| head.eq_ignore_ascii_case("type:"))
    });
    match tag {
        Some(tag) => {
            let value = tag[5..].split(':').next().unwrap_or("").trim().to_lowercase();
            if value.is_empty() {
                "other".to_string()
            } else {
                value
            }
        }
        None => DEFAULT_RECORD_TYPE.to_string(),
    }
}

fn text(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn array<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// A string, or the `id`/`type` of an object standing in for one.
fn loose_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(o)) => o
            .get("id")
            .or_else(|| o.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        _ => String::new(),
    }
}

/// Thumbnail URLs from `links.thumbnails`, falling back to `links.thumbs`.
pub fn extract_thumbnails(links: &Value) -> BTreeMap<String, String> {
    let source = links
        .get("thumbnails")
        .filter(|v| v.is_object())
        .or_else(|| links.get("thumbs").filter(|v| v.is_object()));
    let Some(Value::Object(map)) = source else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(size, url)| match url.as_str() {
            Some(u) if !u.is_empty() => Some((size.clone(), u.to_string())),
            _ => None,
        })
        .collect()
}

fn creator_details(metadata: &Value) -> Vec<CreatorDetail> {
    array(metadata, "/creators")
        .iter()
        .map(|c| {
            let affiliation = match c.get("affiliation") {
                Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|a| a.as_str().or_else(|| a.get("name").and_then(Value::as_str)))
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
                    .collect(),
                _ => Vec::new(),
            };
            CreatorDetail {
                name: text(c, "/name"),
                orcid: text(c, "/orcid"),
                affiliation,
            }
        })
        .filter(|c| !c.name.is_empty())
        .collect()
}

fn related_identifiers(metadata: &Value) -> Vec<RelatedIdentifier> {
    array(metadata, "/related_identifiers")
        .iter()
        .map(|r| RelatedIdentifier {
            identifier: text(r, "/identifier"),
            scheme: loose_id(r.get("scheme")),
            relation: loose_id(r.get("relation")),
            resource_type: loose_id(r.get("resource_type")),
        })
        .filter(|r| !r.identifier.is_empty())
        .collect()
}

fn license(metadata: &Value) -> Option<License> {
    let value = metadata.get("license")?;
    if let Some(id) = value.as_str() {
        return (!id.is_empty()).then(|| License {
            id: id.to_string(),
            ..Default::default()
        });
    }
    if !value.is_object() {
        return None;
    }
    let license = License {
        id: text(value, "/id"),
        title: text(value, "/title"),
        url: text(value, "/url"),
    };
    let empty = license.id.is_empty() && license.title.is_empty() && license.url.is_empty();
    (!empty).then_some(license)
}

fn funders(metadata: &Value) -> Vec<Funder> {
    let entries = match array(metadata, "/funding") {
        [] => array(metadata, "/grants"),
        funding => funding,
    };
    entries
        .iter()
        .map(|f| {
            let nested = f.get("funder").unwrap_or(&Value::Null);
            let pick = |key: &str| {
                nested
                    .get(key)
                    .or_else(|| f.get(key))
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string()
            };
            Funder {
                id: pick("id"),
                name: pick("name"),
            }
        })
        .filter(|f| !f.id.is_empty() || !f.name.is_empty())
        .collect()
}

/// Normalize one hit, or `None` when it fails [`is_valid_hit`].
pub fn normalize_hit(hit: &Value) -> Option<CanonicalRecord> {
    if !is_valid_hit(hit) {
        return None;
    }
    let zenodo_id = hit.get("id").and_then(Value::as_u64)?;
    let md = hit.get("metadata").unwrap_or(&Value::Null);

    let keywords: Vec<String> = array(md, "/keywords")
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    let mut record = CanonicalRecord::new(zenodo_id, text(md, "/title"));
    record.published = text(md, "/publication_date");
    record.description = text(md, "/description");
    record.creators = array(md, "/creators")
        .iter()
        .filter_map(|c| c.get("name").and_then(Value::as_str))
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    record.creator_details = creator_details(md);
    record.doi = text(md, "/doi");
    record.record_type = infer_type_from_keywords(&keywords);
    record.keywords = keywords;
    record.zenodo_html = text(hit, "/links/html");
    record.links = RecordLinks {
        thumbnails: hit
            .get("links")
            .map(extract_thumbnails)
            .unwrap_or_default(),
    };
    record.files = array(hit, "/files")
        .iter()
        .map(|f| RecordFile {
            key: text(f, "/key"),
            url: text(f, "/links/self"),
        })
        .collect();
    record.related_identifiers = related_identifiers(md);
    record.license = license(md);
    record.communities = array(md, "/communities")
        .iter()
        .map(|c| loose_id(Some(c)))
        .filter(|c| !c.is_empty())
        .collect();
    record.funders = funders(md);

    Some(record)
}

/// Write records as pretty JSON, replacing `path` atomically.
pub fn write_records(path: &Path, records: &[CanonicalRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("Failed to serialize records")?;
    write_atomic(path, json.as_bytes())
}

/// Run `pubcat fetch`: download, normalize, write.
pub async fn run_fetch(config: &Config) -> Result<()> {
    let client = ZenodoClient::new(config.zenodo.clone())?;
    let records = collect_records(&client).await?;
    write_records(&config.paths.records, &records)?;

    println!(
        "Fetched {} Zenodo records from community \"{}\" -> {}",
        records.len(),
        config.zenodo.community,
        config.paths.records.display()
    );
    Ok(())
}
