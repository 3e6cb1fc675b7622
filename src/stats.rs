//! Search artifact statistics.
//!
//! Quick summary of what a built artifact holds: document and term counts,
//! per-type breakdown, most frequent terms, and a digest of the `docs` array
//! that stays the same across rebuilds of identical input. When the records
//! file is present, annual report counts are listed too. Used by
//! `pubcat stats` to check a build before deploying it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use pubcat_core::models::{CanonicalRecord, SearchDocument, SearchIndexArtifact};

use crate::config::Config;
use crate::index_cmd::read_records;

const TOP_TERMS: usize = 10;
const LATEST_ANNUAL_REPORTS: usize = 3;

/// Hex SHA-256 of the serialized `docs` array.
pub fn docs_digest(docs: &[SearchDocument]) -> Result<String> {
    let bytes = serde_json::to_vec(docs).context("Failed to serialize docs")?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Document counts per `type`, alphabetically.
pub fn type_counts(docs: &[SearchDocument]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for doc in docs {
        *counts.entry(doc.doc_type.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Annual reports, newest first by publication string.
pub fn latest_annual_reports(records: &[CanonicalRecord], n: usize) -> Vec<&CanonicalRecord> {
    let mut annual: Vec<&CanonicalRecord> =
        records.iter().filter(|r| r.is_annual_report()).collect();
    annual.sort_by(|a, b| b.published.cmp(&a.published));
    annual.truncate(n);
    annual
}

/// Run `pubcat stats`.
pub fn run_stats(config: &Config, index: Option<PathBuf>) -> Result<()> {
    let path = index.unwrap_or_else(|| config.paths.index_output.clone());
    let raw = std::fs::read(&path)
        .with_context(|| format!("Failed to read search index: {}", path.display()))?;
    let artifact: SearchIndexArtifact = serde_json::from_slice(&raw)
        .with_context(|| format!("Failed to parse search index: {}", path.display()))?;

    println!("pubcat — Search Index Stats");
    println!("===========================");
    println!();
    println!("  Artifact:    {}", path.display());
    println!("  Size:        {}", format_bytes(raw.len() as u64));
    println!("  Generated:   {}", format_generated(&artifact.generated_at));
    println!();
    println!("  Documents:   {}", artifact.docs.len());
    println!("  Vocabulary:  {} terms", artifact.index.vocabulary_size());
    println!("  Docs digest: {}", docs_digest(&artifact.docs)?);

    let types = type_counts(&artifact.docs);
    if !types.is_empty() {
        println!();
        println!("  By type:");
        println!("  {:<24} {:>6}", "TYPE", "DOCS");
        println!("  {}", "-".repeat(31));
        for (doc_type, count) in &types {
            println!("  {:<24} {:>6}", doc_type, count);
        }
    }

    let top = artifact.index.top_terms(TOP_TERMS);
    if !top.is_empty() {
        println!();
        println!("  Top terms:");
        println!("  {:<24} {:>6}", "TERM", "DOCS");
        println!("  {}", "-".repeat(31));
        for (term, docs) in &top {
            println!("  {:<24} {:>6}", term, docs);
        }
    }

    print_records_summary(&config.paths.records);
    println!();
    Ok(())
}

fn print_records_summary(path: &Path) {
    let records = match read_records(path) {
        Ok(records) => records,
        Err(e) => {
            debug!(error = %e, "records file unavailable, skipping summary");
            return;
        }
    };
    let annual = records.iter().filter(|r| r.is_annual_report()).count();

    println!();
    println!("  Records:     {} ({})", records.len(), path.display());
    println!("  Annual reports: {}", annual);
    for record in latest_annual_reports(&records, LATEST_ANNUAL_REPORTS) {
        let date = if record.published.is_empty() {
            "undated"
        } else {
            record.published.as_str()
        };
        println!("    {}  {}", date, record.title);
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// `generatedAt` followed by a relative age, e.g. `"... (3 hours ago)"`.
fn format_generated(generated_at: &str) -> String {
    match DateTime::parse_from_rfc3339(generated_at) {
        Ok(ts) => format!(
            "{} ({})",
            generated_at,
            format_age(Utc::now().timestamp() - ts.timestamp())
        ),
        Err(_) => generated_at.to_string(),
    }
}

fn format_age(delta: i64) -> String {
    if delta < 0 {
        "in the future".to_string()
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    }
}
