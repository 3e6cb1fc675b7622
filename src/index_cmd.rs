//! Index build command.
//!
//! Reads the records file, projects every record into a search document,
//! builds the inverted index and writes the artifact in one atomic replace.
//! Any failure (missing input, malformed JSON, duplicate identifiers)
//! aborts before the output path is touched.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

use pubcat_core::index::build_artifact;
use pubcat_core::models::{CanonicalRecord, SearchIndexArtifact};

use crate::config::Config;
use crate::fsutil::write_atomic;

/// Read a records file: a JSON array of canonical records.
pub fn read_records(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Build the artifact from `input` and write it to `output`.
pub fn build_index_file(
    input: &Path,
    output: &Path,
    generated_at: &str,
) -> Result<SearchIndexArtifact> {
    let records = read_records(input)?;
    let artifact = build_artifact(&records, generated_at)
        .with_context(|| format!("Failed to build index from {}", input.display()))?;
    let json = serde_json::to_vec(&artifact).context("Failed to serialize search index")?;
    write_atomic(output, &json)?;
    Ok(artifact)
}

/// Run `pubcat build-index`.
pub fn run_build_index(
    config: &Config,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let input = input.unwrap_or_else(|| config.paths.records.clone());
    let output = output.unwrap_or_else(|| config.paths.index_output.clone());

    let artifact = build_index_file(&input, &output, &timestamp_now())?;
    info!(
        docs = artifact.docs.len(),
        terms = artifact.index.vocabulary_size(),
        "search index built"
    );
    println!("Built search index -> {}", output.display());
    Ok(())
}
