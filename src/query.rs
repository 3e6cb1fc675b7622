//! Query engine: lazy artifact loading plus ranking.
//!
//! The engine loads the search artifact's `docs` array on the first active
//! query and keeps the outcome for its lifetime. Concurrent queries issued
//! while the load is in flight wait for that same load instead of starting
//! their own. A failed load is kept too: every later query reports the same
//! failure and the source is never read again.
//!
//! Every load failure maps to the single user-facing
//! [`UNAVAILABLE_MESSAGE`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use pubcat_core::models::SearchDocument;
use pubcat_core::search::{rank, with_path_prefix, SearchOutcome, UNAVAILABLE_MESSAGE};
use pubcat_core::text::{parse_published, tokenize_query};

use crate::config::Config;

/// Site-relative location of the published artifact.
pub const INDEX_ASSET_PATH: &str = "/assets/search-index.json";

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("index request failed: {0}")]
    Fetch(String),

    #[error("index request returned status {0}")]
    Status(u16),

    #[error("malformed index payload: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Message shown to users regardless of the cause.
    pub fn user_message(&self) -> &'static str {
        UNAVAILABLE_MESSAGE
    }
}

/// Where the artifact bytes come from.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Human-readable location, for logs.
    fn location(&self) -> String;

    async fn load(&self) -> Result<Vec<u8>, QueryError>;
}

/// Artifact served over HTTP(S). Expects a 2xx status.
pub struct HttpArtifactSource {
    client: reqwest::Client,
    url: url::Url,
}

impl HttpArtifactSource {
    pub fn new(url: url::Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    fn location(&self) -> String {
        self.url.to_string()
    }

    async fn load(&self) -> Result<Vec<u8>, QueryError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| QueryError::Fetch(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Status(status.as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| QueryError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Artifact read from the local filesystem (a built `dist/` tree).
pub struct FileArtifactSource {
    path: PathBuf,
}

impl FileArtifactSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ArtifactSource for FileArtifactSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<u8>, QueryError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| QueryError::Fetch(format!("{}: {}", self.path.display(), e)))
    }
}

#[derive(Deserialize)]
struct DocsPayload {
    #[serde(default)]
    docs: Option<Vec<SearchDocument>>,
}

/// Extract the `docs` array from artifact bytes. A missing or null `docs`
/// is an empty collection.
pub fn parse_docs(bytes: &[u8]) -> Result<Vec<SearchDocument>, QueryError> {
    let payload: DocsPayload =
        serde_json::from_slice(bytes).map_err(|e| QueryError::Malformed(e.to_string()))?;
    Ok(payload.docs.unwrap_or_default())
}

/// Lazily loading query engine over one artifact source.
pub struct QueryEngine<S: ArtifactSource> {
    source: S,
    docs: OnceCell<Result<Arc<Vec<SearchDocument>>, QueryError>>,
}

impl<S: ArtifactSource> QueryEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            docs: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The artifact's documents, loading them on first use. The first
    /// outcome, success or failure, is returned for every later call.
    pub async fn documents(&self) -> Result<Arc<Vec<SearchDocument>>, QueryError> {
        self.docs
            .get_or_init(|| async {
                debug!(location = %self.source.location(), "loading search index");
                match self.source.load().await.and_then(|bytes| parse_docs(&bytes)) {
                    Ok(docs) => Ok(Arc::new(docs)),
                    Err(err) => {
                        warn!(location = %self.source.location(), error = %err, "search index load failed");
                        Err(err)
                    }
                }
            })
            .await
            .clone()
    }

    /// Run a query. A query with no terms returns
    /// [`SearchOutcome::Inactive`] without touching the source.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, QueryError> {
        if tokenize_query(query).is_empty() {
            return Ok(SearchOutcome::Inactive);
        }
        let docs = self.documents().await?;
        Ok(rank(&docs, query))
    }
}

/// Pick the artifact source for `pubcat search`.
///
/// An explicit `--index` wins (URL when it has an http(s) scheme, path
/// otherwise). Without one, a configured `site.base_url` resolves the
/// published asset under the path prefix; failing that, the local build
/// output is read.
pub fn resolve_source(config: &Config, index: Option<&str>) -> Result<Box<dyn ArtifactSource>> {
    if let Some(spec) = index {
        if spec.starts_with("http://") || spec.starts_with("https://") {
            let url = url::Url::parse(spec).with_context(|| format!("Invalid index URL: {}", spec))?;
            return Ok(Box::new(HttpArtifactSource::new(url)));
        }
        return Ok(Box::new(FileArtifactSource::new(spec)));
    }

    if let Some(base) = &config.site.base_url {
        let base = url::Url::parse(base)
            .with_context(|| format!("Invalid site.base_url: {}", base))?;
        let path = with_path_prefix(&config.site.path_prefix, INDEX_ASSET_PATH);
        let url = base
            .join(&path)
            .with_context(|| format!("Failed to resolve {} against {}", path, base))?;
        return Ok(Box::new(HttpArtifactSource::new(url)));
    }

    Ok(Box::new(FileArtifactSource::new(&config.paths.index_output)))
}

#[async_trait]
impl ArtifactSource for Box<dyn ArtifactSource> {
    fn location(&self) -> String {
        (**self).location()
    }

    async fn load(&self) -> Result<Vec<u8>, QueryError> {
        (**self).load().await
    }
}

/// One result row as printed by `pubcat search --json`.
#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub id: String,
    pub title: String,
    pub url: String,
    pub creators: String,
    pub published: String,
    pub score: u32,
}

/// Publication date as `YYYY-MM-DD`, empty when unparseable.
fn format_date(value: &str) -> String {
    parse_published(value)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Run `pubcat search`.
pub async fn run_search(config: &Config, query: &str, index: Option<&str>, json: bool) -> Result<()> {
    let engine = QueryEngine::new(resolve_source(config, index)?);

    let outcome = match engine.search(query).await {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("{}", err.user_message());
            return Err(err).with_context(|| format!("Search index at {}", engine.source().location()));
        }
    };

    if !outcome.is_active() {
        debug!("empty query, nothing to search");
        return Ok(());
    }

    let rows: Vec<ResultRow> = outcome
        .hits()
        .iter()
        .map(|hit| {
            let doc = &hit.document;
            ResultRow {
                id: doc.id.clone(),
                title: if doc.title.is_empty() {
                    "Untitled publication".to_string()
                } else {
                    doc.title.clone()
                },
                url: with_path_prefix(
                    &config.site.path_prefix,
                    if doc.url.is_empty() { "/" } else { doc.url.as_str() },
                ),
                creators: doc.creators.clone(),
                published: format_date(&doc.published),
                score: hit.score,
            }
        })
        .collect();

    let status = outcome.status_line(query);
    if json {
        let body = serde_json::json!({
            "query": query.trim(),
            "status": status,
            "results": rows,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{}", status);
    for (i, row) in rows.iter().enumerate() {
        println!();
        println!("{:>3}. [{:>3}] {}", i + 1, row.score, row.title);
        println!("     {}", row.url);
        if !row.creators.is_empty() {
            println!("     {}", row.creators);
        }
        if !row.published.is_empty() {
            println!("     {}", row.published);
        }
    }
    Ok(())
}
