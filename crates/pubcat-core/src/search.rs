//! Query scoring and ranking over stored [`SearchDocument`]s.
//!
//! The algorithm operates entirely on in-memory documents; loading the
//! artifact is the caller's job (see the `pubcat::query` engine).
//!
//! # Scoring
//!
//! 1. Tokenize: lowercase, split on whitespace, drop empties. No tokens
//!    means [`SearchOutcome::Inactive`].
//! 2. Reject any document whose `searchable` blob lacks one of the tokens.
//! 3. Per token: +12 in title, +6 in keywords, +5 in creators, +1 always.
//! 4. Sort by score (desc), then `published` (desc, string order).
//! 5. Truncate to [`MAX_RESULTS`].
//!
//! Matching is plain substring containment: `"art"` matches `"start"`.

use serde::Serialize;

use crate::models::SearchDocument;
use crate::text::tokenize_query;

pub const TITLE_WEIGHT: u32 = 12;
pub const KEYWORD_WEIGHT: u32 = 6;
pub const CREATOR_WEIGHT: u32 = 5;
/// Credited for every token once the document passes the blob filter.
pub const MATCH_WEIGHT: u32 = 1;
pub const MAX_RESULTS: usize = 24;

/// Status shown while the artifact is loading.
pub const SEARCHING_MESSAGE: &str = "Searching...";

/// Status shown when the artifact could not be loaded.
pub const UNAVAILABLE_MESSAGE: &str = "Search is temporarily unavailable.";

/// A ranked document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub document: SearchDocument,
    pub score: u32,
}

/// Result of running a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The query had no terms; the results panel should be hidden.
    Inactive,
    /// Ranked hits, possibly empty.
    Ranked(Vec<SearchHit>),
}

impl SearchOutcome {
    pub fn is_active(&self) -> bool {
        matches!(self, SearchOutcome::Ranked(_))
    }

    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Inactive => &[],
            SearchOutcome::Ranked(hits) => hits,
        }
    }

    /// User-facing status line; empty when inactive.
    pub fn status_line(&self, query: &str) -> String {
        match self {
            SearchOutcome::Inactive => String::new(),
            SearchOutcome::Ranked(hits) => format!(
                "Found {} result{} for \"{}\".",
                hits.len(),
                if hits.len() == 1 { "" } else { "s" },
                query.trim()
            ),
        }
    }
}

/// Score one document against pre-tokenized terms. Zero means excluded.
pub fn score_document(doc: &SearchDocument, terms: &[String]) -> u32 {
    let title = doc.title.to_lowercase();
    let creators = doc.creators.to_lowercase();
    let keywords = doc.keywords.to_lowercase();
    let searchable = doc.searchable.to_lowercase();

    let mut score = 0;
    for term in terms {
        let term = term.as_str();
        if !searchable.contains(term) {
            return 0;
        }
        if title.contains(term) {
            score += TITLE_WEIGHT;
        }
        if keywords.contains(term) {
            score += KEYWORD_WEIGHT;
        }
        if creators.contains(term) {
            score += CREATOR_WEIGHT;
        }
        score += MATCH_WEIGHT;
    }
    score
}

/// Rank `docs` for `query`.
pub fn rank(docs: &[SearchDocument], query: &str) -> SearchOutcome {
    let terms = tokenize_query(query);
    if terms.is_empty() {
        return SearchOutcome::Inactive;
    }

    let mut hits: Vec<SearchHit> = docs
        .iter()
        .filter_map(|doc| {
            let score = score_document(doc, &terms);
            (score > 0).then(|| SearchHit {
                document: doc.clone(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.document.published.cmp(&a.document.published))
    });
    hits.truncate(MAX_RESULTS);

    SearchOutcome::Ranked(hits)
}

/// Prepend the site path prefix to an absolute site path.
///
/// A trailing slash on the prefix is dropped and a prefix of `/` (or empty)
/// leaves the path untouched. Relative paths pass through unchanged.
pub fn with_path_prefix(prefix: &str, path: &str) -> String {
    if !path.starts_with('/') {
        return path.to_string();
    }
    let normalized = prefix.strip_suffix('/').unwrap_or(prefix);
    if normalized.is_empty() {
        return path.to_string();
    }
    format!("{}{}", normalized, path)
}
