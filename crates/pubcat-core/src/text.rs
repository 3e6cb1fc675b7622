//! Text normalization shared by the index build, the query engine, and the
//! catalog widget.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Entity replacements, applied in order over the whole string.
static ENTITY_RES: LazyLock<[(Regex, &'static str); 4]> = LazyLock::new(|| {
    [
        (Regex::new(r"(?i)&nbsp;").unwrap(), " "),
        (Regex::new(r"(?i)&amp;").unwrap(), "&"),
        (Regex::new(r"(?i)&lt;").unwrap(), "<"),
        (Regex::new(r"(?i)&gt;").unwrap(), ">"),
    ]
});

/// Strip markup from a description.
///
/// Every `<...>` tag becomes a single space, `&nbsp;`, `&amp;`, `&lt;` and
/// `&gt;` collapse to their literal characters, then whitespace runs are
/// collapsed and the result trimmed.
pub fn strip_markup(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let mut out = TAG_RE.replace_all(value, " ").into_owned();
    for (re, replacement) in ENTITY_RES.iter() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    collapse_whitespace(&out)
}

/// Replace tags with spaces and collapse whitespace, leaving entities as-is.
pub fn strip_tags(value: &str) -> String {
    collapse_whitespace(&TAG_RE.replace_all(value, " "))
}

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of `value`.
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Split a query into lowercase terms on whitespace runs, dropping empties.
///
/// An empty result means "no active query".
pub fn tokenize_query(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// True when `haystack` contains every term as a substring.
pub fn contains_all(haystack: &str, terms: &[String]) -> bool {
    terms.iter().all(|t| haystack.contains(t.as_str()))
}

/// Parse a publication date string.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` (read as UTC),
/// `YYYY-MM-DD`, `YYYY-MM` and `YYYY`. Anything else is `None`.
pub fn parse_published(value: &str) -> Option<DateTime<Utc>> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    let date = NaiveDate::parse_from_str(v, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", v), "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            if v.len() == 4 && v.chars().all(|c| c.is_ascii_digit()) {
                v.parse::<i32>()
                    .ok()
                    .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
            } else {
                None
            }
        })?;
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}
