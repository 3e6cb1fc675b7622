//! Browse state and its URL query-string form.
//!
//! | Param | Meaning | Default (omitted from URL) |
//! |-------|---------|----------------------------|
//! | `q` | free-text filter | empty |
//! | `category` | lowercase category or `all` | `all` |
//! | `sort` | `newest`, `oldest`, `title-asc`, `title-desc` | `newest` |
//! | `page` | positive page number | `1` |
//! | `size` | `12`, `24` or `48` | `12` |
//!
//! Malformed values fall back to defaults instead of failing: a bad link
//! should still open the catalog.

use serde::Serialize;
use std::fmt;
use url::form_urlencoded;

pub const ALL_CATEGORIES: &str = "all";
pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const PAGE_SIZES: [usize; 3] = [12, 24, 48];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::TitleAsc => "title-asc",
            SortOrder::TitleDesc => "title-desc",
        }
    }

    /// Parse a sort name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "newest" => Some(SortOrder::Newest),
            "oldest" => Some(SortOrder::Oldest),
            "title-asc" => Some(SortOrder::TitleAsc),
            "title-desc" => Some(SortOrder::TitleDesc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The widget's query/filter/sort/pagination configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowseState {
    pub query: String,
    pub category: String,
    pub sort: SortOrder,
    pub page_size: usize,
    pub page: usize,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: ALL_CATEGORIES.to_string(),
            sort: SortOrder::Newest,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

/// Leading integer of `value`, the way browsers' `parseInt` reads it
/// (`"2abc"` → 2, `"abc"` → none). Digit runs too long for `i64`
/// saturate toward the sign.
fn parse_leading_int(value: &str) -> Option<i64> {
    let v = value.trim_start();
    let (sign, digits) = match v.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, v.strip_prefix('+').unwrap_or(v)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}

/// Validate a page size, falling back to [`DEFAULT_PAGE_SIZE`].
pub fn parse_page_size(value: &str) -> usize {
    parse_leading_int(value)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| PAGE_SIZES.contains(n))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Validate a page number, falling back to 1.
pub fn parse_page(value: &str) -> usize {
    parse_leading_int(value)
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(1)
}

impl BrowseState {
    /// Read state from a URL query string (with or without leading `?`).
    pub fn from_query_string(query_string: &str) -> Self {
        let qs = query_string.strip_prefix('?').unwrap_or(query_string);
        let mut params: Vec<(String, String)> = Vec::new();
        for (key, value) in form_urlencoded::parse(qs.as_bytes()) {
            params.push((key.into_owned(), value.into_owned()));
        }
        let get = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let category = get("category").unwrap_or("").trim().to_lowercase();

        Self {
            query: get("q").unwrap_or("").trim().to_string(),
            category: if category.is_empty() {
                ALL_CATEGORIES.to_string()
            } else {
                category
            },
            sort: get("sort").and_then(SortOrder::parse).unwrap_or_default(),
            page_size: get("size").map(parse_page_size).unwrap_or(DEFAULT_PAGE_SIZE),
            page: get("page").map(parse_page).unwrap_or(1),
        }
    }

    /// Serialize the non-default parts of the state, without leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        if !self.query.is_empty() {
            ser.append_pair("q", &self.query);
        }
        if self.category != ALL_CATEGORIES {
            ser.append_pair("category", &self.category);
        }
        if self.sort != SortOrder::Newest {
            ser.append_pair("sort", self.sort.as_str());
        }
        if self.page != 1 {
            ser.append_pair("page", &self.page.to_string());
        }
        if self.page_size != DEFAULT_PAGE_SIZE {
            ser.append_pair("size", &self.page_size.to_string());
        }
        ser.finish()
    }

    /// `pathname` plus the query string, if any.
    pub fn url(&self, pathname: &str) -> String {
        let qs = self.to_query_string();
        if qs.is_empty() {
            pathname.to_string()
        } else {
            format!("{}?{}", pathname, qs)
        }
    }
}
