//! Filter, sort, paginate, and the action loop that drives them.
//!
//! Every user action is one state transition followed by exactly one
//! render pass. [`render`] is pure apart from clamping `state.page` into
//! range, so it can be exercised against fixture cards directly.

use anyhow::{bail, Result};
use serde::Serialize;
use std::cmp::Ordering;

use super::card::{collect_categories, CardSource, CardView, CategoryOption};
use super::state::{
    parse_page_size, BrowseState, SortOrder, ALL_CATEGORIES, DEFAULT_PAGE_SIZE, PAGE_SIZES,
};
use crate::text::{contains_all, parse_published, tokenize_query};

/// A user interaction with the widget controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseAction {
    /// New contents of the search box.
    Search(String),
    SelectCategory(String),
    SelectSort(SortOrder),
    SelectPageSize(usize),
    PrevPage,
    NextPage,
}

impl BrowseAction {
    /// Parse a command of the form `prev`, `next`, `q=<text>`,
    /// `category=<name>`, `sort=<order>` or `size=<n>`.
    pub fn parse(spec: &str) -> Result<Self> {
        let (name, value) = match spec.split_once('=') {
            Some((n, v)) => (n.trim(), Some(v)),
            None => (spec.trim(), None),
        };
        Ok(match (name, value) {
            ("prev", None) => BrowseAction::PrevPage,
            ("next", None) => BrowseAction::NextPage,
            ("q", Some(v)) => BrowseAction::Search(v.to_string()),
            ("category", Some(v)) => BrowseAction::SelectCategory(v.to_string()),
            ("sort", Some(v)) => match SortOrder::parse(v) {
                Some(order) => BrowseAction::SelectSort(order),
                None => bail!(
                    "unknown sort order '{}'. Use newest, oldest, title-asc, or title-desc.",
                    v
                ),
            },
            ("size", Some(v)) => BrowseAction::SelectPageSize(parse_page_size(v)),
            _ => bail!(
                "invalid action '{}'. Use prev, next, q=<text>, category=<name>, sort=<order>, or size=<n>.",
                spec
            ),
        })
    }
}

/// Apply one action. Control changes reset to page 1; only prev/next move
/// the page without resetting it.
pub fn apply(state: &mut BrowseState, action: BrowseAction) {
    match action {
        BrowseAction::Search(query) => {
            state.query = query.trim().to_string();
            state.page = 1;
        }
        BrowseAction::SelectCategory(category) => {
            let category = category.trim().to_lowercase();
            state.category = if category.is_empty() {
                ALL_CATEGORIES.to_string()
            } else {
                category
            };
            state.page = 1;
        }
        BrowseAction::SelectSort(order) => {
            state.sort = order;
            state.page = 1;
        }
        BrowseAction::SelectPageSize(size) => {
            state.page_size = if PAGE_SIZES.contains(&size) {
                size
            } else {
                DEFAULT_PAGE_SIZE
            };
            state.page = 1;
        }
        BrowseAction::PrevPage => {
            if state.page > 1 {
                state.page -= 1;
            }
        }
        // Past-the-end pages are clamped by the next render.
        BrowseAction::NextPage => state.page = state.page.saturating_add(1),
    }
}

pub fn category_matches(card: &CardView, category: &str) -> bool {
    if category == ALL_CATEGORIES {
        return true;
    }
    card.categories
        .to_lowercase()
        .split('|')
        .map(str::trim)
        .any(|c| !c.is_empty() && c == category)
}

pub fn query_matches(card: &CardView, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    contains_all(&card.searchable.to_lowercase(), &tokenize_query(query))
}

/// Milliseconds since the epoch; unparseable or missing dates are 0.
fn published_millis(card: &CardView) -> i64 {
    parse_published(&card.published)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn compare_cards(a: &CardView, b: &CardView, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Newest => published_millis(b).cmp(&published_millis(a)),
        SortOrder::Oldest => published_millis(a).cmp(&published_millis(b)),
        SortOrder::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortOrder::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
    }
}

/// Everything a view needs after one render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFrame {
    /// Keys of all cards in their new container order: filtered-out cards
    /// first (original order), then every survivor in sorted order.
    pub order: Vec<String>,
    /// Keys of the cards shown on the current page, in display order.
    pub visible: Vec<String>,
    /// Survivor count before pagination.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub status: String,
    pub page_label: String,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    /// Non-default state as a URL query string, without leading `?`.
    pub query_string: String,
}

impl RenderFrame {
    pub fn is_visible(&self, key: &str) -> bool {
        self.visible.iter().any(|k| k == key)
    }
}

/// Filter, sort, and paginate `cards` under `state`.
///
/// Clamps `state.page` to the last page when a filter shrinks the result
/// set, and resets an unsupported page size to the default.
pub fn render(cards: &[CardView], state: &mut BrowseState) -> RenderFrame {
    if !PAGE_SIZES.contains(&state.page_size) {
        state.page_size = DEFAULT_PAGE_SIZE;
    }

    let mut survivors: Vec<(usize, &CardView)> = cards
        .iter()
        .enumerate()
        .filter(|(_, card)| {
            category_matches(card, &state.category) && query_matches(card, &state.query)
        })
        .collect();
    survivors.sort_by(|(_, a), (_, b)| compare_cards(a, b, state.sort));

    let total = survivors.len();
    let total_pages = total.div_ceil(state.page_size).max(1);
    state.page = state.page.clamp(1, total_pages);

    let start = (state.page - 1) * state.page_size;
    let visible: Vec<String> = survivors
        .iter()
        .skip(start)
        .take(state.page_size)
        .map(|(_, card)| card.key.clone())
        .collect();

    let mut is_survivor = vec![false; cards.len()];
    for (idx, _) in &survivors {
        is_survivor[*idx] = true;
    }
    let order: Vec<String> = cards
        .iter()
        .enumerate()
        .filter(|(idx, _)| !is_survivor[*idx])
        .map(|(_, card)| card.key.clone())
        .chain(survivors.iter().map(|(_, card)| card.key.clone()))
        .collect();

    RenderFrame {
        order,
        visible,
        total,
        page: state.page,
        total_pages,
        status: format!(
            "{} {} found",
            total,
            if total == 1 { "report" } else { "reports" }
        ),
        page_label: format!("Page {} of {}", state.page, total_pages),
        prev_disabled: state.page <= 1,
        next_disabled: state.page >= total_pages,
        query_string: state.to_query_string(),
    }
}

/// A widget instance: the card set, its category facet, and the current
/// state.
pub struct CatalogBrowser {
    cards: Vec<CardView>,
    categories: Vec<CategoryOption>,
    state: BrowseState,
}

impl CatalogBrowser {
    /// Load cards, derive the category facet, and read state from the URL
    /// query string. A category with no matching option falls back to
    /// `all`.
    pub fn new<S: CardSource + ?Sized>(source: &S, query_string: &str) -> Self {
        let cards = source.list_cards();
        let categories = collect_categories(&cards);
        let mut state = BrowseState::from_query_string(query_string);
        if !is_known_category(&categories, &state.category) {
            state.category = ALL_CATEGORIES.to_string();
        }
        Self {
            cards,
            categories,
            state,
        }
    }

    pub fn cards(&self) -> &[CardView] {
        &self.cards
    }

    pub fn categories(&self) -> &[CategoryOption] {
        &self.categories
    }

    pub fn state(&self) -> &BrowseState {
        &self.state
    }

    pub fn render(&mut self) -> RenderFrame {
        render(&self.cards, &mut self.state)
    }

    /// Apply `action` fully, then render once.
    pub fn dispatch(&mut self, action: BrowseAction) -> RenderFrame {
        let action = match action {
            BrowseAction::SelectCategory(c)
                if !is_known_category(&self.categories, &c.trim().to_lowercase()) =>
            {
                BrowseAction::SelectCategory(ALL_CATEGORIES.to_string())
            }
            other => other,
        };
        apply(&mut self.state, action);
        self.render()
    }
}

fn is_known_category(options: &[CategoryOption], category: &str) -> bool {
    category == ALL_CATEGORIES || options.iter().any(|o| o.value == category)
}
