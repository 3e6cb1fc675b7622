//! `pubcat browse`: the catalog widget driven from the command line.
//!
//! Cards are built from the records file the same way the catalog page
//! renders them (Zenodo reports only, in file order). The initial state comes
//! from `--state` (a URL query string) and each `--then` applies one user
//! action before the final render:
//!
//! ```bash
//! pubcat browse --state "category=policy&sort=oldest" --then next --then "q=digital"
//! ```

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use pubcat_core::browse::{BrowseAction, CardView, CatalogBrowser, CategoryOption, RenderFrame, ALL_CATEGORIES};
use pubcat_core::models::{CanonicalRecord, DEFAULT_RECORD_TYPE};

use crate::config::Config;
use crate::index_cmd::read_records;

pub const DEFAULT_CATALOG_PATH: &str = "/reports/";

/// Cards for the catalog page: Zenodo reports, in record order.
pub fn catalog_cards(records: &[CanonicalRecord]) -> Vec<CardView> {
    records
        .iter()
        .filter(|r| r.kind == "zenodo" && r.record_type == DEFAULT_RECORD_TYPE)
        .map(CardView::from_record)
        .collect()
}

#[derive(Debug, Serialize)]
struct BrowseReport<'a> {
    url: String,
    categories: &'a [CategoryOption],
    frame: &'a RenderFrame,
    cards: Vec<&'a CardView>,
}

/// Build a browser over `cards`, apply `actions` in order, return the final
/// frame.
pub fn drive(
    cards: Vec<CardView>,
    query_string: &str,
    actions: &[BrowseAction],
) -> (CatalogBrowser, RenderFrame) {
    let mut browser = CatalogBrowser::new(&cards, query_string);
    let mut frame = browser.render();
    for action in actions {
        debug!(?action, "applying browse action");
        frame = browser.dispatch(action.clone());
    }
    (browser, frame)
}

/// Run `pubcat browse`.
pub fn run_browse(
    config: &Config,
    state: Option<&str>,
    then: &[String],
    path: Option<&str>,
    json: bool,
) -> Result<()> {
    let actions = then
        .iter()
        .map(|spec| BrowseAction::parse(spec))
        .collect::<Result<Vec<_>>>()?;

    let records = read_records(&config.paths.records)?;
    let (browser, frame) = drive(catalog_cards(&records), state.unwrap_or(""), &actions);

    let pathname = path.unwrap_or(DEFAULT_CATALOG_PATH);
    let url = browser.state().url(pathname);
    let visible: Vec<&CardView> = frame
        .visible
        .iter()
        .filter_map(|key| browser.cards().iter().find(|c| &c.key == key))
        .collect();

    if json {
        let report = BrowseReport {
            url,
            categories: browser.categories(),
            frame: &frame,
            cards: visible,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let selected = &browser.state().category;
    let mut facets = vec![if selected == ALL_CATEGORIES {
        "[All categories]".to_string()
    } else {
        "All categories".to_string()
    }];
    for option in browser.categories() {
        if &option.value == selected {
            facets.push(format!("[{}]", option.label()));
        } else {
            facets.push(option.label());
        }
    }
    println!("Categories: {}", facets.join(" | "));
    println!("{}  ·  {}", frame.status, frame.page_label);
    println!();

    let offset = (frame.page - 1) * browser.state().page_size;
    for (i, card) in visible.iter().enumerate() {
        let date = if card.published.is_empty() {
            "undated"
        } else {
            card.published.as_str()
        };
        println!("{:>4}. {} ({})", offset + i + 1, card.title, date);
        let categories = card.category_list();
        if !categories.is_empty() {
            println!("      {}", categories.join(", "));
        }
    }

    println!();
    println!(
        "{}  {}",
        if frame.prev_disabled { "(prev)" } else { "<prev" },
        if frame.next_disabled { "(next)" } else { "next>" }
    );
    println!("URL: {}", url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, title: &str, published: &str, kind: &str, record_type: &str) -> CanonicalRecord {
        let mut r = CanonicalRecord::new(id, title);
        r.published = published.to_string();
        r.kind = kind.to_string();
        r.record_type = record_type.to_string();
        r.keywords = vec!["topic:Policy".to_string()];
        r
    }

    #[test]
    fn test_catalog_cards_keeps_reports_only() {
        let records = vec![
            record(1, "A", "2020-01-01", "zenodo", "report"),
            record(2, "B", "2021-01-01", "zenodo", "video"),
            record(3, "C", "2022-01-01", "youtube", "report"),
        ];
        let cards = catalog_cards(&records);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].key, "zenodo-1");
    }

    #[test]
    fn test_drive_applies_actions_in_order() {
        let records: Vec<CanonicalRecord> = (1..=30)
            .map(|i| record(i, &format!("Report {}", i), &format!("2000-01-{:02}", i), "zenodo", "report"))
            .collect();
        let actions = vec![
            BrowseAction::NextPage,
            BrowseAction::NextPage,
            BrowseAction::SelectCategory("policy".to_string()),
            BrowseAction::NextPage,
        ];
        let (browser, frame) = drive(catalog_cards(&records), "sort=oldest", &actions);
        assert_eq!(frame.page, 2);
        assert_eq!(frame.visible.first().map(String::as_str), Some("zenodo-13"));
        assert_eq!(browser.state().url("/reports/"), "/reports/?category=policy&sort=oldest&page=2");
    }
}
