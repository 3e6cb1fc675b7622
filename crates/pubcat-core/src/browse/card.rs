//! Catalog cards and the adapter the widget reads them through.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::index::build_document;
use crate::models::CanonicalRecord;

/// Keyword namespace whose values become card categories.
pub const TOPIC_PREFIX: &str = "topic:";

/// Scalar attributes of one rendered catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardView {
    /// Stable card identity (`zenodo-<id>` for record-backed cards).
    pub key: String,
    pub title: String,
    pub published: String,
    /// Pipe-delimited category names.
    pub categories: String,
    /// Precomputed lowercase match blob.
    pub searchable: String,
}

impl CardView {
    /// Category names, trimmed, empties dropped.
    pub fn category_list(&self) -> Vec<&str> {
        self.categories
            .split('|')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Build the card a page renderer would emit for `record`.
    pub fn from_record(record: &CanonicalRecord) -> Self {
        Self {
            key: record.document_id(),
            title: record.title.clone(),
            published: record.published.clone(),
            categories: record_categories(record).join("|"),
            searchable: build_document(record).searchable,
        }
    }
}

/// Categories derived from a record's keywords.
///
/// `topic:<name>` contributes `<name>`, un-namespaced keywords contribute
/// themselves, other namespaces (`type:`, `series:`) are skipped. Duplicates
/// keep their first position.
pub fn record_categories(record: &CanonicalRecord) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in &record.keywords {
        let keyword = keyword.trim();
        let name = match keyword.get(..TOPIC_PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(TOPIC_PREFIX) => {
                keyword[TOPIC_PREFIX.len()..].trim()
            }
            _ if keyword.contains(':') => continue,
            _ => keyword,
        };
        if !name.is_empty() && !out.iter().any(|c| c == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Source of the cards a widget operates on.
pub trait CardSource {
    fn list_cards(&self) -> Vec<CardView>;
}

impl CardSource for [CardView] {
    fn list_cards(&self) -> Vec<CardView> {
        self.to_vec()
    }
}

impl CardSource for Vec<CardView> {
    fn list_cards(&self) -> Vec<CardView> {
        self.clone()
    }
}

/// Cards rendered from canonical records, in record order.
pub struct RecordCards<'a>(pub &'a [CanonicalRecord]);

impl CardSource for RecordCards<'_> {
    fn list_cards(&self) -> Vec<CardView> {
        self.0.iter().map(CardView::from_record).collect()
    }
}

/// One entry of the category facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    /// Display name as it appears on cards.
    pub name: String,
    /// Lowercase value used in state and URLs.
    pub value: String,
    /// Number of cards listing this category.
    pub count: usize,
}

impl CategoryOption {
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.count)
    }
}

/// Distinct categories across `cards` with occurrence counts, ordered
/// alphabetically (case-insensitive).
pub fn collect_categories(cards: &[CardView]) -> Vec<CategoryOption> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for card in cards {
        for category in card.category_list() {
            *counts.entry(category.to_string()).or_insert(0) += 1;
        }
    }
    let mut options: Vec<CategoryOption> = counts
        .into_iter()
        .map(|(name, count)| CategoryOption {
            value: name.to_lowercase(),
            name,
            count,
        })
        .collect();
    options.sort_by(|a, b| a.value.cmp(&b.value).then(a.name.cmp(&b.name)));
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(key: &str, categories: &str) -> CardView {
        CardView {
            key: key.to_string(),
            categories: categories.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_category_list_trims() {
        let c = card("a", " Policy | |Data|");
        assert_eq!(c.category_list(), vec!["Policy", "Data"]);
    }

    #[test]
    fn test_collect_categories_counts_and_orders() {
        let cards = vec![
            card("a", "Policy|data"),
            card("b", "Policy"),
            card("c", "archives"),
        ];
        let options = collect_categories(&cards);
        let labels: Vec<String> = options.iter().map(|o| o.label()).collect();
        assert_eq!(labels, vec!["archives (1)", "data (1)", "Policy (2)"]);
        assert_eq!(options[2].value, "policy");
    }

    #[test]
    fn test_record_categories() {
        let mut record = CanonicalRecord::new(1, "T");
        record.keywords = vec![
            "type:report".to_string(),
            "Topic:Preservation".to_string(),
            "series:annual-report".to_string(),
            "Libraries".to_string(),
            "topic:Preservation".to_string(),
        ];
        assert_eq!(record_categories(&record), vec!["Preservation", "Libraries"]);
    }

    #[test]
    fn test_card_from_record() {
        let mut record = CanonicalRecord::new(42, "Digital Futures");
        record.published = "2023-05-01".to_string();
        record.keywords = vec!["topic:policy".to_string()];
        let c = CardView::from_record(&record);
        assert_eq!(c.key, "zenodo-42");
        assert_eq!(c.categories, "policy");
        assert!(c.searchable.starts_with("digital futures"));
    }

    #[test]
    fn test_record_cards_source() {
        let records = vec![CanonicalRecord::new(1, "A"), CanonicalRecord::new(2, "B")];
        let cards = RecordCards(&records).list_cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].key, "zenodo-2");
    }
}
