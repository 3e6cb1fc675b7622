//! Catalog browse widget: free-text filtering, category facets, sorting, and
//! pagination over a fixed set of pre-rendered catalog cards.
//!
//! The widget never adds, removes, or edits cards. It decides which cards
//! are visible and in what order, and mirrors its [`BrowseState`] into a
//! URL query string so views are shareable.
//!
//! ```text
//! URL query ──▶ BrowseState ──▶ render(cards, state) ──▶ RenderFrame
//!                  ▲                                        │
//!                  └──── apply(action) ◀── user input ◀─────┘
//! ```
//!
//! Cards reach the widget through the [`CardSource`] adapter, so the logic
//! runs the same over rendered markup or an in-memory fixture.

pub mod card;
pub mod state;
pub mod widget;

pub use card::{collect_categories, CardSource, CardView, CategoryOption, RecordCards};
pub use state::{BrowseState, SortOrder, ALL_CATEGORIES, DEFAULT_PAGE_SIZE, PAGE_SIZES};
pub use widget::{apply, render, BrowseAction, CatalogBrowser, RenderFrame};
