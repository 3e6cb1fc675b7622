//! # pubcat
//!
//! Publication catalog tooling for a static report site.
//!
//! pubcat fetches a Zenodo community's records, builds a static search
//! artifact the site ships alongside its pages, answers queries against that
//! artifact, and drives the catalog's filter/sort/paginate widget. The pure
//! logic lives in [`pubcat_core`]; this crate adds configuration, I/O and
//! the `pubcat` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Zenodo  │──▶│ fetch        │──▶│ build-index  │──▶│ search-index │
//! │   API    │   │ (normalize)  │   │ (docs+index) │   │    .json     │
//! └──────────┘   └──────┬───────┘   └──────────────┘   └──────┬───────┘
//!                       │ zenodo.json                         │ file / HTTP
//!                       ▼                                     ▼
//!               ┌──────────────┐                      ┌──────────────┐
//!               │ browse, get, │                      │ QueryEngine  │
//!               │ cite         │                      │ (search)     │
//!               └──────────────┘                      └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pubcat fetch                          # Zenodo → src/_data/zenodo.json
//! pubcat build-index                    # → dist/assets/search-index.json
//! pubcat search "digital preservation"
//! pubcat browse --state "category=policy&sort=oldest"
//! pubcat cite zenodo-987 --style mla
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`connector_zenodo`] | Zenodo paging and record normalization |
//! | [`index_cmd`] | Search artifact build |
//! | [`query`] | Lazily loading query engine |
//! | [`browse_cmd`] | Catalog widget over the records file |
//! | [`get`] | Record lookup, summary and JSON-LD |
//! | [`cite`] | Offline citations |
//! | [`stats`] | Artifact statistics |

pub mod browse_cmd;
pub mod cite;
pub mod config;
pub mod connector_zenodo;
pub mod fsutil;
pub mod get;
pub mod index_cmd;
pub mod query;
pub mod stats;

pub use pubcat_core;
