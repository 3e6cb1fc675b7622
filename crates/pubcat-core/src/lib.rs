//! # pubcat core
//!
//! Shared, WASM-safe logic for pubcat: the bibliographic record model,
//! markup stripping, the search index build, query scoring, the catalog
//! browse widget, and citation formatting.
//!
//! This crate contains no tokio, filesystem, or network dependencies. The
//! native CLI (the `pubcat` crate) supplies I/O and delegates every
//! algorithmic decision to the functions here.

pub mod browse;
pub mod citation;
pub mod index;
pub mod linked_data;
pub mod models;
pub mod search;
pub mod text;
