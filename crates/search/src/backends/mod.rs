//! Search engine backends.
//!
//! Enable backends with feature flags in `Cargo.toml`:
//!
//! - `elasticsearch` (default) - Elasticsearch / OpenSearch-compatible clusters

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;
