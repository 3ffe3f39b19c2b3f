//! Kindgate Search
//!
//! Multi-tenant search gateway core for Elasticsearch-compatible engines.
//! Callers describe what to search as one or more *kinds*
//! (`partition:source:type:version`); this crate turns those into index
//! expressions the engine accepts, enforces partition isolation, and pages
//! through large result sets with opaque, single-owner cursors.
//!
//! # Features
//!
//! - **Index resolution**: kinds become index names; very long expressions are
//!   shortened through deterministic, lazily created aliases
//! - **Partition isolation**: a request may only reach the partitions its
//!   identity carries; wildcard partitions are pinned to the caller's partition
//! - **Cursor paging**: engine paging handles are hidden behind hashed tokens
//!   bound to the requesting user, re-minted on every page
//! - **Federation**: multi-partition searches fan out concurrently and merge
//!
//! # Architecture
//!
//! - [`tenant`] - Identity and partition types
//! - [`types`] - Kinds, index expressions, query specs, and page results
//! - [`error`] - Error types and their HTTP mapping
//! - [`cache`] - Key-value cache seam and the in-process implementation
//! - [`engine`] - The search engine client seam
//! - [`query`] - Engine request body construction
//! - [`resolver`] - Kind authorization and index expression resolution
//! - [`pager`] - Cursor-based paging
//! - [`service`] - The offset/cursor search façade
//! - [`federation`] - Cross-partition fan-out
//! - [`backends`] - Engine implementations (Elasticsearch)
//!
//! # Kinds and index names
//!
//! ```
//! use kindgate_search::types::{IndexExpression, Kind};
//!
//! let kind = Kind::parse("tenant1:welldb-v2:wellbore:2.0.0").unwrap();
//! assert_eq!(kind.index_name(), "tenant1-welldb-v2-wellbore-2.0.0");
//! assert_eq!(kind.alias_name(), "a-83835110");
//!
//! let expression = IndexExpression::from_targets([kind.index_name()]);
//! assert_eq!(expression.as_str(), "tenant1-welldb-v2-wellbore-2.0.0,-.*");
//! ```
//!
//! # Identity
//!
//! Every search runs on behalf of an [`IdentityContext`]:
//!
//! ```
//! use kindgate_search::tenant::IdentityContext;
//!
//! let identity = IdentityContext::builder()
//!     .user_id("alice@example.com")
//!     .partition_header("tenant1")
//!     .data_group("data.default.viewers@tenant1.example.com")
//!     .build()
//!     .unwrap();
//!
//! assert!(identity.owns_partition("TENANT1"));
//! assert!(identity.check_partition("tenant2:wks:wellbore:1.0.0").is_err());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod federation;
pub mod pager;
pub mod query;
pub mod resolver;
pub mod service;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use config::GatewayConfig;
pub use engine::{EnginePage, EngineRequest, SearchEngineClient};
pub use error::{ErrorKind, ErrorResponse, GatewayError, GatewayResult};
pub use federation::FederatedSearch;
pub use pager::CursorPager;
pub use resolver::IndexResolver;
pub use service::SearchService;
pub use tenant::{IdentityContext, PartitionId};
pub use types::{CursorToken, Kind, KindPattern, PageResult, QuerySpec};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
