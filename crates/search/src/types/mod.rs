//! Core types shared by the resolver, the pager, and the engine seam.
//!
//! - [`Kind`], [`KindPattern`], [`IndexExpression`] - What to search
//! - [`QuerySpec`], [`SortSpec`], [`QueryLimits`] - How to search
//! - [`PageResult`], [`CursorToken`], [`CursorEntry`] - What comes back
//!
//! # Examples
//!
//! ```
//! use kindgate_search::types::{KindPattern, QueryLimits, QuerySpec, SortOrder, SortSpec};
//!
//! let spec = QuerySpec::new(KindPattern::parse("tenant1:wks:wellbore:1.0.0").unwrap())
//!     .with_query("data.WellName:\"A-1\"")
//!     .with_sort(SortSpec::single("data.WellName", SortOrder::Asc))
//!     .with_limit(50);
//!
//! assert_eq!(spec.validate(&QueryLimits::default()).unwrap(), 50);
//! ```

mod kind;
mod page;
mod query;

pub use kind::{EXCLUDE_SYSTEM_INDICES, IndexExpression, Kind, KindPattern, WILDCARD};
pub use page::{AggregationBucket, CursorEntry, CursorToken, Document, PageResult};
pub use query::{QueryLimits, QuerySpec, SortOrder, SortSpec, SpatialFilter};
