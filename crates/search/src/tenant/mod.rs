//! Partitions and requester identity.
//!
//! Every gateway operation takes an [`IdentityContext`]. The cross-tenant guard
//! in the index resolver and the cursor owner check both read from it; there is
//! no way to run a query without one.
//!
//! # Core Types
//!
//! - [`PartitionId`] - Opaque, case-insensitively compared partition identifier
//! - [`IdentityContext`] - Authenticated user, partitions, and data groups
//! - [`IdentityContextBuilder`] - Validated construction from request headers
//!
//! # Examples
//!
//! ```
//! use kindgate_search::tenant::IdentityContext;
//!
//! let identity = IdentityContext::builder()
//!     .user_id("user@example.com")
//!     .partition_header("tenant1")
//!     .data_group("data.default.viewers@tenant1.example.com")
//!     .build()
//!     .unwrap();
//!
//! assert!(identity.owns_partition("tenant1"));
//! ```

mod context;
mod id;

pub use context::{IdentityContext, IdentityContextBuilder};
pub use id::{COMMON_PARTITION, PartitionId};
