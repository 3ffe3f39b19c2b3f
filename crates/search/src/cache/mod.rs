//! Key-value cache capability.
//!
//! The resolver and the pager keep their state (aliases, cursor entries) in a
//! [`KeyValueCache`] injected at construction time. Every operation touches a
//! single key, so backends only need per-key atomicity.
//!
//! - [`InMemoryCache`] - In-process bounded TTL cache for local and test use
//! - [`PartitionScopedCache`] - Prefixes keys with the partition id
//!
//! Shared caches (Redis and the like) are provided by deployments that
//! implement [`KeyValueCache`] themselves.

mod memory;
mod scoped;

use async_trait::async_trait;

use crate::error::CacheResult;

pub use memory::InMemoryCache;
pub use scoped::PartitionScopedCache;

/// A single-key get/put/delete store.
///
/// Implementations must be safe to share across tasks. Failures are
/// reported as [`CacheError`](crate::error::CacheError); callers decide
/// whether a failure is fatal.
#[async_trait]
pub trait KeyValueCache<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Stores `value` under `key`, replacing any previous value.
    async fn put(&self, key: K, value: V) -> CacheResult<()>;

    /// Returns the value stored under `key`, if present and not expired.
    async fn get(&self, key: &K) -> CacheResult<Option<V>>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &K) -> CacheResult<()>;

    /// Removes every entry.
    async fn clear_all(&self) -> CacheResult<()>;
}
