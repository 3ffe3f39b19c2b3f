//! Partition-scoped view over a string cache.

use std::sync::Arc;

use super::KeyValueCache;
use crate::error::CacheResult;
use crate::tenant::PartitionId;

/// Prefixes every key with `"{partition}-"`.
///
/// Alias entries for the same kind in different partitions must never
/// collide, even when one shared cache backs every partition.
#[derive(Clone)]
pub struct PartitionScopedCache {
    inner: Arc<dyn KeyValueCache<String, String>>,
}

impl PartitionScopedCache {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn KeyValueCache<String, String>>) -> Self {
        Self { inner }
    }

    /// Returns the backing-cache key for `key` in `partition`.
    pub fn scoped_key(partition: &PartitionId, key: &str) -> String {
        format!("{}-{}", partition.as_str(), key)
    }

    /// Stores `value` under `key` in `partition`.
    pub async fn put(&self, partition: &PartitionId, key: &str, value: String) -> CacheResult<()> {
        self.inner.put(Self::scoped_key(partition, key), value).await
    }

    /// Reads `key` in `partition`.
    pub async fn get(&self, partition: &PartitionId, key: &str) -> CacheResult<Option<String>> {
        self.inner.get(&Self::scoped_key(partition, key)).await
    }

    /// Removes `key` in `partition`.
    pub async fn delete(&self, partition: &PartitionId, key: &str) -> CacheResult<()> {
        self.inner.delete(&Self::scoped_key(partition, key)).await
    }

    /// Removes every entry of the backing cache, all partitions included.
    pub async fn clear_all(&self) -> CacheResult<()> {
        self.inner.clear_all().await
    }
}
