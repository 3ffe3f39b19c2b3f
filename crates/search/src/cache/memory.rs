//! In-process cache with TTL and bounded size, backed by moka.

use std::hash::Hash;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use super::KeyValueCache;
use crate::error::CacheResult;

/// An in-process [`KeyValueCache`].
///
/// Entries expire `ttl` after insertion. Once `capacity` is reached, moka's
/// admission policy decides which entries to evict. Eviction runs in the
/// background, so [`entry_count`](Self::entry_count) may briefly exceed
/// `capacity`.
pub struct InMemoryCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> InMemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache holding at most `capacity` entries, each living `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity.max(1) as u64)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Creates a cache whose entries never expire.
    pub fn unbounded_ttl(capacity: usize) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity.max(1) as u64)
            .build();
        Self { inner }
    }

    /// Returns the approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Applies pending evictions and expirations.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

#[async_trait]
impl<K, V> KeyValueCache<K, V> for InMemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn put(&self, key: K, value: V) -> CacheResult<()> {
        self.inner.insert(key, value).await;
        Ok(())
    }

    async fn get(&self, key: &K) -> CacheResult<Option<V>> {
        Ok(self.inner.get(key).await)
    }

    async fn delete(&self, key: &K) -> CacheResult<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    async fn clear_all(&self) -> CacheResult<()> {
        self.inner.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let cache: InMemoryCache<String, String> = InMemoryCache::new(10, Duration::from_secs(60));

        cache.put("k".to_string(), "v".to_string()).await.unwrap();
        assert_eq!(cache.get(&"k".to_string()).await.unwrap(), Some("v".to_string()));

        cache.delete(&"k".to_string()).await.unwrap();
        assert_eq!(cache.get(&"k".to_string()).await.unwrap(), None);

        // Deleting an absent key is fine
        cache.delete(&"k".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_all() {
        let cache: InMemoryCache<u32, u32> = InMemoryCache::unbounded_ttl(10);
        cache.put(1, 1).await.unwrap();
        cache.put(2, 2).await.unwrap();

        cache.clear_all().await.unwrap();

        assert_eq!(cache.get(&1).await.unwrap(), None);
        assert_eq!(cache.get(&2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache: InMemoryCache<u32, u32> = InMemoryCache::new(10, Duration::from_millis(100));
        cache.put(1, 1).await.unwrap();
        assert_eq!(cache.get(&1).await.unwrap(), Some(1));

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(cache.get(&1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unbounded_ttl_keeps_entries() {
        let cache: InMemoryCache<u32, u32> = InMemoryCache::unbounded_ttl(10);
        cache.put(1, 1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.get(&1).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let cache: InMemoryCache<u32, u32> = InMemoryCache::unbounded_ttl(2);
        for i in 0..50 {
            cache.put(i, i).await.unwrap();
        }

        cache.run_pending_tasks().await;

        assert!(cache.entry_count() <= 2, "{}", cache.entry_count());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let cache: InMemoryCache<u32, u32> = InMemoryCache::unbounded_ttl(2);
        cache.put(2, 2).await.unwrap();
        cache.put(2, 20).await.unwrap();

        assert_eq!(cache.get(&2).await.unwrap(), Some(20));
    }
}
