//! Cursor tokens and the cursor store.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::cache::KeyValueCache;
use crate::error::CacheResult;
use crate::types::{CursorEntry, CursorToken};

/// Derives the caller-facing token for a paging handle.
///
/// The token is `SHA-256(handle ":" generation)` in uppercase hex. Mixing in
/// the generation keeps tokens unique along a stream even when the engine
/// hands back the same handle on every page.
///
/// ```
/// use kindgate_search::pager::mint_token;
///
/// let first = mint_token("scroll-1", 0);
/// assert_eq!(first.as_str().len(), 64);
/// assert_ne!(first, mint_token("scroll-1", 1));
/// assert_eq!(first, mint_token("scroll-1", 0));
/// ```
pub fn mint_token(handle: &str, generation: u64) -> CursorToken {
    let mut hasher = Sha256::new();
    hasher.update(handle.as_bytes());
    hasher.update(b":");
    hasher.update(generation.to_string().as_bytes());
    CursorToken::from_digest(&hasher.finalize())
}

/// Typed access to the cursor cache.
#[derive(Clone)]
pub struct CursorStore {
    cache: Arc<dyn KeyValueCache<String, CursorEntry>>,
}

impl CursorStore {
    /// Wraps a cursor cache.
    pub fn new(cache: Arc<dyn KeyValueCache<String, CursorEntry>>) -> Self {
        Self { cache }
    }

    /// Mints a token for `entry` and stores the entry under it.
    pub async fn mint(&self, entry: CursorEntry) -> CacheResult<CursorToken> {
        let token = mint_token(&entry.handle, entry.generation);
        self.cache.put(token.as_str().to_string(), entry).await?;
        Ok(token)
    }

    /// Looks up the entry for `token`.
    pub async fn lookup(&self, token: &CursorToken) -> CacheResult<Option<CursorEntry>> {
        self.cache.get(&token.as_str().to_string()).await
    }

    /// Forgets `token`.
    pub async fn forget(&self, token: &CursorToken) -> CacheResult<()> {
        self.cache.delete(&token.as_str().to_string()).await
    }
}
