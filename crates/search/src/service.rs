//! The search façade called by the API layer.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::cache::{InMemoryCache, KeyValueCache, PartitionScopedCache};
use crate::config::GatewayConfig;
use crate::engine::{EngineRequest, SearchEngineClient, with_timeout};
use crate::error::GatewayResult;
use crate::pager::{CursorPager, CursorStore, split_handle};
use crate::query::{PageMode, QueryBuilder};
use crate::resolver::{AliasService, IndexResolver};
use crate::tenant::IdentityContext;
use crate::types::{CursorEntry, PageResult, QuerySpec};

/// Runs offset and cursor queries against one engine.
///
/// Cheap to clone; clones share the engine and both caches.
#[derive(Clone)]
pub struct SearchService {
    engine: Arc<dyn SearchEngineClient>,
    resolver: IndexResolver,
    pager: CursorPager,
    config: Arc<GatewayConfig>,
}

impl SearchService {
    /// Wires a service from an engine, an alias cache, and a cursor cache.
    pub fn new(
        engine: Arc<dyn SearchEngineClient>,
        alias_cache: Arc<dyn KeyValueCache<String, String>>,
        cursor_cache: Arc<dyn KeyValueCache<String, CursorEntry>>,
        config: GatewayConfig,
    ) -> Self {
        let config = Arc::new(config);
        let aliases = AliasService::new(
            engine.clone(),
            PartitionScopedCache::new(alias_cache),
            config.request_timeout(),
        );
        let resolver = IndexResolver::new(aliases, config.alias_threshold);
        let pager = CursorPager::new(
            engine.clone(),
            resolver.clone(),
            CursorStore::new(cursor_cache),
            config.clone(),
        );

        Self {
            engine,
            resolver,
            pager,
            config,
        }
    }

    /// Wires a service with in-process caches sized from `config`.
    ///
    /// Aliases never expire; cursor entries live `cursor_ttl_secs`.
    pub fn with_in_memory_caches(
        engine: Arc<dyn SearchEngineClient>,
        config: GatewayConfig,
    ) -> Self {
        let alias_cache: Arc<InMemoryCache<String, String>> =
            Arc::new(InMemoryCache::unbounded_ttl(config.cache_capacity));
        let cursor_cache: Arc<InMemoryCache<String, CursorEntry>> =
            Arc::new(InMemoryCache::new(config.cache_capacity, config.cursor_ttl()));
        Self::new(engine, alias_cache, cursor_cache, config)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the index resolver.
    pub fn resolver(&self) -> &IndexResolver {
        &self.resolver
    }

    /// Returns the cursor pager.
    pub fn pager(&self) -> &CursorPager {
        &self.pager
    }

    /// Runs an offset query and returns one page without a cursor.
    pub async fn query(
        &self,
        spec: &QuerySpec,
        identity: &IdentityContext,
    ) -> GatewayResult<PageResult> {
        let started = Instant::now();
        let limit = spec.validate(&self.config.limits())?;
        let index = self.resolver.resolve(&spec.kind, identity).await?;
        let body =
            QueryBuilder::new(identity, &self.config).build(spec, limit, PageMode::Offset)?;

        let request = EngineRequest::new(index, body);
        let page = with_timeout(
            self.config.request_timeout(),
            self.engine.search_first_page(&request),
        )
        .await
        .inspect_err(|e| {
            warn!(
                engine = self.engine.engine_name(),
                kinds = spec.kind.len(),
                error = %e,
                correlation_id = identity.correlation_id().unwrap_or_default(),
                "Query failed"
            );
        })?;

        let (page, _) = split_handle(page);
        info!(
            kinds = spec.kind.len(),
            offset = spec.effective_offset(),
            hits = page.results.len(),
            total = page.total_count,
            latency_ms = started.elapsed().as_millis() as u64,
            correlation_id = identity.correlation_id().unwrap_or_default(),
            "Served query page"
        );

        Ok(page)
    }

    /// Runs a cursor query: opens a stream without `spec.cursor`, continues
    /// it with one.
    pub async fn query_with_cursor(
        &self,
        spec: &QuerySpec,
        identity: &IdentityContext,
    ) -> GatewayResult<PageResult> {
        self.pager.query(spec, identity).await
    }
}
