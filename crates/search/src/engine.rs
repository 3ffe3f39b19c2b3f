//! Search engine capability.
//!
//! The gateway talks to the search engine only through [`SearchEngineClient`].
//! The Elasticsearch implementation lives in
//! [`backends::elasticsearch`](crate::backends); tests use scripted fakes.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::types::{AggregationBucket, Document, IndexExpression};

/// A search request ready for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    /// Indices to search.
    pub index: IndexExpression,
    /// Request body in the engine's query DSL.
    pub body: Value,
    /// When set, the engine opens a paging handle kept alive this long.
    pub keep_alive: Option<Duration>,
}

impl EngineRequest {
    /// Creates a request without a paging handle.
    pub fn new(index: IndexExpression, body: Value) -> Self {
        Self {
            index,
            body,
            keep_alive: None,
        }
    }

    /// Asks the engine to open a paging handle.
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }
}

/// One page as returned by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnginePage {
    /// Hit sources, in engine order.
    pub hits: Vec<Document>,
    /// Total matching documents.
    pub total: u64,
    /// Paging handle to continue from, if one was requested.
    pub paging_handle: Option<String>,
    /// Aggregation buckets, if requested.
    pub aggregations: Option<Vec<AggregationBucket>>,
}

/// Operations the gateway needs from a search engine.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Returns a short name for logs.
    fn engine_name(&self) -> &'static str;

    /// Runs a search. Opens a paging handle when `request.keep_alive` is set.
    async fn search_first_page(&self, request: &EngineRequest) -> EngineResult<EnginePage>;

    /// Fetches the next page of an open paging handle and extends its lifetime.
    async fn continue_paging(&self, handle: &str, keep_alive: Duration)
    -> EngineResult<EnginePage>;

    /// Returns `true` if `alias` exists.
    async fn alias_exists(&self, alias: &str) -> EngineResult<bool>;

    /// Points `alias` at `concrete_index`. Returns whether the engine acknowledged.
    async fn create_alias(&self, concrete_index: &str, alias: &str) -> EngineResult<bool>;

    /// Returns every alias name known to the engine.
    async fn get_all_aliases(&self) -> EngineResult<HashSet<String>>;

    /// Returns the concrete index currently behind `index`, following an alias.
    ///
    /// A name that is not an alias resolves to itself. `Ok(None)` means the
    /// engine can tell nothing by that name exists; the alias is then skipped.
    async fn resolve_concrete_index(&self, index: &str) -> EngineResult<Option<String>>;
}

/// Runs an engine call, failing with [`EngineError::Timeout`] once `timeout` elapses.
///
/// The engine is never retried here; retrying is the caller's decision.
pub async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = EngineResult<T>>,
) -> EngineResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
