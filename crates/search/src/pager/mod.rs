//! Cursor-based pagination over engine paging handles.
//!
//! The [`CursorPager`] serves one page of a cursor stream per call. State
//! lives in the cursor cache, not in the pager, so any gateway replica can
//! serve the next page:
//!
//! ```text
//!   Fresh ──(hits + handle)──► Active ──(hits + handle)──► Active ...
//!     │                          │
//!     └──(no hits / no handle)───┴──(no hits / no handle)──► Terminal
//! ```
//!
//! Every page served from `Active` mints a new token and forgets the old
//! one. Two concurrent continuations of the same token are not serialized;
//! the last cache write wins.

mod cursor;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::engine::{EnginePage, EngineRequest, SearchEngineClient, with_timeout};
use crate::error::{CursorError, EngineError, GatewayError, GatewayResult, ValidationError};
use crate::query::{PageMode, QueryBuilder};
use crate::resolver::IndexResolver;
use crate::tenant::IdentityContext;
use crate::types::{CursorEntry, CursorToken, PageResult, QuerySpec};

pub use cursor::{CursorStore, mint_token};

/// Serves pages of cursor streams.
#[derive(Clone)]
pub struct CursorPager {
    engine: Arc<dyn SearchEngineClient>,
    resolver: IndexResolver,
    cursors: CursorStore,
    config: Arc<GatewayConfig>,
}

impl CursorPager {
    /// Creates a new pager.
    pub fn new(
        engine: Arc<dyn SearchEngineClient>,
        resolver: IndexResolver,
        cursors: CursorStore,
        config: Arc<GatewayConfig>,
    ) -> Self {
        Self {
            engine,
            resolver,
            cursors,
            config,
        }
    }

    /// Serves the next page: a fresh stream without a cursor, a continuation
    /// with one.
    pub async fn query(
        &self,
        spec: &QuerySpec,
        identity: &IdentityContext,
    ) -> GatewayResult<PageResult> {
        if spec.cursor.is_some() {
            self.query_next_page(spec, identity).await
        } else {
            self.query_first_page(spec, identity).await
        }
    }

    /// Opens a new stream and returns its first page.
    ///
    /// All validation and tenant checks run before the engine is called.
    pub async fn query_first_page(
        &self,
        spec: &QuerySpec,
        identity: &IdentityContext,
    ) -> GatewayResult<PageResult> {
        let started = Instant::now();
        let limit = spec.validate_for_cursor(&self.config.limits())?;
        let index = self.resolver.resolve(&spec.kind, identity).await?;
        let body =
            QueryBuilder::new(identity, &self.config).build(spec, limit, PageMode::Cursor)?;

        let request =
            EngineRequest::new(index, body).with_keep_alive(self.config.cursor_keep_alive());
        let page = with_timeout(
            self.config.request_timeout(),
            self.engine.search_first_page(&request),
        )
        .await
        .map_err(|e| {
            warn!(
                kinds = spec.kind.len(),
                error = %e,
                correlation_id = identity.correlation_id().unwrap_or_default(),
                "Cursor query failed"
            );
            match e {
                EngineError::TooManyPagingContexts { .. } => {
                    GatewayError::from(CursorError::TooManyOpenCursors)
                }
                other => GatewayError::from(other),
            }
        })?;

        let (page, handle) = split_handle(page);
        let cursor = match handle {
            Some(handle) => Some(
                self.cursors
                    .mint(CursorEntry {
                        handle,
                        user_id: identity.user_id().to_string(),
                        generation: 0,
                    })
                    .await?,
            ),
            None => None,
        };

        info!(
            kinds = spec.kind.len(),
            hits = page.results.len(),
            total = page.total_count,
            has_cursor = cursor.is_some(),
            latency_ms = started.elapsed().as_millis() as u64,
            correlation_id = identity.correlation_id().unwrap_or_default(),
            "Served first cursor page"
        );

        Ok(PageResult { cursor, ..page })
    }

    /// Continues the stream behind `spec.cursor`.
    ///
    /// Fails with `BadRequest` when the token is unknown or the engine lost
    /// the paging handle, and with `Forbidden` when another user minted it.
    pub async fn query_next_page(
        &self,
        spec: &QuerySpec,
        identity: &IdentityContext,
    ) -> GatewayResult<PageResult> {
        let started = Instant::now();
        let token = spec
            .cursor
            .as_ref()
            .ok_or_else(|| ValidationError::MissingRequiredField {
                field: "cursor".to_string(),
            })?;
        if spec.offset.is_some_and(|o| o > 0) {
            return Err(ValidationError::OffsetWithCursor.into());
        }

        let entry = self
            .cursors
            .lookup(token)
            .await?
            .ok_or(CursorError::InvalidOrExpired)?;

        if entry.user_id != identity.user_id() {
            warn!(
                requester = identity.user_id(),
                correlation_id = identity.correlation_id().unwrap_or_default(),
                "Cursor presented by a user other than its owner"
            );
            return Err(CursorError::SharingForbidden.into());
        }

        let result = with_timeout(
            self.config.request_timeout(),
            self.engine
                .continue_paging(&entry.handle, self.config.cursor_keep_alive()),
        )
        .await;

        let page = match result {
            Ok(page) => page,
            Err(EngineError::PagingContextMissing { message }) => {
                debug!(%message, "Engine paging handle expired");
                self.forget_quietly(token).await;
                return Err(CursorError::InvalidOrExpired.into());
            }
            Err(e) => {
                warn!(
                    error = %e,
                    generation = entry.generation,
                    correlation_id = identity.correlation_id().unwrap_or_default(),
                    "Cursor continuation failed"
                );
                return Err(e.into());
            }
        };

        let (page, handle) = split_handle(page);
        let cursor = match handle {
            Some(handle) => {
                let next = self
                    .cursors
                    .mint(CursorEntry {
                        handle,
                        user_id: entry.user_id,
                        generation: entry.generation + 1,
                    })
                    .await?;
                Some(next)
            }
            None => None,
        };
        self.forget_quietly(token).await;

        info!(
            hits = page.results.len(),
            total = page.total_count,
            generation = entry.generation + 1,
            has_cursor = cursor.is_some(),
            latency_ms = started.elapsed().as_millis() as u64,
            correlation_id = identity.correlation_id().unwrap_or_default(),
            "Served cursor continuation page"
        );

        Ok(PageResult { cursor, ..page })
    }

    /// Removes a superseded token. The entry expires on its own if this fails.
    async fn forget_quietly(&self, token: &CursorToken) {
        if let Err(e) = self.cursors.forget(token).await {
            warn!(error = %e, "Failed to remove superseded cursor");
        }
    }
}

/// Converts an engine page, returning the paging handle only when the
/// stream may continue (the page has hits and the engine returned a handle).
pub(crate) fn split_handle(page: EnginePage) -> (PageResult, Option<String>) {
    let handle = page.paging_handle.filter(|_| !page.hits.is_empty());
    let result = PageResult {
        total_count: page.total,
        results: page.hits,
        aggregations: page.aggregations,
        cursor: None,
    };
    (result, handle)
}
