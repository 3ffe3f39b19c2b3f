//! Error types for the search gateway.
//!
//! Errors are organized by the layer that detects them: request validation,
//! tenant isolation, cursor handling, the search engine, and the cache backends.
//! Every error classifies into an [`ErrorKind`], which the API layer translates
//! into a transport status. [`GatewayError::to_response`] produces the
//! caller-facing shape (code, short reason, message) without leaking engine
//! internals for server-side failures.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The primary error type for all gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Malformed or out-of-bounds request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Tenant isolation and authorization errors.
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Cursor lifecycle errors.
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// Errors reported by, or while talking to, the search engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Cache backend errors.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Errors raised while validating a request, before any engine call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The kind pattern is malformed.
    #[error("invalid kind '{kind}': {message}")]
    InvalidKind { kind: String, message: String },

    /// The request carries no partition id.
    #[error("at least one data partition id is required")]
    MissingPartition,

    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// The requested page size is out of bounds.
    #[error("limit {limit} is out of range, expected 1 to {max}")]
    InvalidLimit { limit: u32, max: u32 },

    /// `offset + limit` exceeds the engine's result window.
    #[error("offset ({offset}) + limit ({limit}) must not exceed {max}")]
    ResultWindowExceeded { offset: u32, limit: u32, max: u32 },

    /// Offsets cannot be combined with cursor iteration.
    #[error("offset is not supported for cursor queries")]
    OffsetWithCursor,

    /// The sort specification is malformed.
    #[error("invalid sort: {message}")]
    InvalidSort { message: String },
}

/// Errors related to tenant isolation and data authorization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenantError {
    /// The kind names a partition the requester does not belong to.
    #[error("searching across tenants is forbidden: kind '{kind}' is outside partitions [{partitions}]")]
    CrossTenantSearch { kind: String, partitions: String },

    /// A non-root requester has no data groups to filter by.
    #[error("user {user_id} has no data authorization groups")]
    MissingDataGroups { user_id: String },
}

/// Errors related to cursor tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// No cursor entry exists for the token, or the engine discarded the paging handle.
    #[error("the given cursor is invalid or expired")]
    InvalidOrExpired,

    /// The cursor was minted for another user.
    #[error("cursor issuer doesn't match the cursor consumer")]
    SharingForbidden,

    /// The engine refused to open another paging handle.
    #[error("too many cursor requests, please re-try after some time")]
    TooManyOpenCursors,
}

/// Errors originating from the search engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine no longer knows the paging handle.
    #[error("paging context not found: {message}")]
    PagingContextMissing { message: String },

    /// The engine has too many open paging handles.
    #[error("too many open paging contexts: {message}")]
    TooManyPagingContexts { message: String },

    /// The engine rejected the request due to load.
    #[error("search engine throttled the request: {message}")]
    Throttled { message: String },

    /// The engine is unreachable or unhealthy.
    #[error("search engine unavailable: {message}")]
    Unavailable { message: String },

    /// The engine did not answer in time.
    #[error("search engine request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The requested engine resource does not exist.
    #[error("search engine resource not found: {message}")]
    NotFound { message: String },

    /// The engine rejected the request as malformed.
    #[error("search engine rejected the request: {message}")]
    BadRequest { message: String },

    /// The engine response exceeded the allowed size.
    #[error("search engine response is too large: {message}")]
    ResponseTooLarge { message: String },

    /// Any other engine failure.
    #[error("search engine error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EngineError {
    /// Creates an [`EngineError::Internal`] without a source.
    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Errors originating from a cache backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache backend could not be reached.
    #[error("cache unavailable: {message}")]
    Unavailable { message: String },

    /// A cached value could not be encoded or decoded.
    #[error("cache serialization error: {message}")]
    Serialization { message: String },
}

/// Caller-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed request, invalid or expired cursor.
    BadRequest,
    /// Cross-tenant access, cursor owner mismatch, missing groups.
    Forbidden,
    /// Resource absent upstream.
    NotFound,
    /// The engine response exceeded the transport limit.
    PayloadTooLarge,
    /// Paging-handle exhaustion on a fresh cursor query.
    TooManyRequests,
    /// Unclassified failure.
    InternalError,
    /// Engine or cache unreachable; retryable.
    ServiceUnavailable,
    /// Engine too slow; retryable.
    GatewayTimeout,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalError => 500,
            ErrorKind::ServiceUnavailable => 503,
            ErrorKind::GatewayTimeout => 504,
        }
    }

    /// Returns the canonical reason phrase.
    pub fn reason(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::PayloadTooLarge => "Response is too long",
            ErrorKind::TooManyRequests => "Too many requests",
            ErrorKind::InternalError => "Search error",
            ErrorKind::ServiceUnavailable => "Search error",
            ErrorKind::GatewayTimeout => "Request timed out",
        }
    }

    /// Returns `true` for 5xx kinds.
    pub fn is_server_error(self) -> bool {
        self.status_code() >= 500
    }

    /// Returns `true` when the caller may retry the same request later.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::TooManyRequests | ErrorKind::ServiceUnavailable | ErrorKind::GatewayTimeout
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code(), self.reason())
    }
}

/// The caller-facing rendering of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub code: u16,
    /// Short reason.
    pub reason: String,
    /// Human-readable message.
    pub message: String,
}

impl GatewayError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Validation(_) => ErrorKind::BadRequest,
            GatewayError::Tenant(_) => ErrorKind::Forbidden,
            GatewayError::Cursor(err) => match err {
                CursorError::InvalidOrExpired => ErrorKind::BadRequest,
                CursorError::SharingForbidden => ErrorKind::Forbidden,
                CursorError::TooManyOpenCursors => ErrorKind::TooManyRequests,
            },
            GatewayError::Engine(err) => match err {
                EngineError::BadRequest { .. } => ErrorKind::BadRequest,
                EngineError::NotFound { .. } => ErrorKind::NotFound,
                EngineError::ResponseTooLarge { .. } => ErrorKind::PayloadTooLarge,
                EngineError::Throttled { .. } | EngineError::Unavailable { .. } => {
                    ErrorKind::ServiceUnavailable
                }
                EngineError::Timeout { .. } => ErrorKind::GatewayTimeout,
                // CursorPager turns these into cursor errors where a cursor is
                // involved; anywhere else they are server faults.
                EngineError::PagingContextMissing { .. }
                | EngineError::TooManyPagingContexts { .. }
                | EngineError::Internal { .. } => ErrorKind::InternalError,
            },
            GatewayError::Cache(_) => ErrorKind::ServiceUnavailable,
        }
    }

    /// Returns the short, stable reason for this error.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::Cursor(CursorError::InvalidOrExpired) => "cursor invalid or expired",
            GatewayError::Cursor(CursorError::SharingForbidden) => "cursor sharing is forbidden",
            GatewayError::Cursor(CursorError::TooManyOpenCursors) => "Too many requests",
            GatewayError::Tenant(TenantError::CrossTenantSearch { .. }) => {
                "searching across tenants is forbidden"
            }
            GatewayError::Tenant(TenantError::MissingDataGroups { .. }) => {
                "missing authorization groups"
            }
            GatewayError::Validation(_) => "invalid request",
            _ => self.kind().reason(),
        }
    }

    /// Returns the message shown to the caller.
    ///
    /// Server-side failures get a generic message; the detail is only logged.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::ServiceUnavailable => "Please re-try search after some time.".to_string(),
            ErrorKind::GatewayTimeout => match self {
                GatewayError::Engine(EngineError::Timeout { timeout_ms }) => {
                    format!("Request timed out after waiting for {}ms", timeout_ms)
                }
                _ => "Request timed out".to_string(),
            },
            ErrorKind::InternalError => "Error processing search request".to_string(),
            ErrorKind::PayloadTooLarge => {
                "Response is too long; request fewer results or fields".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Renders this error for the caller.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.kind().status_code(),
            reason: self.reason().to_string(),
            message: self.public_message(),
        }
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_error_classification() {
        let err = GatewayError::from(CursorError::InvalidOrExpired);
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.reason(), "cursor invalid or expired");

        let err = GatewayError::from(CursorError::SharingForbidden);
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.reason(), "cursor sharing is forbidden");

        let err = GatewayError::from(CursorError::TooManyOpenCursors);
        assert_eq!(err.kind(), ErrorKind::TooManyRequests);
        assert_eq!(err.kind().status_code(), 429);
    }

    #[test]
    fn test_tenant_error_classification() {
        let err = GatewayError::from(TenantError::CrossTenantSearch {
            kind: "tenant2:*:*:*".to_string(),
            partitions: "tenant1".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.reason(), "searching across tenants is forbidden");
        assert!(err.to_string().contains("tenant2:*:*:*"));
    }

    #[test]
    fn test_engine_error_classification() {
        let cases = [
            (
                EngineError::Unavailable {
                    message: "down".to_string(),
                },
                ErrorKind::ServiceUnavailable,
            ),
            (
                EngineError::Throttled {
                    message: "busy".to_string(),
                },
                ErrorKind::ServiceUnavailable,
            ),
            (EngineError::Timeout { timeout_ms: 60000 }, ErrorKind::GatewayTimeout),
            (
                EngineError::NotFound {
                    message: "gone".to_string(),
                },
                ErrorKind::NotFound,
            ),
            (
                EngineError::TooManyPagingContexts {
                    message: "500".to_string(),
                },
                ErrorKind::InternalError,
            ),
            (EngineError::internal("boom"), ErrorKind::InternalError),
        ];

        for (err, expected) in cases {
            assert_eq!(GatewayError::from(err).kind(), expected);
        }
    }

    #[test]
    fn test_response_too_large_is_413() {
        let err = GatewayError::from(EngineError::ResponseTooLarge {
            message: "entity content is too long [104857600]".to_string(),
        });
        let response = err.to_response();
        assert_eq!(err.kind(), ErrorKind::PayloadTooLarge);
        assert_eq!(response.code, 413);
        assert_eq!(response.reason, "Response is too long");
        assert!(!response.message.contains("104857600"));
        assert!(!err.kind().is_retryable());
    }

    #[test]
    fn test_uncursored_paging_context_loss_is_internal() {
        let err = GatewayError::from(EngineError::PagingContextMissing {
            message: "No search context found for id [7]".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert_eq!(err.to_response().code, 500);
        assert_ne!(err.reason(), "cursor invalid or expired");
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = GatewayError::from(EngineError::internal("shard [3] failed on node-7"));
        let response = err.to_response();
        assert_eq!(response.code, 500);
        assert_eq!(response.message, "Error processing search request");
        assert!(!response.message.contains("node-7"));
    }

    #[test]
    fn test_client_errors_keep_detail() {
        let err = GatewayError::from(ValidationError::InvalidLimit { limit: 0, max: 1000 });
        let response = err.to_response();
        assert_eq!(response.code, 400);
        assert!(response.message.contains("limit 0"));
    }

    #[test]
    fn test_timeout_message() {
        let err = GatewayError::from(EngineError::Timeout { timeout_ms: 60000 });
        assert_eq!(
            err.public_message(),
            "Request timed out after waiting for 60000ms"
        );
    }

    #[test]
    fn test_error_kind_flags() {
        assert!(ErrorKind::GatewayTimeout.is_retryable());
        assert!(ErrorKind::TooManyRequests.is_retryable());
        assert!(!ErrorKind::Forbidden.is_retryable());
        assert!(ErrorKind::ServiceUnavailable.is_server_error());
        assert!(!ErrorKind::BadRequest.is_server_error());
        assert_eq!(ErrorKind::Forbidden.to_string(), "403 Forbidden");
    }

    #[test]
    fn test_cache_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::Serialization { .. }));
        assert_eq!(GatewayError::from(err).kind(), ErrorKind::ServiceUnavailable);
    }
}
