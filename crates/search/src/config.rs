//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::QueryLimits;

/// Runtime settings for the resolver, the pager, and federation.
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Timeout for each engine call, in milliseconds (default: 60000).
    pub request_timeout_ms: u64,

    /// Engine paging-handle keep-alive, in seconds (default: 90).
    pub cursor_keep_alive_secs: u64,

    /// Lifetime of a cursor-cache entry, in seconds (default: 3600).
    pub cursor_ttl_secs: u64,

    /// Raw index expressions longer than this many characters switch to
    /// aliases (default: 3840).
    pub alias_threshold: usize,

    /// Page size when the request sets none (default: 10).
    pub default_limit: u32,

    /// Largest accepted page size (default: 1000).
    pub max_limit: u32,

    /// Largest accepted `offset + limit` (default: 10000).
    pub max_result_window: u32,

    /// Bucket count for aggregations (default: 1000).
    pub aggregation_size: u32,

    /// Concurrent partition queries during federation. Defaults to the
    /// available parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanout_parallelism: Option<usize>,

    /// Entry bound for the in-process caches (default: 10000).
    pub cache_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 60_000,
            cursor_keep_alive_secs: 90,
            cursor_ttl_secs: 3600,
            alias_threshold: 3840,
            default_limit: 10,
            max_limit: 1000,
            max_result_window: 10_000,
            aggregation_size: 1000,
            fanout_parallelism: None,
            cache_capacity: 10_000,
        }
    }
}

impl GatewayConfig {
    /// Returns the per-call engine timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the paging-handle keep-alive.
    pub fn cursor_keep_alive(&self) -> Duration {
        Duration::from_secs(self.cursor_keep_alive_secs)
    }

    /// Returns the cursor-cache entry lifetime.
    pub fn cursor_ttl(&self) -> Duration {
        Duration::from_secs(self.cursor_ttl_secs)
    }

    /// Returns the query bounds.
    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            max_result_window: self.max_result_window,
        }
    }

    /// Returns the federation concurrency bound.
    pub fn effective_parallelism(&self) -> usize {
        self.fanout_parallelism
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
            .max(1)
    }

    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.request_timeout_ms == 0 {
            errors.push("request_timeout_ms must be greater than 0".to_string());
        }
        if self.cursor_keep_alive_secs == 0 {
            errors.push("cursor_keep_alive_secs must be greater than 0".to_string());
        }
        if self.cursor_ttl_secs < self.cursor_keep_alive_secs {
            errors.push(format!(
                "cursor_ttl_secs ({}) must not be shorter than cursor_keep_alive_secs ({})",
                self.cursor_ttl_secs, self.cursor_keep_alive_secs
            ));
        }
        if self.alias_threshold == 0 {
            errors.push("alias_threshold must be greater than 0".to_string());
        }
        if self.max_limit == 0 {
            errors.push("max_limit must be greater than 0".to_string());
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            errors.push(format!(
                "default_limit ({}) must be between 1 and max_limit ({})",
                self.default_limit, self.max_limit
            ));
        }
        if self.max_result_window < self.max_limit {
            errors.push(format!(
                "max_result_window ({}) must not be smaller than max_limit ({})",
                self.max_result_window, self.max_limit
            ));
        }
        if self.aggregation_size == 0 {
            errors.push("aggregation_size must be greater than 0".to_string());
        }
        if self.fanout_parallelism == Some(0) {
            errors.push("fanout_parallelism must be greater than 0".to_string());
        }
        if self.cache_capacity == 0 {
            errors.push("cache_capacity must be greater than 0".to_string());
        }

        errors
    }
}
