//! Response parsing and failure classification.

use serde_json::Value;

use crate::engine::EnginePage;
use crate::error::EngineError;
use crate::query::AGGREGATION_NAME;
use crate::types::{AggregationBucket, Document};

const CONTEXT_MISSING_MARKERS: [&str; 2] =
    ["No search context found", "search_context_missing_exception"];

const TOO_MANY_CONTEXTS_MARKER: &str = "Trying to create too many scroll contexts";

/// Maps a non-success response to an [`EngineError`].
///
/// Paging-handle conditions are recognized from the body first since the
/// engine reports them under generic status codes.
pub fn classify_failure(status: u16, body: &str, timeout_ms: u64) -> EngineError {
    let message = error_reason(body);

    if CONTEXT_MISSING_MARKERS.iter().any(|m| body.contains(m)) {
        return EngineError::PagingContextMissing { message };
    }
    if body.contains(TOO_MANY_CONTEXTS_MARKER) {
        return EngineError::TooManyPagingContexts { message };
    }

    match status {
        400 => EngineError::BadRequest { message },
        404 => EngineError::NotFound { message },
        413 => EngineError::ResponseTooLarge { message },
        429 => EngineError::Throttled { message },
        503 => EngineError::Unavailable { message },
        504 => EngineError::Timeout { timeout_ms },
        _ => EngineError::Internal {
            message: format!("status {}: {}", status, message),
            source: None,
        },
    }
}

/// Maps a transport failure (no response) to an [`EngineError`].
pub fn transport_error(err: &elasticsearch::Error, timeout_ms: u64) -> EngineError {
    if err.is_timeout() {
        EngineError::Timeout { timeout_ms }
    } else {
        EngineError::Unavailable {
            message: err.to_string(),
        }
    }
}

/// Extracts the most specific reason from an error body, or the raw body.
fn error_reason(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let reason = parsed.as_ref().and_then(|v| {
        v.pointer("/error/root_cause/0/reason")
            .or_else(|| v.pointer("/error/reason"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    reason.unwrap_or_else(|| body.chars().take(512).collect())
}

/// Detects a continuation answered with shard failures only because the
/// paging handle is gone.
pub fn paging_context_lost(body: &Value) -> Option<EngineError> {
    let failures = body.pointer("/_shards/failures")?.as_array()?;
    let hits_empty = body
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .is_none_or(|hits| hits.is_empty());
    if !hits_empty {
        return None;
    }
    failures.iter().find_map(|failure| {
        let text = failure.to_string();
        CONTEXT_MISSING_MARKERS
            .iter()
            .any(|m| text.contains(m))
            .then(|| EngineError::PagingContextMissing {
                message: failure
                    .pointer("/reason/reason")
                    .and_then(Value::as_str)
                    .unwrap_or("search context missing")
                    .to_string(),
            })
    })
}

/// Converts a search or scroll response body into an [`EnginePage`].
pub fn parse_page(body: &Value) -> EnginePage {
    let hits: Vec<Document> = body
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("_source").and_then(Value::as_object).cloned())
                .collect()
        })
        .unwrap_or_default();

    // `hits.total` is an object since 7.x, a bare number before.
    let total = body
        .pointer("/hits/total")
        .and_then(|t| t.get("value").and_then(Value::as_u64).or_else(|| t.as_u64()))
        .unwrap_or(0);

    let paging_handle = body
        .get("_scroll_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    let aggregations = body
        .pointer(&format!("/aggregations/{}/buckets", AGGREGATION_NAME))
        .and_then(Value::as_array)
        .map(|buckets| buckets.iter().filter_map(parse_bucket).collect());

    EnginePage {
        hits,
        total,
        paging_handle,
        aggregations,
    }
}

fn parse_bucket(bucket: &Value) -> Option<AggregationBucket> {
    let key = bucket
        .get("key_as_string")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| match bucket.get("key")? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })?;
    let count = bucket.get("doc_count").and_then(Value::as_u64)?;
    Some(AggregationBucket { key, count })
}

/// Collects alias names from a `GET _alias` body.
pub fn parse_alias_names(body: &Value) -> std::collections::HashSet<String> {
    body.as_object()
        .into_iter()
        .flat_map(|indices| indices.values())
        .filter_map(|index| index.get("aliases").and_then(Value::as_object))
        .flat_map(|aliases| aliases.keys().cloned())
        .collect()
}

/// Picks the index whose alias set contains `name` from a `GET _alias/<name>`
/// body. Returns `name` itself when no index lists it.
pub fn concrete_index_behind(body: &Value, name: &str) -> String {
    body.as_object()
        .into_iter()
        .flat_map(|indices| indices.iter())
        .find(|(_, entry)| {
            entry
                .get("aliases")
                .and_then(Value::as_object)
                .is_some_and(|aliases| aliases.contains_key(name))
        })
        .map(|(index, _)| index.clone())
        .unwrap_or_else(|| name.to_string())
}
