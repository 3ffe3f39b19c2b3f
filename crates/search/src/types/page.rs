//! Page results and cursor state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A result document: an open field-to-value map.
pub type Document = Map<String, Value>;

/// An opaque continuation token handed to callers.
///
/// Tokens are uppercase hex digests; the engine paging handle they stand
/// for is never exposed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorToken(String);

impl CursorToken {
    /// Wraps a token received from a caller.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Renders a digest as an uppercase hex token.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode_upper(digest))
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CursorToken({})", self.0)
    }
}

/// The cursor-cache value stored under a [`CursorToken`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorEntry {
    /// The engine paging handle.
    pub handle: String,
    /// The user that minted the cursor.
    pub user_id: String,
    /// Number of continuations served so far on this stream.
    pub generation: u64,
}

/// One aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    /// Bucket key.
    pub key: String,
    /// Document count.
    pub count: u64,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Total matching documents, independent of the page position.
    pub total_count: u64,
    /// Documents on this page, in engine order.
    pub results: Vec<Document>,
    /// Aggregation buckets, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Vec<AggregationBucket>>,
    /// Token for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorToken>,
}

impl PageResult {
    /// Returns a page with no results and no cursor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` when no further page can be requested.
    pub fn is_terminal(&self) -> bool {
        self.cursor.is_none()
    }

    /// Returns the number of documents on this page.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` when this page has no documents.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_digest_is_uppercase_hex() {
        let token = CursorToken::from_digest(&[0xab, 0x01, 0xff]);
        assert_eq!(token.as_str(), "AB01FF");
    }

    #[test]
    fn test_empty_page_is_terminal() {
        let page = PageResult::empty();
        assert!(page.is_terminal());
        assert!(page.is_empty());
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_page_serialization_omits_absent_cursor() {
        let page = PageResult {
            total_count: 3,
            ..PageResult::empty()
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json, serde_json::json!({"totalCount": 3, "results": []}));

        let page = PageResult {
            cursor: Some(CursorToken::new("AB")),
            ..page
        };
        assert_eq!(serde_json::to_value(&page).unwrap()["cursor"], "AB");
    }

    #[test]
    fn test_cursor_entry_round_trips_through_json() {
        let entry = CursorEntry {
            handle: "scroll-1".to_string(),
            user_id: "user@example.com".to_string(),
            generation: 2,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"userId\""));
        let back: CursorEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
