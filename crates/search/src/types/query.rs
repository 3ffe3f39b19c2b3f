//! Query request types.
//!
//! [`QuerySpec`] carries only the fields needed to drive index resolution,
//! authorization filtering and pagination. Spatial clauses arrive pre-built
//! from the caller and are forwarded unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::kind::KindPattern;
use super::page::CursorToken;
use crate::error::ValidationError;

/// Bounds applied to every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Page size used when the request does not set one.
    pub default_limit: u32,
    /// Largest accepted page size.
    pub max_limit: u32,
    /// Largest accepted `offset + limit`.
    pub max_result_window: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 1000,
            max_result_window: 10_000,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns the engine spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sort specification as parallel field/order lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Fields to sort by, in priority order.
    pub field: Vec<String>,
    /// Direction per field.
    pub order: Vec<SortOrder>,
}

impl SortSpec {
    /// Creates a sort on one field.
    pub fn single(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: vec![field.into()],
            order: vec![order],
        }
    }

    /// Appends another sort key.
    pub fn then(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.field.push(field.into());
        self.order.push(order);
        self
    }

    /// Checks that both lists are non-empty, equally long, and name real fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.field.is_empty() {
            return Err(ValidationError::InvalidSort {
                message: "sort must name at least one field".to_string(),
            });
        }
        if self.field.len() != self.order.len() {
            return Err(ValidationError::InvalidSort {
                message: format!(
                    "{} sort fields but {} sort orders",
                    self.field.len(),
                    self.order.len()
                ),
            });
        }
        if self.field.iter().any(|f| f.trim().is_empty()) {
            return Err(ValidationError::InvalidSort {
                message: "sort field names must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Iterates over `(field, order)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, SortOrder)> {
        self.field
            .iter()
            .map(String::as_str)
            .zip(self.order.iter().copied())
    }
}

/// A pre-built engine filter clause (geo shape, bounding box, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpatialFilter(pub Value);

/// A caller-supplied search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    /// Kinds to search.
    pub kind: KindPattern,

    /// Free-text query in query-string syntax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Spatial filter clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_filter: Option<SpatialFilter>,

    /// Sort specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,

    /// Fields to return; empty returns the whole document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returned_fields: Vec<String>,

    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Offset of the first result (offset queries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,

    /// Filter on ownership instead of viewer access.
    #[serde(default)]
    pub query_as_owner: bool,

    /// Field to bucket results by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_by: Option<String>,

    /// Ask the engine for an exact total count.
    #[serde(default)]
    pub track_total_count: bool,

    /// Continuation token from a previous cursor page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorToken>,
}

impl QuerySpec {
    /// Creates a query over `kind` with every other field unset.
    pub fn new(kind: KindPattern) -> Self {
        Self {
            kind,
            query: None,
            spatial_filter: None,
            sort: None,
            returned_fields: Vec::new(),
            limit: None,
            offset: None,
            query_as_owner: false,
            aggregate_by: None,
            track_total_count: false,
            cursor: None,
        }
    }

    /// Sets the free-text query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the spatial filter.
    pub fn with_spatial_filter(mut self, filter: Value) -> Self {
        self.spatial_filter = Some(SpatialFilter(filter));
        self
    }

    /// Sets the sort.
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the returned fields.
    pub fn with_returned_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returned_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the query-as-owner flag.
    pub fn with_query_as_owner(mut self, as_owner: bool) -> Self {
        self.query_as_owner = as_owner;
        self
    }

    /// Sets the aggregation field.
    pub fn with_aggregate_by(mut self, field: impl Into<String>) -> Self {
        self.aggregate_by = Some(field.into());
        self
    }

    /// Sets exact total-count tracking.
    pub fn with_track_total_count(mut self, track: bool) -> Self {
        self.track_total_count = track;
        self
    }

    /// Sets the continuation token.
    pub fn with_cursor(mut self, cursor: CursorToken) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Returns the page size after defaults are applied.
    pub fn effective_limit(&self, limits: &QueryLimits) -> u32 {
        self.limit.unwrap_or(limits.default_limit)
    }

    /// Returns the offset, zero when unset.
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Validates an offset query and returns the effective page size.
    pub fn validate(&self, limits: &QueryLimits) -> Result<u32, ValidationError> {
        let limit = self.effective_limit(limits);
        if limit == 0 || limit > limits.max_limit {
            return Err(ValidationError::InvalidLimit {
                limit,
                max: limits.max_limit,
            });
        }

        let offset = self.effective_offset();
        if u64::from(offset) + u64::from(limit) > u64::from(limits.max_result_window) {
            return Err(ValidationError::ResultWindowExceeded {
                offset,
                limit,
                max: limits.max_result_window,
            });
        }

        if let Some(sort) = &self.sort {
            sort.validate()?;
        }
        if let Some(field) = &self.aggregate_by {
            if field.trim().is_empty() {
                return Err(ValidationError::MissingRequiredField {
                    field: "aggregateBy".to_string(),
                });
            }
        }

        Ok(limit)
    }

    /// Validates a cursor query and returns the effective page size.
    ///
    /// Offsets cannot be combined with cursors.
    pub fn validate_for_cursor(&self, limits: &QueryLimits) -> Result<u32, ValidationError> {
        if self.offset.is_some_and(|o| o > 0) {
            return Err(ValidationError::OffsetWithCursor);
        }
        self.validate(limits)
    }
}
