//! Engine query DSL construction.
//!
//! Translates a validated [`QuerySpec`] into an Elasticsearch-compatible
//! request body. Only the fields that drive pagination and authorization
//! filtering are modeled; spatial clauses arrive pre-built.

use serde_json::{Map, Value, json};

use crate::config::GatewayConfig;
use crate::error::TenantError;
use crate::tenant::IdentityContext;
use crate::types::{QuerySpec, SortSpec};

/// Field holding the viewer groups of a document.
pub const ACL_VIEWERS_FIELD: &str = "x-acl";

/// Field holding the owner groups of a document.
pub const ACL_OWNERS_FIELD: &str = "acl.owners";

/// Name of the terms aggregation added for `aggregate_by`.
pub const AGGREGATION_NAME: &str = "agg";

const INDEX_FIELD: &str = "index";

/// How the result window is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// `from`/`size` addressing.
    Offset,
    /// Engine paging handle; no `from`, stable default sort.
    Cursor,
}

/// Builds engine request bodies for one requester.
pub struct QueryBuilder<'a> {
    identity: &'a IdentityContext,
    config: &'a GatewayConfig,
}

impl<'a> QueryBuilder<'a> {
    /// Creates a new query builder.
    pub fn new(identity: &'a IdentityContext, config: &'a GatewayConfig) -> Self {
        Self { identity, config }
    }

    /// Builds the complete request body.
    ///
    /// `limit` is the page size already validated against the query limits.
    pub fn build(&self, spec: &QuerySpec, limit: u32, mode: PageMode) -> Result<Value, TenantError> {
        let mut must_clauses: Vec<Value> = Vec::new();
        let mut filter_clauses: Vec<Value> = Vec::new();

        if let Some(text) = spec.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            must_clauses.push(json!({
                "query_string": {
                    "query": text,
                    "allow_leading_wildcard": false
                }
            }));
        }

        if let Some(spatial) = &spec.spatial_filter {
            filter_clauses.push(spatial.0.clone());
        }

        if let Some(acl) = self.build_acl_filter(spec.query_as_owner)? {
            filter_clauses.push(acl);
        }

        let mut bool_query = Map::new();
        if !must_clauses.is_empty() {
            bool_query.insert("must".to_string(), json!(must_clauses));
        }
        if !filter_clauses.is_empty() {
            bool_query.insert("filter".to_string(), json!(filter_clauses));
        }

        let mut body = json!({
            "query": { "bool": bool_query },
            "size": limit,
            "timeout": format!("{}ms", self.config.request_timeout_ms),
            "_source": self.build_source(&spec.returned_fields),
        });

        if mode == PageMode::Offset {
            body["from"] = json!(spec.effective_offset());
        }

        if spec.track_total_count {
            body["track_total_hits"] = json!(true);
        }

        match (&spec.sort, mode) {
            (Some(sort), _) => body["sort"] = Self::build_sort(sort),
            (None, PageMode::Cursor) => body["sort"] = Self::default_cursor_sort(),
            (None, PageMode::Offset) => {}
        }

        if let Some(field) = &spec.aggregate_by {
            body["aggs"] = json!({
                AGGREGATION_NAME: {
                    "terms": {
                        "field": field,
                        "size": self.config.aggregation_size
                    }
                }
            });
        }

        Ok(body)
    }

    /// Builds the authorization filter, or `None` for root identities.
    fn build_acl_filter(&self, as_owner: bool) -> Result<Option<Value>, TenantError> {
        if self.identity.is_root() {
            return Ok(None);
        }

        let groups = self.identity.data_groups();
        if groups.is_empty() {
            return Err(TenantError::MissingDataGroups {
                user_id: self.identity.user_id().to_string(),
            });
        }

        let field = if as_owner {
            ACL_OWNERS_FIELD
        } else {
            ACL_VIEWERS_FIELD
        };
        Ok(Some(json!({ "terms": { field: groups } })))
    }

    fn build_source(&self, returned_fields: &[String]) -> Value {
        let mut excludes = vec![ACL_VIEWERS_FIELD];
        if !returned_fields.iter().any(|f| f == INDEX_FIELD) {
            excludes.push(INDEX_FIELD);
        }

        let mut source = json!({ "excludes": excludes });
        if !returned_fields.is_empty() {
            source["includes"] = json!(returned_fields);
        }
        source
    }

    fn build_sort(sort: &SortSpec) -> Value {
        let clauses: Vec<Value> = sort
            .pairs()
            .map(|(field, order)| {
                json!({
                    field: {
                        "order": order.as_str(),
                        "missing": "_last",
                        "unmapped_type": "keyword"
                    }
                })
            })
            .collect();
        json!(clauses)
    }

    /// Relevance first, then index order, so paging-handle pages are stable.
    fn default_cursor_sort() -> Value {
        json!([
            { "_score": { "order": "desc" } },
            { "_doc": { "order": "asc" } }
        ])
    }
}
