//! Kind-pattern to index-expression resolution.
//!
//! The [`IndexResolver`] enforces tenant isolation on the kinds a query names
//! and turns them into the index expression the engine searches. Most queries
//! name a handful of kinds and resolve to raw index names directly. Queries
//! that expand to very long expressions (hundreds of literal kinds) switch to
//! short per-kind aliases, materialized and cached by the [`AliasService`].
//!
//! # Resolution rules
//!
//! - A requester without partitions is rejected before anything else.
//! - A `*` partition segment is replaced with the requester's primary
//!   partition; any other partition must belong to the requester.
//! - Caller kind order and duplicates are preserved in the expression.
//! - The expression always ends with `-.*` to exclude system indices.

mod alias;

use tracing::debug;

use crate::error::{GatewayResult, ValidationError};
use crate::tenant::IdentityContext;
use crate::types::{IndexExpression, Kind, KindPattern};

pub use alias::AliasService;

/// Resolves kind patterns for a requester.
#[derive(Clone)]
pub struct IndexResolver {
    aliases: AliasService,
    alias_threshold: usize,
}

impl IndexResolver {
    /// Creates a resolver that switches to aliases once the raw expression
    /// is longer than `alias_threshold` characters.
    pub fn new(aliases: AliasService, alias_threshold: usize) -> Self {
        Self {
            aliases,
            alias_threshold,
        }
    }

    /// Applies the cross-tenant guard and returns the effective kinds.
    ///
    /// Performs no engine or cache calls.
    pub fn authorize(
        &self,
        pattern: &KindPattern,
        identity: &IdentityContext,
    ) -> GatewayResult<Vec<Kind>> {
        if !identity.has_partition() {
            return Err(ValidationError::MissingPartition.into());
        }

        let primary = identity.primary_partition();
        pattern
            .kinds()
            .iter()
            .map(|kind| -> GatewayResult<Kind> {
                let kind = if kind.has_wildcard_partition() {
                    kind.with_partition(primary.as_str())
                } else {
                    kind.clone()
                };
                identity.check_partition(kind.as_str())?;
                Ok(kind)
            })
            .collect()
    }

    /// Resolves `pattern` into an index expression for `identity`.
    pub async fn resolve(
        &self,
        pattern: &KindPattern,
        identity: &IdentityContext,
    ) -> GatewayResult<IndexExpression> {
        let kinds = self.authorize(pattern, identity)?;

        let raw = IndexExpression::from_targets(kinds.iter().map(Kind::index_name));
        if kinds.len() == 1 || raw.len() <= self.alias_threshold {
            return Ok(raw);
        }

        let partition = identity.primary_partition();
        let aliases = self.aliases.indices_aliases(&kinds, &partition).await;
        let expression = IndexExpression::from_targets(
            kinds
                .iter()
                .map(|kind| aliases.get(kind).cloned().unwrap_or_else(|| kind.index_name())),
        );

        debug!(
            kinds = kinds.len(),
            aliased = aliases.len(),
            raw_length = raw.len(),
            length = expression.len(),
            correlation_id = identity.correlation_id().unwrap_or_default(),
            "Resolved index expression through aliases"
        );

        Ok(expression)
    }
}
