//! Alias materialization and caching.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::PartitionScopedCache;
use crate::engine::{SearchEngineClient, with_timeout};
use crate::error::EngineResult;
use crate::tenant::PartitionId;
use crate::types::Kind;

/// Resolves kinds to engine aliases, creating aliases that do not exist yet.
///
/// Failures never propagate: a kind whose alias cannot be read, checked, or
/// created is simply missing from the returned map, and callers fall back to
/// the raw index name.
#[derive(Clone)]
pub struct AliasService {
    engine: Arc<dyn SearchEngineClient>,
    cache: PartitionScopedCache,
    request_timeout: Duration,
}

impl AliasService {
    /// Creates a new alias service.
    pub fn new(
        engine: Arc<dyn SearchEngineClient>,
        cache: PartitionScopedCache,
        request_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            cache,
            request_timeout,
        }
    }

    /// Returns the alias for every aliasable kind that could be resolved.
    ///
    /// Kinds are deduplicated and read from the cache first. For the misses,
    /// existence is checked with one `alias_exists` call when a single kind
    /// is missing, or one `get_all_aliases` call otherwise. Missing aliases
    /// are created and every confirmed alias is cached.
    pub async fn indices_aliases(
        &self,
        kinds: &[Kind],
        partition: &PartitionId,
    ) -> HashMap<Kind, String> {
        let mut resolved = HashMap::new();
        let mut unresolved: Vec<&Kind> = Vec::new();
        let mut seen: HashSet<&Kind> = HashSet::new();

        for kind in kinds {
            if !kind.supports_alias() || !seen.insert(kind) {
                continue;
            }
            match self.cache.get(partition, kind.as_str()).await {
                Ok(Some(alias)) => {
                    resolved.insert(kind.clone(), alias);
                }
                Ok(None) => unresolved.push(kind),
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Alias cache read failed");
                    unresolved.push(kind);
                }
            }
        }

        if unresolved.is_empty() {
            return resolved;
        }

        let known_aliases = if unresolved.len() > 1 {
            match with_timeout(self.request_timeout, self.engine.get_all_aliases()).await {
                Ok(aliases) => Some(aliases),
                Err(e) => {
                    warn!(
                        partition = %partition,
                        missing = unresolved.len(),
                        error = %e,
                        "Failed to list engine aliases"
                    );
                    return resolved;
                }
            }
        } else {
            None
        };

        for kind in unresolved {
            let alias = kind.alias_name();

            let exists = match &known_aliases {
                Some(aliases) => aliases.contains(&alias),
                None => {
                    let check = self.engine.alias_exists(&alias);
                    match with_timeout(self.request_timeout, check).await {
                        Ok(exists) => exists,
                        Err(e) => {
                            warn!(
                                kind = %kind,
                                alias = %alias,
                                error = %e,
                                "Alias existence check failed"
                            );
                            continue;
                        }
                    }
                }
            };

            if !exists {
                match self.create_alias(kind, &alias).await {
                    Ok(true) => debug!(kind = %kind, alias = %alias, "Created alias"),
                    Ok(false) => {
                        warn!(kind = %kind, alias = %alias, "Alias was not created");
                        continue;
                    }
                    Err(e) => {
                        warn!(kind = %kind, alias = %alias, error = %e, "Failed to create alias");
                        continue;
                    }
                }
            }

            if let Err(e) = self.cache.put(partition, kind.as_str(), alias.clone()).await {
                warn!(kind = %kind, alias = %alias, error = %e, "Alias cache write failed");
            }
            resolved.insert(kind.clone(), alias);
        }

        resolved
    }

    /// Points the alias at the kind's index.
    ///
    /// Complete-version kinds alias the concrete index behind the index name,
    /// never another alias. Returns `Ok(false)` when no such index exists.
    async fn create_alias(&self, kind: &Kind, alias: &str) -> EngineResult<bool> {
        let mut index = kind.index_name();
        if kind.is_complete_version() {
            let lookup = self.engine.resolve_concrete_index(&index);
            let concrete = with_timeout(self.request_timeout, lookup).await?;
            match concrete {
                Some(concrete) => index = concrete,
                None => return Ok(false),
            }
        }
        with_timeout(self.request_timeout, self.engine.create_alias(&index, alias)).await
    }
}
