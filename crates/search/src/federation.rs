//! Cross-partition fan-out.
//!
//! A requester that belongs to several partitions can search all of them in
//! one call. [`FederatedSearch`] runs one offset query per partition, bounded
//! by a semaphore, and merges whatever succeeds. A partition that fails is
//! logged and left out; the call fails only when every partition fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{EngineError, GatewayError, GatewayResult};
use crate::service::SearchService;
use crate::tenant::{IdentityContext, PartitionId};
use crate::types::{AggregationBucket, Kind, KindPattern, PageResult, QuerySpec};

/// Runs offset queries across every partition of the requester.
#[derive(Clone)]
pub struct FederatedSearch {
    service: SearchService,
    parallelism: usize,
}

impl FederatedSearch {
    /// Creates a fan-out over `service`, bounded by the configured parallelism.
    pub fn new(service: SearchService) -> Self {
        let parallelism = service.config().effective_parallelism();
        Self {
            service,
            parallelism,
        }
    }

    /// Overrides the concurrency bound.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Queries every partition of `identity` and merges the pages.
    ///
    /// Validation and the cross-tenant guard run once, up front, against the
    /// full identity. Each partition then searches the kinds it owns plus
    /// every wildcard-partition kind.
    pub async fn query(
        &self,
        spec: &QuerySpec,
        identity: &IdentityContext,
    ) -> GatewayResult<PageResult> {
        spec.validate(&self.service.config().limits())?;
        self.service.resolver().authorize(&spec.kind, identity)?;

        let mut partitions: Vec<PartitionId> = Vec::new();
        for partition in identity.partitions() {
            if !partitions.contains(partition) {
                partitions.push(partition.clone());
            }
        }
        if partitions.len() == 1 {
            return self.service.query(spec, identity).await;
        }

        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut tasks: JoinSet<(usize, GatewayResult<PageResult>)> = JoinSet::new();

        for (position, partition) in partitions.iter().enumerate() {
            let Some(kinds) = kinds_for_partition(&spec.kind, partition) else {
                continue;
            };
            let mut partition_spec = spec.clone();
            partition_spec.kind = kinds;
            let partition_identity = identity.narrowed_to(partition);
            let service = self.service.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => service.query(&partition_spec, &partition_identity).await,
                    Err(_) => Err(EngineError::internal("fan-out semaphore closed").into()),
                };
                (position, result)
            });
        }

        let mut outcomes: Vec<(usize, GatewayResult<PageResult>)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "Partition query task failed to complete"),
            }
        }
        outcomes.sort_by_key(|(position, _)| *position);

        let mut pages = Vec::new();
        let mut first_error: Option<GatewayError> = None;
        for (position, outcome) in outcomes {
            match outcome {
                Ok(page) => pages.push(page),
                Err(e) => {
                    warn!(
                        partition = %partitions[position],
                        error = %e,
                        correlation_id = identity.correlation_id().unwrap_or_default(),
                        "Partition query failed, dropping it from the merge"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        if pages.is_empty() {
            return Err(first_error
                .unwrap_or_else(|| EngineError::internal("no partition query completed").into()));
        }

        debug!(
            partitions = partitions.len(),
            succeeded = pages.len(),
            "Merging partition pages"
        );
        Ok(merge_pages(pages))
    }
}

/// Returns the kinds `partition` should search, or `None` when it owns none.
fn kinds_for_partition(pattern: &KindPattern, partition: &PartitionId) -> Option<KindPattern> {
    let kinds: Vec<Kind> = pattern
        .kinds()
        .iter()
        .filter(|kind| kind.has_wildcard_partition() || partition.matches(kind.partition()))
        .cloned()
        .collect();
    KindPattern::from_kinds(kinds).ok()
}

/// Merges pages given in partition order.
///
/// Totals are summed. Results are interleaved round-robin, starting with the
/// page reporting the largest total (ties keep partition order). Aggregation
/// buckets with the same key are summed.
pub fn merge_pages(mut pages: Vec<PageResult>) -> PageResult {
    let total_count = pages.iter().map(|p| p.total_count).sum();
    pages.sort_by(|a, b| b.total_count.cmp(&a.total_count));

    let mut aggregations: Option<BTreeMap<String, u64>> = None;
    for page in &mut pages {
        if let Some(buckets) = page.aggregations.take() {
            let merged = aggregations.get_or_insert_with(BTreeMap::new);
            for bucket in buckets {
                *merged.entry(bucket.key).or_insert(0) += bucket.count;
            }
        }
    }

    let longest = pages.iter().map(|p| p.results.len()).max().unwrap_or(0);
    let mut iters: Vec<_> = pages.into_iter().map(|p| p.results.into_iter()).collect();
    let mut results = Vec::new();
    for _ in 0..longest {
        for iter in &mut iters {
            if let Some(doc) = iter.next() {
                results.push(doc);
            }
        }
    }

    let aggregations = aggregations.map(|merged| {
        let mut buckets: Vec<AggregationBucket> = merged
            .into_iter()
            .map(|(key, count)| AggregationBucket { key, count })
            .collect();
        buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        buckets
    });

    PageResult {
        total_count,
        results,
        aggregations,
        cursor: None,
    }
}
