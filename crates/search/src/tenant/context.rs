//! Requester identity for search operations.
//!
//! This module defines [`IdentityContext`], the authenticated identity that
//! every gateway operation requires. It is populated by the auth middleware in
//! front of the gateway and carries the partitions the requester may search,
//! the data groups used for result filtering, and the user that owns any
//! cursor minted on its behalf.

use std::sync::Arc;

use super::id::PartitionId;
use crate::error::{TenantError, ValidationError};

/// The authenticated identity of a search request.
///
/// Partition order matters: the *primary* partition (first non-common id,
/// else the first id) is substituted into wildcard-partition kinds.
///
/// ```
/// use kindgate_search::tenant::{IdentityContext, PartitionId};
///
/// let identity = IdentityContext::new(
///     "user@example.com",
///     vec![PartitionId::common(), PartitionId::new("tenant1")],
/// )
/// .with_data_groups(["data.default.viewers@tenant1.example.com"]);
///
/// assert_eq!(identity.primary_partition().as_str(), "tenant1");
/// assert!(identity.check_partition("tenant1:wks:wellbore:1.0.0").is_ok());
/// assert!(identity.check_partition("tenant2:wks:wellbore:1.0.0").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct IdentityContext {
    user_id: String,
    partitions: Arc<[PartitionId]>,
    data_groups: Arc<[String]>,
    root: bool,
    correlation_id: Option<String>,
}

impl IdentityContext {
    /// Creates an identity for `user_id` scoped to `partitions`.
    ///
    /// No validation is performed; use [`IdentityContextBuilder`] for
    /// external input.
    pub fn new(user_id: impl Into<String>, partitions: Vec<PartitionId>) -> Self {
        Self {
            user_id: user_id.into(),
            partitions: partitions.into(),
            data_groups: Arc::from(Vec::new()),
            root: false,
            correlation_id: None,
        }
    }

    /// Returns a builder for validated construction.
    pub fn builder() -> IdentityContextBuilder {
        IdentityContextBuilder::new()
    }

    /// Sets the data groups used for authorization filtering.
    pub fn with_data_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the identity as root (full data access, no authorization filter).
    pub fn with_root(mut self, root: bool) -> Self {
        self.root = root;
        self
    }

    /// Sets the correlation id used in log events.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Returns the user identity.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the partitions, in header order.
    pub fn partitions(&self) -> &[PartitionId] {
        &self.partitions
    }

    /// Returns the data groups.
    pub fn data_groups(&self) -> &[String] {
        &self.data_groups
    }

    /// Returns `true` for root identities.
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Returns the correlation id, if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Returns `true` if the identity carries at least one partition.
    pub fn has_partition(&self) -> bool {
        !self.partitions.is_empty()
    }

    /// Returns the primary partition: the first non-common id, else the first id.
    ///
    /// An identity without partitions (only possible through
    /// [`IdentityContext::new`]) reports the common partition.
    pub fn primary_partition(&self) -> PartitionId {
        self.partitions
            .iter()
            .find(|p| !p.is_common())
            .or_else(|| self.partitions.first())
            .cloned()
            .unwrap_or_else(PartitionId::common)
    }

    /// Returns `true` if `partition` is one of this identity's partitions.
    pub fn owns_partition(&self, partition: &str) -> bool {
        self.partitions.iter().any(|p| p.matches(partition))
    }

    /// Returns the partitions joined by commas, as they appear in a header.
    pub fn partition_header(&self) -> String {
        self.partitions
            .iter()
            .map(PartitionId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Returns a copy of this identity scoped to a single partition.
    pub fn narrowed_to(&self, partition: &PartitionId) -> IdentityContext {
        IdentityContext {
            partitions: Arc::from(vec![partition.clone()]),
            ..self.clone()
        }
    }

    /// Checks that the partition segment of `kind` belongs to this identity.
    ///
    /// The partition is the text before the first `:`. Wildcards are not
    /// expanded here; callers substitute wildcard partitions first.
    pub fn check_partition(&self, kind: &str) -> Result<(), TenantError> {
        let partition = kind.split(':').next().unwrap_or_default();
        if self.owns_partition(partition) {
            Ok(())
        } else {
            Err(TenantError::CrossTenantSearch {
                kind: kind.to_string(),
                partitions: self.partition_header(),
            })
        }
    }
}

/// Builder for identities constructed from request headers.
#[derive(Debug, Default)]
pub struct IdentityContextBuilder {
    user_id: Option<String>,
    partitions: Vec<PartitionId>,
    data_groups: Vec<String>,
    root: bool,
    correlation_id: Option<String>,
}

impl IdentityContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the user identity.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Appends a partition.
    pub fn partition(mut self, partition: impl Into<PartitionId>) -> Self {
        self.partitions.push(partition.into());
        self
    }

    /// Appends partitions from a comma-separated header value.
    pub fn partition_header(mut self, header: &str) -> Self {
        self.partitions.extend(PartitionId::parse_list(header));
        self
    }

    /// Appends a data group.
    pub fn data_group(mut self, group: impl Into<String>) -> Self {
        self.data_groups.push(group.into());
        self
    }

    /// Sets the root flag.
    pub fn root(mut self, root: bool) -> Self {
        self.root = root;
        self
    }

    /// Sets the correlation id.
    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Builds the identity, failing when the user or partitions are missing.
    pub fn build(self) -> Result<IdentityContext, ValidationError> {
        let user_id = self
            .user_id
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ValidationError::MissingRequiredField {
                field: "user_id".to_string(),
            })?;

        if self.partitions.is_empty() {
            return Err(ValidationError::MissingPartition);
        }

        let mut identity = IdentityContext::new(user_id, self.partitions)
            .with_data_groups(self.data_groups)
            .with_root(self.root);
        identity.correlation_id = self.correlation_id;

        Ok(identity)
    }
}
