//! Partition identifier type.
//!
//! This module defines [`PartitionId`], the opaque identifier of a data
//! partition (tenant). Partition ids appear as the first segment of every
//! [`Kind`](crate::types::Kind) and as the prefix of every index name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The shared partition every deployment carries alongside tenant partitions.
pub const COMMON_PARTITION: &str = "common";

/// An opaque partition identifier.
///
/// The original spelling is preserved (it becomes part of index names), but
/// equality and hashing ignore ASCII case, matching how partition headers are
/// compared against kinds.
///
/// # Examples
///
/// ```
/// use kindgate_search::tenant::PartitionId;
///
/// let partition = PartitionId::new("Tenant1");
/// assert_eq!(partition.as_str(), "Tenant1");
/// assert!(partition.matches("tenant1"));
/// assert_eq!(partition, PartitionId::new("TENANT1"));
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(String);

impl PartitionId {
    /// Creates a new partition id. Surrounding whitespace is trimmed.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.len() == id.len() {
            Self(id)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Returns the shared "common" partition.
    pub fn common() -> Self {
        Self(COMMON_PARTITION.to_string())
    }

    /// Returns the partition id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is the shared "common" partition.
    pub fn is_common(&self) -> bool {
        self.matches(COMMON_PARTITION)
    }

    /// Returns `true` if `other` names this partition, ignoring ASCII case.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Parses a comma-separated partition header such as `"tenant1, common"`.
    ///
    /// Empty items are dropped; order is preserved.
    ///
    /// ```
    /// use kindgate_search::tenant::PartitionId;
    ///
    /// let ids = PartitionId::parse_list("tenant1, common,,");
    /// assert_eq!(ids.len(), 2);
    /// assert!(ids[1].is_common());
    /// ```
    pub fn parse_list(header: &str) -> Vec<PartitionId> {
        header
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PartitionId::new)
            .collect()
    }
}

impl PartialEq for PartitionId {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for PartitionId {}

impl Hash for PartitionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartitionId({})", self.0)
    }
}

impl FromStr for PartitionId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PartitionId::new(s))
    }
}

impl From<&str> for PartitionId {
    fn from(s: &str) -> Self {
        PartitionId::new(s)
    }
}

impl From<String> for PartitionId {
    fn from(s: String) -> Self {
        PartitionId::new(s)
    }
}

impl AsRef<str> for PartitionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
