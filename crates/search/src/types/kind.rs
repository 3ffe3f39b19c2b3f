//! Kinds, kind patterns, and index expressions.
//!
//! A [`Kind`] is the 4-part identifier `partition:source:type:version` that
//! names a document type. Each kind maps deterministically to an index name
//! (`:` replaced with `-`) and, for aliasable versions, to a short alias name.
//! A [`KindPattern`] is the ordered list of kinds a query targets, and an
//! [`IndexExpression`] is what the engine is finally asked to search.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Suffix appended to every index expression to exclude system indices.
pub const EXCLUDE_SYSTEM_INDICES: &str = "-.*";

/// Wildcard segment.
pub const WILDCARD: &str = "*";

static COMPLETE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid regex"));

static MAJOR_ONLY_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\*\.\*$").expect("valid regex"));

/// A document kind: `partition:source:type:version`.
///
/// Any segment may be `*`; the version may be partially wildcarded
/// (`1.*.*`). Case is preserved everywhere since index and alias names
/// derive from the exact spelling.
///
/// ```
/// use kindgate_search::types::Kind;
///
/// let kind = Kind::parse("opendes:wks:polylineSet:1.0.0").unwrap();
/// assert_eq!(kind.partition(), "opendes");
/// assert_eq!(kind.index_name(), "opendes-wks-polylineSet-1.0.0");
/// assert!(kind.supports_alias());
/// assert_eq!(kind.alias_name(), "a1967933616");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Kind(String);

impl Kind {
    /// Parses and validates a kind.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        let invalid = |message: &str| ValidationError::InvalidKind {
            kind: raw.to_string(),
            message: message.to_string(),
        };

        let segments: Vec<&str> = raw.split(':').collect();
        if segments.len() != 4 {
            return Err(invalid("expected 4 segments: partition:source:type:version"));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err(invalid("segments must not be empty"));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '*'))
            {
                return Err(invalid("segments may only contain [A-Za-z0-9_.-*]"));
            }
        }

        Ok(Self(raw.to_string()))
    }

    /// Returns the kind as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segment(&self, index: usize) -> &str {
        self.0.split(':').nth(index).unwrap_or_default()
    }

    /// Returns the partition segment.
    pub fn partition(&self) -> &str {
        self.segment(0)
    }

    /// Returns the source segment.
    pub fn source(&self) -> &str {
        self.segment(1)
    }

    /// Returns the entity type segment.
    pub fn entity_type(&self) -> &str {
        self.segment(2)
    }

    /// Returns the version segment.
    pub fn version(&self) -> &str {
        self.segment(3)
    }

    /// Returns a copy of this kind with the partition segment replaced.
    pub fn with_partition(&self, partition: &str) -> Kind {
        let rest = &self.0[self.partition().len()..];
        Kind(format!("{}{}", partition, rest))
    }

    /// Returns `true` when the partition segment is exactly `*`.
    pub fn has_wildcard_partition(&self) -> bool {
        self.partition() == WILDCARD
    }

    /// Returns `true` when any segment contains a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.0.contains('*')
    }

    /// Returns the raw index name: `:` replaced with `-`, case preserved.
    pub fn index_name(&self) -> String {
        self.0.replace(':', "-")
    }

    /// Returns `true` for `major.minor.patch` versions.
    pub fn is_complete_version(&self) -> bool {
        COMPLETE_VERSION.is_match(self.version())
    }

    /// Returns `true` when the kind can be served through an alias.
    ///
    /// Only complete (`1.0.0`) and major-only (`1.*.*`) versions qualify.
    pub fn supports_alias(&self) -> bool {
        let version = self.version();
        COMPLETE_VERSION.is_match(version) || MAJOR_ONLY_VERSION.is_match(version)
    }

    /// Returns the deterministic alias name for this kind.
    ///
    /// `"a"` followed by the signed 32-bit polynomial string hash
    /// (`h = 31 * h + c` over UTF-16 code units, wrapping). The value is stable
    /// across processes so every gateway replica agrees on alias names.
    pub fn alias_name(&self) -> String {
        let hash = self
            .0
            .encode_utf16()
            .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
        format!("a{}", hash)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.0)
    }
}

impl FromStr for Kind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::parse(s)
    }
}

impl TryFrom<String> for Kind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Kind::parse(&value)
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        kind.0
    }
}

/// The ordered, possibly repeating, list of kinds a query targets.
///
/// Accepts either a single comma-separated string or a list of strings when
/// deserialized.
///
/// ```
/// use kindgate_search::types::KindPattern;
///
/// let pattern = KindPattern::parse("tenant1:wks:*:*, tenant1:wks:*:*").unwrap();
/// assert_eq!(pattern.len(), 2);
/// assert!(!pattern.is_single());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "KindPatternInput", into = "Vec<String>")]
pub struct KindPattern(Vec<Kind>);

impl KindPattern {
    /// Parses a comma-separated list of kinds.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let kinds = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Kind::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_kinds(kinds).map_err(|_| ValidationError::InvalidKind {
            kind: raw.to_string(),
            message: "at least one kind is required".to_string(),
        })
    }

    /// Builds a pattern from already parsed kinds.
    pub fn from_kinds(kinds: Vec<Kind>) -> Result<Self, ValidationError> {
        if kinds.is_empty() {
            return Err(ValidationError::InvalidKind {
                kind: String::new(),
                message: "at least one kind is required".to_string(),
            });
        }
        Ok(Self(kinds))
    }

    /// Returns the kinds in caller order.
    pub fn kinds(&self) -> &[Kind] {
        &self.0
    }

    /// Returns the number of kinds, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a pattern holds at least one kind.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` when the pattern names exactly one kind.
    pub fn is_single(&self) -> bool {
        self.0.len() == 1
    }
}

impl fmt::Display for KindPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.0.iter().map(Kind::as_str).collect::<Vec<_>>().join(",");
        write!(f, "{}", joined)
    }
}

impl fmt::Debug for KindPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KindPattern").field(&self.0).finish()
    }
}

impl FromStr for KindPattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KindPattern::parse(s)
    }
}

impl From<Kind> for KindPattern {
    fn from(kind: Kind) -> Self {
        Self(vec![kind])
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KindPatternInput {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<KindPatternInput> for KindPattern {
    type Error = ValidationError;

    fn try_from(input: KindPatternInput) -> Result<Self, Self::Error> {
        match input {
            KindPatternInput::One(raw) => KindPattern::parse(&raw),
            KindPatternInput::Many(items) => KindPattern::parse(&items.join(",")),
        }
    }
}

impl From<KindPattern> for Vec<String> {
    fn from(pattern: KindPattern) -> Self {
        pattern.0.into_iter().map(String::from).collect()
    }
}

/// A comma-joined index expression ending with [`EXCLUDE_SYSTEM_INDICES`].
///
/// ```
/// use kindgate_search::types::IndexExpression;
///
/// let expr = IndexExpression::from_targets(["tenant1-wks-*-*"]);
/// assert_eq!(expr.as_str(), "tenant1-wks-*-*,-.*");
/// assert_eq!(expr.targets().collect::<Vec<_>>(), vec!["tenant1-wks-*-*"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexExpression(String);

impl IndexExpression {
    /// Joins `targets` with commas and appends the system-index exclusion.
    pub fn from_targets<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut expr = String::new();
        for target in targets {
            expr.push_str(target.as_ref());
            expr.push(',');
        }
        expr.push_str(EXCLUDE_SYSTEM_INDICES);
        Self(expr)
    }

    /// Returns the expression as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns every comma-separated part, the exclusion suffix included.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split(',')
    }

    /// Returns the search targets, without the exclusion suffix.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.parts().filter(|p| *p != EXCLUDE_SYSTEM_INDICES)
    }

    /// Returns the expression length in characters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; the exclusion suffix is always present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for IndexExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        let kind = Kind::parse("tenant1:welldb-v2:wellbore:2.0.0").unwrap();
        assert_eq!(kind.partition(), "tenant1");
        assert_eq!(kind.source(), "welldb-v2");
        assert_eq!(kind.entity_type(), "wellbore");
        assert_eq!(kind.version(), "2.0.0");
    }

    #[test]
    fn test_parse_kind_rejects_malformed() {
        for raw in ["", "a:b:c", "a:b:c:d:e", "a::c:1.0.0", "a:b c:d:1.0.0", "a:b:c:1.0.0/x"] {
            assert!(
                matches!(Kind::parse(raw), Err(ValidationError::InvalidKind { .. })),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_index_name_preserves_case() {
        let kind = Kind::parse("opendes:wks:polylineSet:1.0.0").unwrap();
        assert_eq!(kind.index_name(), "opendes-wks-polylineSet-1.0.0");
        assert_eq!(Kind::parse("*:*:*:*").unwrap().index_name(), "*-*-*-*");
    }

    #[test]
    fn test_with_partition() {
        let kind = Kind::parse("*:wks:*:*").unwrap();
        assert!(kind.has_wildcard_partition());
        let resolved = kind.with_partition("tenant1");
        assert_eq!(resolved.as_str(), "tenant1:wks:*:*");
        assert!(!resolved.has_wildcard_partition());
        assert!(!Kind::parse("ten*:wks:*:*").unwrap().has_wildcard_partition());
    }

    #[test]
    fn test_supports_alias() {
        let aliasable = ["a:b:c:1.0.0", "a:b:c:12.3.45", "a:b:c:1.*.*"];
        for raw in aliasable {
            assert!(Kind::parse(raw).unwrap().supports_alias(), "{raw}");
        }
        let not_aliasable = ["a:b:c:*", "a:b:c:2.*", "a:b:c:2.*.0", "a:b:c:2.0.*", "a:b:c:*.0.0"];
        for raw in not_aliasable {
            assert!(!Kind::parse(raw).unwrap().supports_alias(), "{raw}");
        }
        assert!(Kind::parse("a:b:c:1.0.0").unwrap().is_complete_version());
        assert!(!Kind::parse("a:b:c:1.*.*").unwrap().is_complete_version());
    }

    #[test]
    fn test_alias_name_is_java_string_hash() {
        let kind = Kind::parse("tenant1:welldb-v2:wellbore:2.0.0").unwrap();
        assert_eq!(kind.alias_name(), "a-83835110");
        let kind = Kind::parse("tenant1:wks:wellbore:1.*.*").unwrap();
        assert_eq!(kind.alias_name(), "a390210827");
    }

    #[test]
    fn test_kind_pattern_keeps_order_and_duplicates() {
        let pattern = KindPattern::parse("b:s:t:1.0.0,a:s:t:1.0.0, b:s:t:1.0.0").unwrap();
        let kinds: Vec<_> = pattern.kinds().iter().map(Kind::as_str).collect();
        assert_eq!(kinds, vec!["b:s:t:1.0.0", "a:s:t:1.0.0", "b:s:t:1.0.0"]);
        assert_eq!(pattern.to_string(), "b:s:t:1.0.0,a:s:t:1.0.0,b:s:t:1.0.0");
    }

    #[test]
    fn test_kind_pattern_rejects_empty() {
        assert!(KindPattern::parse(" , ").is_err());
        assert!(KindPattern::from_kinds(vec![]).is_err());
    }

    #[test]
    fn test_kind_pattern_deserializes_string_or_list() {
        let one: KindPattern = serde_json::from_str("\"a:b:c:1.0.0,a:b:d:1.0.0\"").unwrap();
        let many: KindPattern = serde_json::from_str("[\"a:b:c:1.0.0\", \"a:b:d:1.0.0\"]").unwrap();
        assert_eq!(one, many);
        assert!(serde_json::from_str::<KindPattern>("\"bad\"").is_err());
    }

    #[test]
    fn test_index_expression() {
        let expr = IndexExpression::from_targets(["a-b-c-1.0.0", "a-b-d-1.0.0"]);
        assert_eq!(expr.as_str(), "a-b-c-1.0.0,a-b-d-1.0.0,-.*");
        assert_eq!(expr.parts().count(), 3);
        assert_eq!(expr.targets().count(), 2);
    }
}
