//! Label set identifiers, versions, and client-side constraints.
//!
//! A label set is a named, versioned corpus of known label preimages. Versions
//! are append-only: version N is a superset of version N-1 for the same set.
//! Clients may pin queries to a `(set, version)` pair to get reproducible
//! answers while the server keeps ingesting newer data.

use std::fmt;

use crate::error::{RainbowError, RainbowResult};

/// Non-negative, monotonically increasing per-set version number.
pub type LabelSetVersion = u32;

/// Maximum length of a label set identifier.
const LABEL_SET_ID_MAX_LEN: usize = 50;

/// Validated identifier of a label corpus: 1-50 chars of `[a-z0-9-]`.
///
/// Stable for the lifetime of a deployment; used verbatim as a registry key.
/// Construction is the only way in, so an invalid id is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSetId(String);

impl LabelSetId {
    /// Validate and wrap a label set identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RainbowError::InvalidLabelSet`] if the input is empty,
    /// longer than 50 characters, or contains anything outside `[a-z0-9-]`.
    pub fn new(id: impl Into<String>) -> RainbowResult<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > LABEL_SET_ID_MAX_LEN {
            return Err(RainbowError::InvalidLabelSet {
                reason: format!(
                    "label set id must be 1-{} characters, got {}",
                    LABEL_SET_ID_MAX_LEN,
                    id.len()
                ),
            });
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(RainbowError::InvalidLabelSet {
                reason: format!(
                    "label set id '{}' may only contain lowercase letters, digits, and hyphens",
                    id
                ),
            });
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a label set version supplied as a string (the wire form used by
/// tool-call arguments and query parameters).
pub fn parse_label_set_version(input: &str) -> RainbowResult<LabelSetVersion> {
    input
        .parse::<u32>()
        .map_err(|_| RainbowError::InvalidLabelSet {
            reason: format!(
                "label set version must be a non-negative integer, got '{}'",
                input
            ),
        })
}

/// Optional query-time constraint pinning answers to a reproducible snapshot.
///
/// Constructed through [`ClientLabelSet::new`], which rejects the one invalid
/// combination: a version without a set id (a bare version is meaningless).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientLabelSet {
    label_set_id: Option<LabelSetId>,
    label_set_version: Option<LabelSetVersion>,
}

impl ClientLabelSet {
    /// No constraint: the server answers from its current best-known data.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// Build a constraint from optional parts.
    ///
    /// # Errors
    ///
    /// Returns [`RainbowError::InvalidLabelSet`] if a version is supplied
    /// without a set id.
    pub fn new(
        label_set_id: Option<LabelSetId>,
        label_set_version: Option<LabelSetVersion>,
    ) -> RainbowResult<Self> {
        if label_set_version.is_some() && label_set_id.is_none() {
            return Err(RainbowError::InvalidLabelSet {
                reason: "label set version requires a label set id".to_string(),
            });
        }
        Ok(Self {
            label_set_id,
            label_set_version,
        })
    }

    /// Parse a constraint from wire strings, validating both parts.
    pub fn from_wire(id: Option<&str>, version: Option<&str>) -> RainbowResult<Self> {
        let id = id.map(LabelSetId::new).transpose()?;
        let version = version.map(parse_label_set_version).transpose()?;
        Self::new(id, version)
    }

    /// The requested set id, if any.
    pub fn id(&self) -> Option<&LabelSetId> {
        self.label_set_id.as_ref()
    }

    /// The requested version, if any.
    pub fn version(&self) -> Option<LabelSetVersion> {
        self.label_set_version
    }

    /// True when no constraint parts were supplied.
    pub fn is_unconstrained(&self) -> bool {
        self.label_set_id.is_none() && self.label_set_version.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_ids() {
        for id in ["demo", "subgraph", "ens-test-env-1", "0x-labels"] {
            assert!(LabelSetId::new(id).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_invalid_ids() {
        assert!(LabelSetId::new("").is_err());
        assert!(LabelSetId::new("Demo").is_err());
        assert!(LabelSetId::new("has space").is_err());
        assert!(LabelSetId::new("under_score").is_err());
        assert!(LabelSetId::new("x".repeat(51)).is_err());
    }

    #[test]
    fn version_parses_from_wire_strings() {
        assert_eq!(parse_label_set_version("0").unwrap(), 0);
        assert_eq!(parse_label_set_version("42").unwrap(), 42);
        assert!(parse_label_set_version("-1").is_err());
        assert!(parse_label_set_version("1.5").is_err());
        assert!(parse_label_set_version("latest").is_err());
    }

    #[test]
    fn version_without_id_is_rejected() {
        let err = ClientLabelSet::new(None, Some(1)).unwrap_err();
        assert!(matches!(err, RainbowError::InvalidLabelSet { .. }));
    }

    #[test]
    fn from_wire_builds_full_constraint() {
        let set = ClientLabelSet::from_wire(Some("demo"), Some("3")).unwrap();
        assert_eq!(set.id().unwrap().as_str(), "demo");
        assert_eq!(set.version(), Some(3));
        assert!(!set.is_unconstrained());
    }

    #[test]
    fn from_wire_empty_is_unconstrained() {
        let set = ClientLabelSet::from_wire(None, None).unwrap();
        assert!(set.is_unconstrained());
    }
}
