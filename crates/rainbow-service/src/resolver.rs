//! Constraint-checking heal resolution.
//!
//! This is the crux of reproducibility: a client that always supplies the
//! same label-set constraint gets stable answers even while the server keeps
//! ingesting newer label sets and versions in the background.

use rainbow_core::{ClientLabelSet, LabelRecord};

/// Outcome of resolving a well-formed labelhash against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealOutcome {
    /// The hash is healed and the constraint (if any) is satisfied.
    Healed(String),
    /// No satisfying entry for this (hash, constraint) pair. The hash may
    /// still be healed under a different set or version.
    NotFound,
}

/// Resolve a looked-up record against an optional client constraint.
///
/// Unconstrained queries return the label unconditionally: the server's
/// current best-known answer, from whichever set first healed the hash.
///
/// A constrained query is satisfied only if the record's origin set matches
/// the requested id (when given) and the requested version (when given) is at
/// least the record's origin version: later versions of a set are supersets
/// of earlier ones, so any version >= the origin still contains the entry,
/// while any earlier version predates it.
pub fn resolve(record: Option<LabelRecord>, constraint: &ClientLabelSet) -> HealOutcome {
    let Some(record) = record else {
        return HealOutcome::NotFound;
    };

    if let Some(requested_id) = constraint.id() {
        if requested_id.as_str() != record.label_set_id {
            return HealOutcome::NotFound;
        }
    }
    if let Some(requested_version) = constraint.version() {
        if requested_version < record.label_set_version {
            return HealOutcome::NotFound;
        }
    }

    HealOutcome::Healed(record.label)
}
