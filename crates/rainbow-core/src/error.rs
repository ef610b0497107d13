//! Error taxonomy for the rainbow service.
//!
//! Every failure mode callers are expected to inspect is a distinct variant;
//! transports map variants onto their own envelopes (HTTP status codes,
//! JSON-RPC error objects). Storage-internal failures are carried opaquely in
//! [`RainbowError::Storage`] and surface to clients as a generic server error.

use thiserror::Error;

/// Top-level error type for rainbow operations.
#[derive(Debug, Error)]
pub enum RainbowError {
    /// Caller supplied a malformed labelhash. Never touches storage.
    #[error("invalid labelhash: {reason}")]
    InvalidLabelHash {
        /// Why the input was rejected.
        reason: String,
    },

    /// Caller supplied a malformed label set id or version constraint.
    #[error("invalid label set: {reason}")]
    InvalidLabelSet {
        /// Why the input was rejected.
        reason: String,
    },

    /// The on-disk store was written by an incompatible schema.
    ///
    /// Fatal at open. Requires migration or a rebuild; the code must never
    /// attempt to interpret data written by a different schema version.
    #[error("database schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Schema version the running code expects.
        expected: u32,
        /// Schema version recorded in the store.
        found: u32,
    },

    /// The store's ingestion-complete marker is unset.
    ///
    /// Fatal at startup: a crashed or never-run ingestion left the store in a
    /// state that must not be served. Re-run ingestion to completion first.
    #[error("ingestion did not run to completion; re-run ingestion before serving queries")]
    IncompleteIngestion,

    /// An ingestion attempted to record a version below the recorded highest.
    #[error(
        "non-monotonic version for label set '{label_set_id}': \
         requested {requested}, highest recorded {current}"
    )]
    NonMonotonicVersion {
        /// The label set whose version ordering was violated.
        label_set_id: String,
        /// The version the caller tried to record.
        requested: u32,
        /// The highest version currently recorded for the set.
        current: u32,
    },

    /// Opaque storage/IO failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the workspace.
pub type RainbowResult<T> = Result<T, RainbowError>;
