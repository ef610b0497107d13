//! Wire envelopes shared by every transport.
//!
//! Each response is a closed set of tagged variants: a variant carries
//! exactly the fields valid for its state, so a success body can never be
//! half-populated with error fields or vice versa. `errorCode` doubles as
//! the HTTP status for the HTTP adapter.

use serde::{Deserialize, Serialize};

/// Status codes carried in response envelopes (and reused as HTTP statuses).
pub mod error_codes {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const SERVER_ERROR: u16 = 503;
}

/// Result of a heal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealResponse {
    Success {
        /// The healed plaintext label.
        label: String,
        #[serde(rename = "errorCode")]
        error_code: u16,
    },
    Error {
        /// Human-readable reason.
        error: String,
        #[serde(rename = "errorCode")]
        error_code: u16,
    },
}

impl HealResponse {
    /// The hash is healed and (if constrained) the constraint is satisfied.
    pub fn healed(label: String) -> Self {
        Self::Success {
            label,
            error_code: error_codes::OK,
        }
    }

    /// Malformed input; no lookup was performed.
    pub fn bad_request(error: String) -> Self {
        Self::Error {
            error,
            error_code: error_codes::BAD_REQUEST,
        }
    }

    /// No satisfying entry, absolutely or relative to the constraint.
    pub fn not_found() -> Self {
        Self::Error {
            error: "Label not found".to_string(),
            error_code: error_codes::NOT_FOUND,
        }
    }

    /// Opaque storage failure.
    pub fn server_error() -> Self {
        Self::Error {
            error: "Internal server error".to_string(),
            error_code: error_codes::SERVER_ERROR,
        }
    }

    /// The `errorCode` field, for transports that map it onto their own
    /// status mechanism.
    pub fn error_code(&self) -> u16 {
        match self {
            Self::Success { error_code, .. } | Self::Error { error_code, .. } => *error_code,
        }
    }
}

/// Result of a label-count request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CountResponse {
    Success {
        /// Number of distinct healed hashes.
        count: u64,
        #[serde(rename = "errorCode")]
        error_code: u16,
    },
    Error {
        error: String,
        #[serde(rename = "errorCode")]
        error_code: u16,
    },
}

impl CountResponse {
    pub fn counted(count: u64) -> Self {
        Self::Success {
            count,
            error_code: error_codes::OK,
        }
    }

    pub fn server_error() -> Self {
        Self::Error {
            error: "Internal server error".to_string(),
            error_code: error_codes::SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> u16 {
        match self {
            Self::Success { error_code, .. } | Self::Error { error_code, .. } => *error_code,
        }
    }
}

/// One label set as known to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSetSummary {
    #[serde(rename = "labelSetId")]
    pub label_set_id: String,
    #[serde(rename = "highestLabelSetVersion")]
    pub highest_label_set_version: u32,
}

/// Version information for the running server and its store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Server version.
    pub version: String,
    /// Schema version of the opened store.
    #[serde(rename = "dbSchemaVersion")]
    pub db_schema_version: u32,
    /// Highest known version per label set.
    #[serde(rename = "labelSet")]
    pub label_set: Vec<LabelSetSummary>,
}

/// Envelope for the version operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub status: String,
    #[serde(rename = "versionInfo")]
    pub version_info: VersionInfo,
}

impl VersionResponse {
    pub fn new(version_info: VersionInfo) -> Self {
        Self {
            status: "success".to_string(),
            version_info,
        }
    }
}

/// Liveness envelope. Always ok once the process accepts traffic; readiness
/// is the startup ingestion-complete gate, not a per-request check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
