//! Core domain model for the rainbow label-healing service.
//!
//! "Healing" is the act of recovering the plaintext label for a given
//! labelhash (the keccak256 digest of a name label). Consumers only ever
//! observe digests on-chain; this crate defines the vocabulary every other
//! crate speaks:
//!
//! - `types`: labelhash and stored-record types
//! - `labelset`: label set identifiers, versions, and client constraints
//! - `error`: the error taxonomy shared across storage, service, and transports
//! - `config`: process configuration built once at startup and passed down

pub mod config;
pub mod error;
pub mod labelset;
pub mod types;

pub use config::{Config, LoggingConfig, McpConfig, ServerConfig, StorageConfig};
pub use error::{RainbowError, RainbowResult};
pub use labelset::{ClientLabelSet, LabelSetId, LabelSetVersion};
pub use types::{LabelHash, LabelRecord, LabelSetRecord, LABELHASH_BYTES};
