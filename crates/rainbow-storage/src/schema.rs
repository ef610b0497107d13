//! On-disk schema: version constant, metadata keys, and record encoding.
//!
//! The schema version is the compatibility tag between the running code and
//! the on-disk format. It is written exactly once, when the database is
//! created, and compared on every subsequent open; interpretation of data
//! written by any other version is forbidden.

use rainbow_core::{LabelRecord, LabelSetRecord};

use crate::db::StorageError;

/// Schema version this build reads and writes.
///
/// Bump on any change to key layout, record encoding, or metadata semantics.
pub const DB_SCHEMA_VERSION: u32 = 3;

// =============================================================================
// META COLUMN FAMILY KEYS
// =============================================================================

/// Key for the persisted schema version (u32, big-endian).
pub const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Key for the ingestion-complete marker (single byte, 0 or 1).
pub const INGESTION_COMPLETE_KEY: &[u8] = b"ingestion_complete";

/// Key for the persisted count of distinct healed hashes (u64, big-endian).
pub const LABEL_COUNT_KEY: &[u8] = b"label_count";

// =============================================================================
// SCALAR ENCODING
// =============================================================================

/// Encode a u32 metadata scalar as big-endian bytes.
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Decode a u32 metadata scalar.
///
/// # Errors
///
/// Returns [`StorageError::Corruption`] if the value is not exactly 4 bytes.
pub fn decode_u32(bytes: &[u8]) -> Result<u32, StorageError> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| StorageError::Corruption {
        what: format!("u32 metadata value must be 4 bytes, got {}", bytes.len()),
    })?;
    Ok(u32::from_be_bytes(arr))
}

/// Encode a u64 metadata scalar as big-endian bytes.
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode a u64 metadata scalar.
///
/// # Errors
///
/// Returns [`StorageError::Corruption`] if the value is not exactly 8 bytes.
pub fn decode_u64(bytes: &[u8]) -> Result<u64, StorageError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| StorageError::Corruption {
        what: format!("u64 metadata value must be 8 bytes, got {}", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(arr))
}

// =============================================================================
// RECORD ENCODING (bincode: fixed-layout types)
// =============================================================================

/// Serialize a label record for the hash index.
pub fn encode_label_record(record: &LabelRecord) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(record).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Deserialize a label record from the hash index.
pub fn decode_label_record(bytes: &[u8]) -> Result<LabelRecord, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Serialize a registry record.
pub fn encode_label_set_record(record: &LabelSetRecord) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(record).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Deserialize a registry record.
pub fn decode_label_set_record(bytes: &[u8]) -> Result<LabelSetRecord, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}
