//! Labelhash and stored-record types.
//!
//! A labelhash is the keccak256 digest of a name label. It is the only key
//! shape the service supports: exactly 32 bytes, rendered on the wire as a
//! `0x`-prefixed 64-character hex string.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::{RainbowError, RainbowResult};

/// Byte length of a keccak256 digest.
pub const LABELHASH_BYTES: usize = 32;

/// Hex string length of a labelhash including the `0x` prefix.
const LABELHASH_HEX_LEN: usize = 2 + LABELHASH_BYTES * 2;

/// A keccak256 digest of a name label. Primary key of the hash index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelHash([u8; LABELHASH_BYTES]);

impl LabelHash {
    /// Compute the labelhash of a plaintext label.
    pub fn from_label(label: &str) -> Self {
        let digest = Keccak256::digest(label.as_bytes());
        let mut bytes = [0u8; LABELHASH_BYTES];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Parse a wire-format labelhash: `0x` + 64 hex chars, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`RainbowError::InvalidLabelHash`] for any malformed input.
    /// Parsing never performs a storage lookup.
    pub fn from_hex(input: &str) -> RainbowResult<Self> {
        let Some(body) = input.strip_prefix("0x") else {
            return Err(RainbowError::InvalidLabelHash {
                reason: "missing 0x prefix".to_string(),
            });
        };
        if input.len() != LABELHASH_HEX_LEN {
            return Err(RainbowError::InvalidLabelHash {
                reason: format!(
                    "expected {} hex characters, got {}",
                    LABELHASH_BYTES * 2,
                    body.len()
                ),
            });
        }
        let mut bytes = [0u8; LABELHASH_BYTES];
        hex::decode_to_slice(body, &mut bytes).map_err(|_| RainbowError::InvalidLabelHash {
            reason: "not a valid hex string".to_string(),
        })?;
        Ok(Self(bytes))
    }

    /// Reconstruct a labelhash from raw stored key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RainbowError::InvalidLabelHash`] if the slice is not exactly
    /// 32 bytes. Stored keys always are; anything else indicates corruption.
    pub fn from_bytes(bytes: &[u8]) -> RainbowResult<Self> {
        let arr: [u8; LABELHASH_BYTES] =
            bytes
                .try_into()
                .map_err(|_| RainbowError::InvalidLabelHash {
                    reason: format!("expected {} bytes, got {}", LABELHASH_BYTES, bytes.len()),
                })?;
        Ok(Self(arr))
    }

    /// Raw digest bytes, used as the storage key.
    pub fn as_bytes(&self) -> &[u8; LABELHASH_BYTES] {
        &self.0
    }

    /// Wire encoding: `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for LabelHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for LabelHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelHash({})", self.to_hex())
    }
}

/// Stored value of the hash index: the healed label plus the label set and
/// version that first contributed it ("origin").
///
/// First writer wins: once a hash is healed, its record is never overwritten,
/// and the origin is what client label-set constraints are checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// The plaintext preimage of the hash.
    pub label: String,
    /// Label set that first healed this hash.
    pub label_set_id: String,
    /// Version of that set at which the hash was first healed.
    pub label_set_version: u32,
}

/// Stored value of the label-set registry: one record per label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSetRecord {
    /// Highest version ever recorded for this set. Versions are append-only
    /// supersets, so this is also the most complete snapshot the server holds.
    pub highest_version: u32,
}
