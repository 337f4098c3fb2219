// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persisted, encrypted form of a profile's credentials.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cloudvault_core::VaultError;
use serde::{Deserialize, Serialize};

/// Current sealed-record format version.
pub const RECORD_VERSION: u32 = 1;

/// A sealed credential payload as written to the record store.
///
/// `context` records the `provider:name` identity the record was sealed
/// under; it doubles as the HKDF derivation context and the AEAD
/// associated data, so the record only opens for that exact identity.
/// The ciphertext includes the 16-byte GCM tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SealedRecord {
    pub version: u32,
    pub context: String,
    #[serde(with = "b64")]
    pub nonce: Vec<u8>,
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,
}

impl SealedRecord {
    /// Encode for storage. The output contains no plaintext secret.
    pub fn to_json(&self) -> Result<Vec<u8>, VaultError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| VaultError::storage("encoding sealed record", e))
    }

    /// Decode a record read from the store.
    pub fn from_json(bytes: &[u8]) -> Result<Self, VaultError> {
        let record: SealedRecord = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::storage("parsing sealed record", e))?;
        if record.version > RECORD_VERSION {
            return Err(VaultError::Storage(format!(
                "sealed record version {} is newer than supported version {RECORD_VERSION}",
                record.version
            )));
        }
        Ok(record)
    }

    /// The fixed-size nonce, or an error if the stored bytes are corrupt.
    pub fn nonce_array(&self) -> Result<[u8; 12], VaultError> {
        self.nonce
            .as_slice()
            .try_into()
            .map_err(|_| VaultError::storage("sealed record", "corrupted nonce (expected 12 bytes)"))
    }
}

/// Base64 (de)serialization for binary fields inside the JSON encoding.
mod b64 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s).map_err(serde::de::Error::custom)
    }
}
