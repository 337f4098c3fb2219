// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seal and unseal credential payloads under per-profile derived keys.
//!
//! The vault uses envelope encryption:
//! - A 256-bit master key is generated once and kept on disk with
//!   owner-only permissions.
//! - Each profile's credentials are sealed under a subkey derived from
//!   the master key via HKDF-SHA256 with `provider:name` as context.
//! - The same `provider:name` string is bound in as AEAD associated
//!   data, so a sealed record cannot be replayed under another identity.

use cloudvault_core::{Credentials, ProfileRef, VaultError};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto;
use crate::kdf;
use crate::record::{SealedRecord, RECORD_VERSION};

/// The unlocked vault, holding the master key in memory.
///
/// Debug output intentionally omits the master key.
pub struct Vault {
    /// Only in memory, never exposed; zeroed on drop.
    master_key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("master_key", &"[REDACTED]")
            .finish()
    }
}

impl Vault {
    pub fn new(master_key: Zeroizing<[u8; 32]>) -> Self {
        Self { master_key }
    }

    /// Encrypt credentials for one profile identity.
    ///
    /// The caller is expected to have validated `credentials` already;
    /// the vault only enforces the identity binding.
    pub fn seal(
        &self,
        profile_ref: &ProfileRef,
        credentials: &Credentials,
    ) -> Result<SealedRecord, VaultError> {
        let context = profile_ref.context();
        let subkey = kdf::derive_profile_key(&self.master_key, &context)?;

        let plaintext = Zeroizing::new(credentials.to_canonical_json()?);
        let (ciphertext, nonce) = crypto::seal_with_aad(&subkey, &context, &plaintext)?;

        debug!(profile = %profile_ref, "credentials sealed");
        Ok(SealedRecord {
            version: RECORD_VERSION,
            context,
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    /// Decrypt a sealed record for one profile identity.
    ///
    /// Fails with a crypto error when the authentication tag is invalid
    /// or when `profile_ref` differs from the identity embedded at seal
    /// time -- the defense against a record copied or renamed to
    /// masquerade as a different profile.
    pub fn unseal(
        &self,
        profile_ref: &ProfileRef,
        record: &SealedRecord,
    ) -> Result<Credentials, VaultError> {
        let context = profile_ref.context();
        if record.context != context {
            return Err(VaultError::crypto(
                &context,
                format!("sealed record belongs to '{}'", record.context),
            ));
        }

        let subkey = kdf::derive_profile_key(&self.master_key, &context)?;
        let nonce = record.nonce_array()?;
        let plaintext = Zeroizing::new(crypto::open_with_aad(
            &subkey,
            &context,
            &nonce,
            &record.ciphertext,
        )?);

        let credentials = Credentials::from_canonical_json(&plaintext)?;
        debug!(profile = %profile_ref, "credentials unsealed");
        Ok(credentials)
    }
}
