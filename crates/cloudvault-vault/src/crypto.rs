// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open with associated data.
//!
//! Every call to [`seal_with_aad`] generates a fresh random 96-bit nonce
//! via the system CSPRNG. Nonce reuse would be catastrophic for GCM
//! security. The associated data (the canonical `provider:name` string)
//! is bound into the authentication tag, so a ciphertext copied to a
//! different profile identity fails to open.

use cloudvault_core::VaultError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

/// Encrypt plaintext with AES-256-GCM under the given key, binding `aad`
/// into the authentication tag.
///
/// Returns `(ciphertext_with_tag, nonce_bytes)`. The caller must store
/// both alongside the associated data to be able to decrypt later.
pub fn seal_with_aad(
    key: &[u8; 32],
    aad: &str,
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; 12]), VaultError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| VaultError::crypto(aad, "failed to create AES-256-GCM key"))?;
    let less_safe = LessSafeKey::new(unbound);

    // Generate random 96-bit nonce.
    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; 12];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| VaultError::crypto(aad, "failed to generate random nonce"))?;

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // Seal in place: plaintext buffer is extended with the authentication tag.
    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, Aad::from(aad.as_bytes()), &mut in_out)
        .map_err(|_| VaultError::crypto(aad, "AES-256-GCM encryption failed"))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt ciphertext with AES-256-GCM, verifying the tag against `aad`.
///
/// `ciphertext` must include the 16-byte authentication tag appended by
/// [`seal_with_aad`]. Fails if the key is wrong, the data is tampered,
/// or the associated data differs from what was bound at seal time.
pub fn open_with_aad(
    key: &[u8; 32],
    aad: &str,
    nonce_bytes: &[u8; 12],
    ciphertext: &[u8],
) -> Result<Vec<u8>, VaultError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| VaultError::crypto(aad, "failed to create AES-256-GCM key"))?;
    let less_safe = LessSafeKey::new(unbound);

    let nonce = Nonce::assume_unique_for_key(*nonce_bytes);

    let mut in_out = ciphertext.to_vec();
    let plaintext = less_safe
        .open_in_place(nonce, Aad::from(aad.as_bytes()), &mut in_out)
        .map_err(|_| {
            VaultError::crypto(
                aad,
                "authentication failed -- wrong key, tampered data, or mismatched profile identity",
            )
        })?;

    Ok(plaintext.to_vec())
}

/// Generate a random 32-byte key suitable for AES-256-GCM.
pub fn generate_random_key() -> Result<[u8; 32], VaultError> {
    let rng = SystemRandom::new();
    let mut key = [0u8; 32];
    rng.fill(&mut key)
        .map_err(|_| VaultError::Internal("failed to generate random key".to_string()))?;
    Ok(key)
}
