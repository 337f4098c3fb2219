// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HKDF-SHA256 per-profile subkey derivation.
//!
//! Every profile's credentials are sealed under a subkey derived from the
//! master key with the canonical `provider:name` string as the expansion
//! context. Compromise of one derived key (e.g. through nonce reuse
//! elsewhere) does not expose any other profile's key.

use cloudvault_core::VaultError;
use ring::hkdf;
use zeroize::Zeroizing;

/// Domain-separation salt for the HKDF extract step. Changing this value
/// invalidates every existing sealed record.
const HKDF_SALT: &[u8] = b"cloudvault/profile-key/v1";

struct KeyLen;

impl hkdf::KeyType for KeyLen {
    fn len(&self) -> usize {
        32
    }
}

/// Derive the 32-byte subkey for one profile from the master key.
///
/// `context` is the canonical `provider:name` string. The returned key is
/// wrapped in [`Zeroizing`] for automatic memory zeroing on drop.
pub fn derive_profile_key(
    master_key: &[u8; 32],
    context: &str,
) -> Result<Zeroizing<[u8; 32]>, VaultError> {
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, HKDF_SALT);
    let prk = salt.extract(master_key);
    let info = [context.as_bytes()];
    let okm = prk
        .expand(&info, KeyLen)
        .map_err(|_| VaultError::crypto(context, "HKDF expansion failed"))?;

    let mut key = Zeroizing::new([0u8; 32]);
    okm.fill(key.as_mut())
        .map_err(|_| VaultError::crypto(context, "HKDF output fill failed"))?;

    Ok(key)
}
