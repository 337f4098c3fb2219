// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM envelope encryption for cloudvault credential profiles.
//!
//! Provides the master key lifecycle, HKDF-SHA256 per-profile subkey
//! derivation, and authenticated seal/unseal of credential payloads with
//! the profile identity bound in as associated data.

pub mod crypto;
pub mod kdf;
pub mod masterkey;
pub mod prompt;
pub mod record;
pub mod vault;

pub use masterkey::MasterKeyManager;
pub use prompt::{env_or_tty, SecretSource, VAULT_SECRET_ENV_VAR};
pub use record::{SealedRecord, RECORD_VERSION};
pub use vault::Vault;
