// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the cloudvault credential vault.

use std::time::Duration;

use thiserror::Error;

use crate::provider::Provider;

/// The primary error type used across all cloudvault crates.
///
/// Error messages identify the profile or provider involved but never
/// contain secret material.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Malformed or missing required credential/profile fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// No such profile for the given provider.
    #[error("profile not found: {provider}/{name}")]
    NotFound { provider: Provider, name: String },

    /// A profile with this name already exists for the provider.
    #[error("profile already exists: {provider}/{name}")]
    Conflict { provider: Provider, name: String },

    /// Seal/unseal authentication failure. Fatal for the current
    /// operation; the vault is never auto-repaired.
    #[error("crypto error for {context}: {message}")]
    Crypto { context: String, message: String },

    /// The vault directory lock could not be acquired in time. Retryable.
    #[error("vault busy: could not acquire lock within {timeout:?}")]
    LockTimeout { timeout: Duration },

    /// An external credential source was unreadable or malformed.
    #[error("import source error: {0}")]
    ImportSource(String),

    /// Filesystem or serialization failure in the vault's storage layer.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration errors (invalid TOML, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Convenience constructor for crypto failures bound to a profile context.
    pub fn crypto(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Crypto {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for storage failures, naming the operation.
    pub fn storage(what: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{what}: {err}"))
    }

    /// Whether the caller may retry the operation (possibly with backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_timeout_is_retryable() {
        let err = VaultError::LockTimeout {
            timeout: Duration::from_secs(5),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn other_errors_are_not_retryable() {
        assert!(!VaultError::Validation("x".into()).is_retryable());
        assert!(
            !VaultError::NotFound {
                provider: Provider::Aws,
                name: "p".into()
            }
            .is_retryable()
        );
        assert!(!VaultError::crypto("aws:p", "tag mismatch").is_retryable());
    }

    #[test]
    fn not_found_names_the_profile() {
        let err = VaultError::NotFound {
            provider: Provider::Gcp,
            name: "svc".into(),
        };
        assert_eq!(err.to_string(), "profile not found: gcp/svc");
    }

    #[test]
    fn conflict_names_the_profile() {
        let err = VaultError::Conflict {
            provider: Provider::Aws,
            name: "prod".into(),
        };
        assert!(err.to_string().contains("aws/prod"));
    }
}
