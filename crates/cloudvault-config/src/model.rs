// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at load time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level cloudvault configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CloudvaultConfig {
    /// Vault storage and locking settings.
    #[serde(default)]
    pub vault: VaultConfig,
}

/// Vault storage and locking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Base directory for the vault's registry, sealed records, and
    /// master key. Defaults to `~/.cloudvault`.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// How long a mutating operation waits for the vault directory lock
    /// before failing with a retryable busy error.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

impl VaultConfig {
    /// Resolve the effective base directory: the configured path, or
    /// `~/.cloudvault` when unset.
    pub fn resolve_base_dir(&self) -> Option<PathBuf> {
        match &self.base_dir {
            Some(dir) => Some(dir.clone()),
            None => dirs::home_dir().map(|home| home.join(".cloudvault")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = CloudvaultConfig::default();
        assert!(config.vault.base_dir.is_none());
        assert_eq!(config.vault.lock_timeout_ms, 5_000);
    }

    #[test]
    fn explicit_base_dir_wins_over_home() {
        let config = VaultConfig {
            base_dir: Some(PathBuf::from("/srv/vault")),
            lock_timeout_ms: 100,
        };
        assert_eq!(config.resolve_base_dir(), Some(PathBuf::from("/srv/vault")));
    }
}
