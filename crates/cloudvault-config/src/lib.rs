// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the cloudvault credential vault.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{CloudvaultConfig, VaultConfig};

use cloudvault_core::VaultError;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<CloudvaultConfig, VaultError> {
    let config = loader::load_config().map_err(|e| VaultError::Config(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<CloudvaultConfig, VaultError> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| VaultError::Config(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Semantic constraints that cannot be expressed via serde attributes.
pub fn validate_config(config: &CloudvaultConfig) -> Result<(), VaultError> {
    if config.vault.lock_timeout_ms == 0 {
        return Err(VaultError::Config(
            "vault.lock_timeout_ms must be greater than zero".to_string(),
        ));
    }
    if let Some(dir) = &config.vault.base_dir
        && dir.as_os_str().is_empty()
    {
        return Err(VaultError::Config(
            "vault.base_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}
