// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./cloudvault.toml` >
//! `~/.config/cloudvault/cloudvault.toml` > `/etc/cloudvault/cloudvault.toml`
//! with environment variable overrides via the `CLOUDVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CloudvaultConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/cloudvault/cloudvault.toml` (system-wide)
/// 3. `~/.config/cloudvault/cloudvault.toml` (user XDG config)
/// 4. `./cloudvault.toml` (local directory)
/// 5. `CLOUDVAULT_*` environment variables
pub fn load_config() -> Result<CloudvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CloudvaultConfig::default()))
        .merge(Toml::file("/etc/cloudvault/cloudvault.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("cloudvault/cloudvault.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("cloudvault.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Useful for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CloudvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CloudvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CloudvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CloudvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that key names
/// containing underscores stay intact: `CLOUDVAULT_VAULT_LOCK_TIMEOUT_MS`
/// must map to `vault.lock_timeout_ms`, not `vault.lock.timeout.ms`.
fn env_provider() -> Env {
    Env::prefixed("CLOUDVAULT_").map(|key| {
        // Keys arrive in their original (upper) case.
        let key_str = key.as_str().to_ascii_lowercase();
        key_str.replacen("vault_", "vault.", 1).into()
    })
}
