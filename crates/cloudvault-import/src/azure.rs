// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Azure import: reads a service-principal descriptor file (the
//! `az ad sp create-for-rbac --sdk-auth` format).
//!
//! Interactive `az login` session tokens cannot be migrated, so the
//! adapter requires a service-principal file. `list_sources` enumerates
//! subscriptions from the local CLI state for orientation only.

use std::fs;
use std::path::PathBuf;

use cloudvault_core::{AzureCredentials, Credentials, Profile, Provider, VaultError};
use serde::Deserialize;
use tracing::debug;

use crate::{ImportAdapter, ImportOptions, SourceDescriptor};

pub struct AzureImporter {
    home_dir: PathBuf,
}

/// `--sdk-auth` service-principal descriptor fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicePrincipalFile {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    tenant_id: String,
    #[serde(default)]
    subscription_id: String,
}

/// Subset of `~/.azure/azureProfile.json`.
#[derive(Debug, Deserialize)]
struct AzureProfileFile {
    #[serde(default)]
    subscriptions: Vec<AzureSubscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureSubscription {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_default: bool,
}

impl AzureImporter {
    pub fn new(home_dir: PathBuf) -> Self {
        Self { home_dir }
    }

    fn azure_dir(&self) -> PathBuf {
        self.home_dir.join(".azure")
    }

    /// Conventional service-principal descriptor locations.
    fn candidate_sp_paths(&self) -> [PathBuf; 2] {
        [
            self.azure_dir().join("service_principal.json"),
            self.azure_dir().join("sp.json"),
        ]
    }
}

impl ImportAdapter for AzureImporter {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    /// Subscriptions known to the local Azure CLI. Informational only:
    /// these entries carry no importable secret.
    fn list_sources(&self) -> Result<Vec<SourceDescriptor>, VaultError> {
        let path = self.azure_dir().join("azureProfile.json");
        let data = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VaultError::ImportSource(format!(
                    "Azure profile not found: {} (run 'az login' first)",
                    path.display()
                ))
            } else {
                VaultError::ImportSource(format!("reading {}: {e}", path.display()))
            }
        })?;
        // The CLI writes the file with a UTF-8 BOM.
        let data = data.trim_start_matches('\u{feff}');

        let parsed: AzureProfileFile = serde_json::from_str(data)
            .map_err(|e| VaultError::ImportSource(format!("parsing Azure profile: {e}")))?;

        Ok(parsed
            .subscriptions
            .into_iter()
            .map(|sub| SourceDescriptor {
                id: sub.id,
                detail: if sub.is_default {
                    format!("{} (default)", sub.name)
                } else {
                    sub.name
                },
            })
            .collect())
    }

    fn import(&self, opts: &ImportOptions) -> Result<(Profile, Credentials), VaultError> {
        let sp_path = match &opts.source {
            Some(path) => PathBuf::from(path),
            None => self
                .candidate_sp_paths()
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| {
                    VaultError::ImportSource(
                        "no service principal file found; Azure CLI session tokens cannot be \
                         migrated. Create one with: az ad sp create-for-rbac --sdk-auth"
                            .to_string(),
                    )
                })?,
        };

        let data = fs::read_to_string(&sp_path).map_err(|e| {
            VaultError::ImportSource(format!(
                "reading service principal file {}: {e}",
                sp_path.display()
            ))
        })?;
        let sp: ServicePrincipalFile = serde_json::from_str(&data)
            .map_err(|e| VaultError::ImportSource(format!("parsing service principal: {e}")))?;

        if sp.client_id.is_empty() || sp.client_secret.is_empty() {
            return Err(VaultError::ImportSource(format!(
                "invalid service principal file {}: missing clientId or clientSecret",
                sp_path.display()
            )));
        }

        let target_name = opts.target_name.as_deref().unwrap_or("default");
        let mut profile = Profile::new(target_name, Provider::Azure);
        profile.account_id = sp.subscription_id.clone();
        profile.default = opts.set_default;

        let credentials = Credentials::Azure(AzureCredentials {
            tenant_id: sp.tenant_id,
            client_id: sp.client_id,
            client_secret: sp.client_secret,
            subscription_id: sp.subscription_id,
        });
        credentials.validate()?;
        debug!(target = %target_name, "Azure service principal imported");
        Ok((profile, credentials))
    }
}
