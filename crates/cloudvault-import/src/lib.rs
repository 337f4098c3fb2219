// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Import adapters: translate a provider's native local credential
//! source into the internal profile + credentials model.
//!
//! One adapter per provider, behind the [`ImportAdapter`] trait. Every
//! adapter re-validates its result through the credential model before
//! it reaches the service, and never writes anything -- the sources are
//! read-only.

pub mod aws;
pub mod azure;
pub mod gcp;

use std::path::PathBuf;

use cloudvault_core::{Credentials, Profile, Provider, VaultError};

pub use aws::AwsImporter;
pub use azure::AzureImporter;
pub use gcp::GcpImporter;

/// Options controlling a single import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Source selector: an AWS profile section name, an Azure
    /// service-principal file path, or a GCP key file path/alias.
    /// `None` means the adapter's conventional default.
    pub source: Option<String>,
    /// Name for the resulting vault profile; defaults per adapter.
    pub target_name: Option<String>,
    /// Mark the imported profile as the provider default.
    pub set_default: bool,
}

/// A candidate credential source an adapter can enumerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Identifier to pass back as [`ImportOptions::source`].
    pub id: String,
    /// Human-readable detail (file path, subscription name, ...).
    pub detail: String,
}

/// A provider-specific translator from an external credential source.
pub trait ImportAdapter {
    fn provider(&self) -> Provider;

    /// Enumerate candidate sources. For Azure this is informational
    /// only: subscriptions known to the local CLI do not by themselves
    /// yield importable secrets.
    fn list_sources(&self) -> Result<Vec<SourceDescriptor>, VaultError>;

    /// Read and translate one source. The returned credentials have
    /// already passed model validation.
    fn import(&self, opts: &ImportOptions) -> Result<(Profile, Credentials), VaultError>;
}

/// Select the adapter for a provider, rooted at the given home directory.
pub fn adapter_for(provider: Provider, home_dir: PathBuf) -> Box<dyn ImportAdapter> {
    match provider {
        Provider::Aws => Box::new(AwsImporter::new(home_dir)),
        Provider::Azure => Box::new(AzureImporter::new(home_dir)),
        Provider::Gcp => Box::new(GcpImporter::new(home_dir)),
    }
}

/// Resolve the default home directory for adapter construction.
pub fn default_home_dir() -> Result<PathBuf, VaultError> {
    dirs::home_dir().ok_or_else(|| VaultError::Internal("cannot determine home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_for_matches_provider() {
        let home = PathBuf::from("/home/u");
        for provider in Provider::ALL {
            let adapter = adapter_for(provider, home.clone());
            assert_eq!(adapter.provider(), provider);
        }
    }
}
