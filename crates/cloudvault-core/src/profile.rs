// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile metadata records. A profile never contains secret material;
//! secrets live in the sealed-record store keyed by the same identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::provider::{validate_profile_name, ProfileRef, Provider};

/// How a profile's secrets are held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// Encrypted at rest in the vault's sealed-record store.
    #[default]
    Sealed,
    /// Held outside the vault (e.g. the provider's own CLI session).
    External,
}

/// Non-secret metadata for one named, provider-scoped credential set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub name: String,
    pub provider: Provider,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub role_arn: Option<String>,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub token_storage: TokenStorage,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Create a profile with empty region/account and `created_at = now`.
    pub fn new(name: impl Into<String>, provider: Provider) -> Self {
        Self {
            name: name.into(),
            provider,
            region: String::new(),
            account_id: String::new(),
            role_arn: None,
            default: false,
            token_storage: TokenStorage::default(),
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    /// The identity this profile's sealed record is bound to.
    pub fn reference(&self) -> ProfileRef {
        ProfileRef::new(self.provider, self.name.clone())
    }

    /// Check the metadata invariants enforced before any registry insert.
    pub fn validate(&self) -> Result<(), VaultError> {
        validate_profile_name(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_defaults() {
        let p = Profile::new("myaws", Provider::Aws);
        assert_eq!(p.region, "");
        assert!(!p.default);
        assert_eq!(p.token_storage, TokenStorage::Sealed);
        assert!(p.last_used_at.is_none());
    }

    #[test]
    fn profile_reference_matches_identity() {
        let p = Profile::new("svc", Provider::Gcp);
        assert_eq!(p.reference().context(), "gcp:svc");
    }

    #[test]
    fn profile_json_round_trip() {
        let p = Profile::new("prod", Provider::Azure);
        let json = serde_json::to_string(&p).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn invalid_name_fails_validation() {
        let p = Profile::new("bad name", Provider::Aws);
        assert!(matches!(p.validate(), Err(VaultError::Validation(_))));
    }
}
