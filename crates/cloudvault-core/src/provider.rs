// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider enum, profile references, and the `provider:name` selector
//! contract used by consuming commands.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::VaultError;

/// A supported cloud credential ecosystem.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

impl Provider {
    /// All supported providers, in canonical order.
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];
}

/// Identifies one profile: a provider plus a name unique within it.
///
/// The canonical `provider:name` form returned by [`ProfileRef::context`]
/// is used both as the key-derivation context and as the AEAD associated
/// data, binding every sealed record to exactly one profile identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileRef {
    pub provider: Provider,
    pub name: String,
}

impl ProfileRef {
    pub fn new(provider: Provider, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }

    /// Canonical `provider:name` string.
    pub fn context(&self) -> String {
        format!("{}:{}", self.provider, self.name)
    }
}

impl std::fmt::Display for ProfileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

/// Validate a profile name for use as a registry key and file stem.
///
/// Names are restricted to `[A-Za-z0-9._-]`, must be non-empty, and may
/// not start with a dot (hidden files would break directory listings).
pub fn validate_profile_name(name: &str) -> Result<(), VaultError> {
    if name.is_empty() {
        return Err(VaultError::Validation("profile name is empty".into()));
    }
    if name.starts_with('.') {
        return Err(VaultError::Validation(format!(
            "profile name '{name}' may not start with a dot"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-'))
    {
        return Err(VaultError::Validation(format!(
            "profile name '{name}' contains invalid character '{bad}'"
        )));
    }
    Ok(())
}

/// A parsed "current profile" selector, as set in the environment by
/// consuming commands: either `provider:name` or a bare `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSelector {
    pub provider: Option<Provider>,
    pub name: String,
}

impl ProfileSelector {
    /// Parse a selector string. A prefix before the first `:` must be a
    /// known provider; a bare name leaves the provider for the consuming
    /// command to resolve.
    pub fn parse(raw: &str) -> Result<Self, VaultError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(VaultError::Validation("empty profile selector".into()));
        }
        match raw.split_once(':') {
            Some((prefix, name)) => {
                let provider = prefix.parse::<Provider>().map_err(|_| {
                    VaultError::Validation(format!("unknown provider '{prefix}' in selector"))
                })?;
                validate_profile_name(name)?;
                Ok(Self {
                    provider: Some(provider),
                    name: name.to_string(),
                })
            }
            None => {
                validate_profile_name(raw)?;
                Ok(Self {
                    provider: None,
                    name: raw.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn provider_display_and_parse_round_trip() {
        for provider in Provider::ALL {
            let s = provider.to_string();
            let parsed = Provider::from_str(&s).expect("should parse back");
            assert_eq!(provider, parsed);
        }
    }

    #[test]
    fn provider_serializes_lowercase() {
        let json = serde_json::to_string(&Provider::Gcp).unwrap();
        assert_eq!(json, "\"gcp\"");
    }

    #[test]
    fn profile_ref_context_is_provider_colon_name() {
        let r = ProfileRef::new(Provider::Aws, "prod");
        assert_eq!(r.context(), "aws:prod");
        assert_eq!(r.to_string(), "aws/prod");
    }

    #[test]
    fn selector_with_provider_prefix() {
        let sel = ProfileSelector::parse("azure:staging").unwrap();
        assert_eq!(sel.provider, Some(Provider::Azure));
        assert_eq!(sel.name, "staging");
    }

    #[test]
    fn selector_bare_name() {
        let sel = ProfileSelector::parse("myprofile").unwrap();
        assert_eq!(sel.provider, None);
        assert_eq!(sel.name, "myprofile");
    }

    #[test]
    fn selector_unknown_provider_rejected() {
        let err = ProfileSelector::parse("digitalocean:x").unwrap_err();
        assert!(matches!(err, VaultError::Validation(_)));
    }

    #[test]
    fn profile_name_rules() {
        assert!(validate_profile_name("prod-us.east_1").is_ok());
        assert!(validate_profile_name("").is_err());
        assert!(validate_profile_name(".hidden").is_err());
        assert!(validate_profile_name("has space").is_err());
        assert!(validate_profile_name("slash/name").is_err());
    }
}
