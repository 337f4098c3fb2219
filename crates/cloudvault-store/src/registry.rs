// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The profile registry: `provider -> { name -> Profile }` plus at most
//! one default name per provider.
//!
//! The registry is a single JSON document. All mutations happen on the
//! in-memory model and are published in one atomic
//! write-new-file-then-rename, so a concurrent reader sees either the
//! old or the new registry, never a partial one. In particular,
//! changing the default is a single mutation -- there is never a window
//! with zero or two defaults on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use cloudvault_core::{Profile, ProfileRef, Provider, VaultError};
use serde::{Deserialize, Serialize};
use tracing::debug;

const REGISTRY_VERSION: u32 = 1;

fn registry_version() -> u32 {
    REGISTRY_VERSION
}

/// Per-provider slice of the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderEntry {
    /// Name of the default profile, if any.
    #[serde(default)]
    default: Option<String>,
    /// Profiles keyed by name. BTreeMap keeps listings name-ordered.
    #[serde(default)]
    profiles: BTreeMap<String, Profile>,
}

/// In-memory registry model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registry {
    #[serde(default = "registry_version")]
    version: u32,
    #[serde(default)]
    providers: BTreeMap<Provider, ProviderEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            providers: BTreeMap::new(),
        }
    }
}

/// What `remove` took out, so the caller can warn about a cleared default.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedProfile {
    pub profile: Profile,
    pub was_default: bool,
}

impl Registry {
    /// Insert a new profile. The stored `default` flag is normalized to
    /// false; promotion goes through [`Registry::set_default`] so the
    /// uniqueness invariant has a single owner.
    pub fn insert(&mut self, mut profile: Profile) -> Result<(), VaultError> {
        profile.validate()?;
        let entry = self.providers.entry(profile.provider).or_default();
        if entry.profiles.contains_key(&profile.name) {
            return Err(VaultError::Conflict {
                provider: profile.provider,
                name: profile.name,
            });
        }
        profile.default = false;
        entry.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    pub fn get(&self, provider: Provider, name: &str) -> Result<&Profile, VaultError> {
        self.providers
            .get(&provider)
            .and_then(|entry| entry.profiles.get(name))
            .ok_or_else(|| VaultError::NotFound {
                provider,
                name: name.to_string(),
            })
    }

    /// All profiles for one provider (or all providers), ordered by
    /// provider then name.
    pub fn list(&self, provider: Option<Provider>) -> Vec<&Profile> {
        self.providers
            .iter()
            .filter(|(p, _)| provider.is_none_or(|want| want == **p))
            .flat_map(|(_, entry)| entry.profiles.values())
            .collect()
    }

    /// Number of profiles registered for a provider.
    pub fn count(&self, provider: Provider) -> usize {
        self.providers
            .get(&provider)
            .map_or(0, |entry| entry.profiles.len())
    }

    pub fn default_name(&self, provider: Provider) -> Option<&str> {
        self.providers
            .get(&provider)?
            .default
            .as_deref()
    }

    /// Atomically move the provider's default to `name`: the previous
    /// default profile's flag is cleared and the new one set in the same
    /// in-memory mutation, published by a single registry save.
    pub fn set_default(&mut self, provider: Provider, name: &str) -> Result<(), VaultError> {
        let entry = self
            .providers
            .get_mut(&provider)
            .ok_or_else(|| VaultError::NotFound {
                provider,
                name: name.to_string(),
            })?;
        if !entry.profiles.contains_key(name) {
            return Err(VaultError::NotFound {
                provider,
                name: name.to_string(),
            });
        }

        if let Some(old) = entry.default.take()
            && let Some(old_profile) = entry.profiles.get_mut(&old)
        {
            old_profile.default = false;
        }
        if let Some(profile) = entry.profiles.get_mut(name) {
            profile.default = true;
        }
        entry.default = Some(name.to_string());
        Ok(())
    }

    /// Remove a profile. If it was the provider's default, the provider
    /// is left with no default -- the caller surfaces that as a warning.
    pub fn remove(&mut self, provider: Provider, name: &str) -> Result<RemovedProfile, VaultError> {
        let entry = self
            .providers
            .get_mut(&provider)
            .ok_or_else(|| VaultError::NotFound {
                provider,
                name: name.to_string(),
            })?;
        let profile = entry
            .profiles
            .remove(name)
            .ok_or_else(|| VaultError::NotFound {
                provider,
                name: name.to_string(),
            })?;

        let was_default = entry.default.as_deref() == Some(name);
        if was_default {
            entry.default = None;
        }
        Ok(RemovedProfile {
            profile,
            was_default,
        })
    }

    /// Record that a profile's credentials were just revealed.
    pub fn touch_last_used(
        &mut self,
        provider: Provider,
        name: &str,
        when: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), VaultError> {
        let profile = self
            .providers
            .get_mut(&provider)
            .and_then(|entry| entry.profiles.get_mut(name))
            .ok_or_else(|| VaultError::NotFound {
                provider,
                name: name.to_string(),
            })?;
        profile.last_used_at = Some(when);
        Ok(())
    }

    /// Every registered profile identity, for the orphan sweep.
    pub fn references(&self) -> Vec<ProfileRef> {
        self.providers
            .iter()
            .flat_map(|(provider, entry)| {
                entry
                    .profiles
                    .keys()
                    .map(|name| ProfileRef::new(*provider, name.clone()))
            })
            .collect()
    }
}

/// Loads and atomically publishes the registry file.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the current registry; a missing file is an empty registry.
    pub fn load(&self) -> Result<Registry, VaultError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Registry::default());
            }
            Err(e) => return Err(VaultError::storage("reading registry", e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| VaultError::storage("parsing registry", e))
    }

    /// Publish via write-new-file-then-rename with mode 0600, so readers
    /// see old-or-new, never partial.
    pub fn save(&self, registry: &Registry) -> Result<(), VaultError> {
        let json = serde_json::to_vec_pretty(registry)
            .map_err(|e| VaultError::storage("encoding registry", e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &json).map_err(|e| VaultError::storage("writing registry", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| VaultError::storage("restricting registry permissions", e))?;
        }

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| VaultError::storage("publishing registry", e))?;
        debug!(path = %self.path.display(), "registry published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn profile(name: &str, provider: Provider) -> Profile {
        Profile::new(name, provider)
    }

    #[test]
    fn insert_then_get() {
        let mut registry = Registry::default();
        registry.insert(profile("prod", Provider::Aws)).unwrap();

        let got = registry.get(Provider::Aws, "prod").unwrap();
        assert_eq!(got.name, "prod");
        assert!(!got.default);
    }

    #[test]
    fn duplicate_insert_is_a_conflict() {
        let mut registry = Registry::default();
        registry.insert(profile("prod", Provider::Aws)).unwrap();

        let err = registry.insert(profile("prod", Provider::Aws)).unwrap_err();
        assert!(matches!(err, VaultError::Conflict { .. }));
    }

    #[test]
    fn same_name_under_other_provider_is_fine() {
        let mut registry = Registry::default();
        registry.insert(profile("default", Provider::Aws)).unwrap();
        registry.insert(profile("default", Provider::Gcp)).unwrap();
        assert_eq!(registry.list(None).len(), 2);
    }

    #[test]
    fn get_missing_is_not_found() {
        let registry = Registry::default();
        let err = registry.get(Provider::Gcp, "svc").unwrap_err();
        assert!(matches!(err, VaultError::NotFound { .. }));
    }

    #[test]
    fn list_is_ordered_by_name() {
        let mut registry = Registry::default();
        for name in ["zeta", "alpha", "mid"] {
            registry.insert(profile(name, Provider::Aws)).unwrap();
        }
        let names: Vec<_> = registry
            .list(Some(Provider::Aws))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn set_default_moves_the_flag_atomically() {
        let mut registry = Registry::default();
        registry.insert(profile("a", Provider::Aws)).unwrap();
        registry.insert(profile("b", Provider::Aws)).unwrap();

        registry.set_default(Provider::Aws, "a").unwrap();
        registry.set_default(Provider::Aws, "b").unwrap();

        assert_eq!(registry.default_name(Provider::Aws), Some("b"));
        assert!(!registry.get(Provider::Aws, "a").unwrap().default);
        assert!(registry.get(Provider::Aws, "b").unwrap().default);

        let defaults = registry
            .list(Some(Provider::Aws))
            .iter()
            .filter(|p| p.default)
            .count();
        assert_eq!(defaults, 1);
    }

    #[test]
    fn set_default_on_missing_profile_fails() {
        let mut registry = Registry::default();
        registry.insert(profile("a", Provider::Aws)).unwrap();
        assert!(registry.set_default(Provider::Aws, "ghost").is_err());
        // The existing default state is untouched.
        assert_eq!(registry.default_name(Provider::Aws), None);
    }

    #[test]
    fn remove_reports_cleared_default() {
        let mut registry = Registry::default();
        registry.insert(profile("a", Provider::Aws)).unwrap();
        registry.set_default(Provider::Aws, "a").unwrap();

        let removed = registry.remove(Provider::Aws, "a").unwrap();
        assert!(removed.was_default);
        assert_eq!(registry.default_name(Provider::Aws), None);
        assert!(registry.get(Provider::Aws, "a").is_err());
    }

    #[test]
    fn remove_missing_has_no_side_effects() {
        let mut registry = Registry::default();
        registry.insert(profile("keep", Provider::Gcp)).unwrap();
        let before = registry.clone();

        let err = registry.remove(Provider::Gcp, "svc").unwrap_err();
        assert!(matches!(err, VaultError::NotFound { .. }));
        assert_eq!(registry, before);
    }

    #[test]
    fn store_round_trip_and_missing_file() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("registry.json"));

        // Missing file reads as empty.
        assert_eq!(store.load().unwrap(), Registry::default());

        let mut registry = Registry::default();
        registry.insert(profile("prod", Provider::Azure)).unwrap();
        registry.set_default(Provider::Azure, "prod").unwrap();
        store.save(&registry).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, registry);
        assert_eq!(loaded.default_name(Provider::Azure), Some("prod"));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("registry.json"));
        store.save(&Registry::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, ["registry.json"]);
    }
}
