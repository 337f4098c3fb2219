// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The profile service: the single entry point consuming commands use.
//!
//! Every mutating operation acquires the vault directory lock, works on
//! an in-memory registry snapshot, and publishes the result atomically.
//! Adds and imports follow a staged-commit discipline: the sealed record
//! is staged before the registry insert and committed only after the
//! registry was published, so a failed insert never leaves a record
//! behind. Read-only operations skip the lock entirely and rely on
//! rename-on-publish for consistency.

use std::path::PathBuf;
use std::time::Duration;

use cloudvault_config::CloudvaultConfig;
use cloudvault_core::{Credentials, Profile, ProfileRef, Provider, VaultError};
use cloudvault_import::{adapter_for, default_home_dir, ImportAdapter, ImportOptions};
use cloudvault_store::{
    RecordStore, RegistryStore, RemovedProfile, VaultLock, VaultPaths,
};
use cloudvault_vault::{crypto, prompt, MasterKeyManager, SecretSource, Vault};
use secrecy::ExposeSecret;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Orchestrates the registry, sealed-record store, and vault over one
/// vault directory. Constructed once per invocation and passed down;
/// there is no process-wide state.
pub struct ProfileService {
    paths: VaultPaths,
    registry: RegistryStore,
    records: RecordStore,
    keys: MasterKeyManager,
    lock_timeout: Duration,
    secrets: SecretSource,
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService")
            .field("paths", &self.paths)
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

impl ProfileService {
    /// Open (creating if needed) the vault directory at `base_dir`,
    /// sourcing missing secrets from the environment or the terminal.
    pub fn open(base_dir: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self, VaultError> {
        Self::open_with_secrets(base_dir, lock_timeout, prompt::env_or_tty())
    }

    /// Open with an explicit secret source (swapped for a fixed value in
    /// tests and non-interactive callers).
    pub fn open_with_secrets(
        base_dir: impl Into<PathBuf>,
        lock_timeout: Duration,
        secrets: SecretSource,
    ) -> Result<Self, VaultError> {
        let paths = VaultPaths::new(base_dir);
        paths.ensure()?;

        Ok(Self {
            registry: RegistryStore::new(paths.registry_path()),
            records: RecordStore::new(paths.clone()),
            keys: MasterKeyManager::new(paths.base_dir()),
            lock_timeout,
            paths,
            secrets,
        })
    }

    /// Open the vault described by the loaded configuration.
    pub fn from_config(config: &CloudvaultConfig) -> Result<Self, VaultError> {
        let base_dir = config
            .vault
            .resolve_base_dir()
            .ok_or_else(|| VaultError::Internal("cannot determine home directory".into()))?;
        Self::open(base_dir, Duration::from_millis(config.vault.lock_timeout_ms))
    }

    fn lock(&self) -> Result<VaultLock, VaultError> {
        VaultLock::acquire(&self.paths.lock_path(), self.lock_timeout)
    }

    /// The unlocked vault, generating the master key on first use.
    fn unlocked_vault(&self) -> Result<Vault, VaultError> {
        Ok(Vault::new(self.keys.get_or_create()?))
    }

    /// Fill an empty secret field through the injected secret source, so
    /// callers can collect one from the operator instead of passing it
    /// on a command line.
    fn fill_missing_secret(&self, credentials: &mut Credentials) -> Result<(), VaultError> {
        match credentials {
            Credentials::Aws(c) if c.secret_access_key.is_empty() => {
                c.secret_access_key =
                    (self.secrets)("AWS secret access key")?.expose_secret().to_string();
            }
            Credentials::Azure(c) if c.client_secret.is_empty() => {
                c.client_secret =
                    (self.secrets)("Azure client secret")?.expose_secret().to_string();
            }
            // GCP key files always carry the private key inline.
            _ => {}
        }
        Ok(())
    }

    /// Register a new profile with its credentials sealed into the vault.
    ///
    /// Either the registry entry and the sealed record both land, or
    /// neither does. Passing `profile.default = true` promotes the new
    /// profile to the provider default. An empty AWS secret key or Azure
    /// client secret is collected through the secret source first.
    pub fn add_profile(
        &self,
        profile: Profile,
        mut credentials: Credentials,
    ) -> Result<Profile, VaultError> {
        profile.validate()?;
        self.fill_missing_secret(&mut credentials)?;
        credentials.validate()?;
        if profile.provider != credentials.provider() {
            return Err(VaultError::Validation(format!(
                "profile provider {} does not match credential provider {}",
                profile.provider,
                credentials.provider()
            )));
        }

        let _lock = self.lock()?;
        let mut registry = self.registry.load()?;

        let profile_ref = profile.reference();
        let make_default = profile.default;

        let vault = self.unlocked_vault()?;
        let record = vault.seal(&profile_ref, &credentials)?;
        let staged = self.records.stage(&profile_ref, &record)?;

        // A conflict here drops `staged`, which removes the temp file.
        registry.insert(profile)?;
        if make_default {
            registry.set_default(profile_ref.provider, &profile_ref.name)?;
        }
        self.registry.save(&registry)?;
        staged.commit()?;

        info!(profile = %profile_ref, "profile added");
        registry.get(profile_ref.provider, &profile_ref.name).cloned()
    }

    /// All profiles, optionally filtered to one provider, ordered by
    /// provider then name. Lock-free.
    pub fn list_profiles(&self, provider: Option<Provider>) -> Result<Vec<Profile>, VaultError> {
        let registry = self.registry.load()?;
        Ok(registry.list(provider).into_iter().cloned().collect())
    }

    /// Profile metadata only; never secret material. Lock-free.
    pub fn get_profile(&self, provider: Provider, name: &str) -> Result<Profile, VaultError> {
        self.registry.load()?.get(provider, name).cloned()
    }

    /// The provider's default profile, if one is set. Lock-free.
    pub fn get_default(&self, provider: Provider) -> Result<Option<Profile>, VaultError> {
        let registry = self.registry.load()?;
        match registry.default_name(provider) {
            Some(name) => registry.get(provider, name).cloned().map(Some),
            None => Ok(None),
        }
    }

    /// Make `name` the provider's default, clearing any previous default
    /// in the same registry publication.
    pub fn set_default(&self, provider: Provider, name: &str) -> Result<(), VaultError> {
        let _lock = self.lock()?;
        let mut registry = self.registry.load()?;
        registry.set_default(provider, name)?;
        self.registry.save(&registry)?;
        info!(provider = %provider, name = %name, "default profile set");
        Ok(())
    }

    /// Delete a profile and its sealed record.
    ///
    /// The registry entry goes first, so readers stop seeing the profile
    /// as soon as the new registry is published. A record left behind by
    /// an interruption is collected by [`ProfileService::sweep_orphans`].
    /// `was_default` on the result tells the caller the provider now has
    /// no default.
    pub fn delete_profile(
        &self,
        provider: Provider,
        name: &str,
    ) -> Result<RemovedProfile, VaultError> {
        let _lock = self.lock()?;
        let mut registry = self.registry.load()?;
        let removed = registry.remove(provider, name)?;
        self.registry.save(&registry)?;

        let profile_ref = ProfileRef::new(provider, name);
        if let Err(e) = self.records.delete(&profile_ref) {
            warn!(profile = %profile_ref, error = %e, "sealed record left orphaned");
        }

        info!(profile = %profile_ref, was_default = removed.was_default, "profile deleted");
        Ok(removed)
    }

    /// Unseal and return a profile's credentials, recording the use.
    ///
    /// This is the only operation that returns secret material; callers
    /// must need it to authenticate against the provider.
    pub fn reveal(&self, provider: Provider, name: &str) -> Result<Credentials, VaultError> {
        let _lock = self.lock()?;
        let mut registry = self.registry.load()?;
        // Existence check against the source of truth first, so a stale
        // record on disk can never resurrect a deleted profile.
        registry.get(provider, name)?;

        let profile_ref = ProfileRef::new(provider, name);
        let record = self.records.load(&profile_ref)?;
        let credentials = self.unlocked_vault()?.unseal(&profile_ref, &record)?;

        registry.touch_last_used(provider, name, chrono::Utc::now())?;
        self.registry.save(&registry)?;
        Ok(credentials)
    }

    /// Import credentials from the provider's native local source, then
    /// register them through the same staged-commit path as
    /// [`ProfileService::add_profile`].
    pub fn import(&self, provider: Provider, opts: &ImportOptions) -> Result<Profile, VaultError> {
        let adapter = adapter_for(provider, default_home_dir()?);
        self.import_with(adapter.as_ref(), opts)
    }

    /// Import through an explicit adapter (injectable for tests and
    /// non-standard source locations).
    pub fn import_with(
        &self,
        adapter: &dyn ImportAdapter,
        opts: &ImportOptions,
    ) -> Result<Profile, VaultError> {
        let (profile, credentials) = adapter.import(opts)?;
        self.add_profile(profile, credentials)
    }

    /// Re-seal every record under a freshly generated master key.
    ///
    /// All records are unsealed with the old key and staged under the
    /// new one before anything is published; any failure aborts with the
    /// old key still authoritative and no staged file left behind. Only
    /// then is the key file replaced and the staged records finalized.
    /// Returns the number of records re-sealed.
    pub fn rotate_master_key(&self) -> Result<usize, VaultError> {
        let _lock = self.lock()?;

        let old_vault = Vault::new(self.keys.get_or_create()?);
        let new_key = crypto::generate_random_key()?;
        let new_vault = Vault::new(Zeroizing::new(new_key));

        let registry = self.registry.load()?;
        let refs = registry.references();

        let mut staged = Vec::with_capacity(refs.len());
        for profile_ref in &refs {
            let record = self.records.load(profile_ref)?;
            let credentials = old_vault.unseal(profile_ref, &record)?;
            let resealed = new_vault.seal(profile_ref, &credentials)?;
            staged.push(self.records.stage(profile_ref, &resealed)?);
        }

        self.keys.replace(&new_key)?;
        for record in staged {
            record.commit()?;
        }

        info!(records = refs.len(), "master key rotated");
        Ok(refs.len())
    }

    /// Delete sealed records no registry entry points at (leftovers from
    /// interrupted deletes). Returns the identities that were removed.
    pub fn sweep_orphans(&self) -> Result<Vec<ProfileRef>, VaultError> {
        let _lock = self.lock()?;

        let registry = self.registry.load()?;
        let live: std::collections::HashSet<ProfileRef> =
            registry.references().into_iter().collect();

        let mut swept = Vec::new();
        for profile_ref in self.records.list_refs()? {
            if !live.contains(&profile_ref) && self.records.delete(&profile_ref)? {
                info!(profile = %profile_ref, "orphaned sealed record removed");
                swept.push(profile_ref);
            }
        }
        Ok(swept)
    }
}
