// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master key lifecycle: the one root secret the vault is built on.
//!
//! The key is 32 random bytes, generated once and persisted with
//! owner-only permissions. An unreadable or wrong-sized key file is
//! fatal -- silently regenerating would orphan every existing sealed
//! record, so it never happens.

use std::fs;
use std::path::{Path, PathBuf};

use cloudvault_core::VaultError;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto;

const MASTER_KEY_FILE: &str = "master.key";
const MASTER_KEY_LEN: usize = 32;

/// Owns the master key file inside the vault directory.
#[derive(Debug, Clone)]
pub struct MasterKeyManager {
    key_path: PathBuf,
}

impl MasterKeyManager {
    pub fn new(vault_dir: &Path) -> Self {
        Self {
            key_path: vault_dir.join(MASTER_KEY_FILE),
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Return the master key, generating and persisting a fresh one on
    /// first use. A present-but-corrupt key file is an error, never a
    /// regeneration.
    pub fn get_or_create(&self) -> Result<Zeroizing<[u8; MASTER_KEY_LEN]>, VaultError> {
        if self.key_path.exists() {
            return self.load();
        }

        let key = crypto::generate_random_key()?;
        self.write_key(&key)?;
        info!(path = %self.key_path.display(), "generated new master key");
        Ok(Zeroizing::new(key))
    }

    /// Load the existing master key. Fails with "vault unavailable" when
    /// the file is unreadable or not exactly 32 bytes.
    pub fn load(&self) -> Result<Zeroizing<[u8; MASTER_KEY_LEN]>, VaultError> {
        let bytes = Zeroizing::new(fs::read(&self.key_path).map_err(|e| {
            VaultError::Storage(format!(
                "vault unavailable: cannot read master key {}: {e}",
                self.key_path.display()
            ))
        })?);

        let key: [u8; MASTER_KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            VaultError::Storage(format!(
                "vault unavailable: master key {} is corrupt (expected {MASTER_KEY_LEN} bytes, got {})",
                self.key_path.display(),
                bytes.len()
            ))
        })?;

        debug!("master key loaded");
        Ok(Zeroizing::new(key))
    }

    /// Atomically replace the master key file. Used by rotation after
    /// every sealed record has been re-sealed under the new key.
    pub fn replace(&self, new_key: &[u8; MASTER_KEY_LEN]) -> Result<(), VaultError> {
        self.write_key(new_key)?;
        info!("master key rotated");
        Ok(())
    }

    /// Write the key via temp-file-then-rename, with mode 0600 set before
    /// the rename publishes it.
    fn write_key(&self, key: &[u8; MASTER_KEY_LEN]) -> Result<(), VaultError> {
        let tmp_path = self.key_path.with_extension("key.tmp");
        fs::write(&tmp_path, key)
            .map_err(|e| VaultError::storage("writing master key", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| VaultError::storage("restricting master key permissions", e))?;
        }

        fs::rename(&tmp_path, &self.key_path)
            .map_err(|e| VaultError::storage("publishing master key", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_use_generates_and_persists() {
        let dir = tempdir().unwrap();
        let manager = MasterKeyManager::new(dir.path());

        let key1 = manager.get_or_create().unwrap();
        // Second call reads the same key back.
        let key2 = manager.get_or_create().unwrap();
        assert_eq!(*key1, *key2);
        assert!(dir.path().join("master.key").exists());
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let manager = MasterKeyManager::new(dir.path());
        manager.get_or_create().unwrap();

        let mode = fs::metadata(dir.path().join("master.key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_key_file_is_fatal_not_regenerated() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("master.key"), b"short").unwrap();

        let manager = MasterKeyManager::new(dir.path());
        let err = manager.get_or_create().unwrap_err();
        assert!(err.to_string().contains("vault unavailable"));

        // The corrupt file is left untouched for the operator to inspect.
        assert_eq!(fs::read(dir.path().join("master.key")).unwrap(), b"short");
    }

    #[test]
    fn replace_swaps_the_key() {
        let dir = tempdir().unwrap();
        let manager = MasterKeyManager::new(dir.path());

        let old = manager.get_or_create().unwrap();
        let new_key = crypto::generate_random_key().unwrap();
        manager.replace(&new_key).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(*loaded, new_key);
        assert_ne!(*loaded, *old);
    }
}
