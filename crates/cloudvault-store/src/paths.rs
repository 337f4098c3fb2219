// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk layout of a vault directory.
//!
//! ```text
//! <base>/
//!   master.key        owner-only master key (cloudvault-vault)
//!   registry.json     profile metadata + per-provider defaults
//!   records/<provider>/<name>.sealed
//!   .lock             advisory lock for mutating operations
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use cloudvault_core::{ProfileRef, VaultError};

/// An explicit handle to one vault directory, constructed once per
/// invocation and passed down -- no process-wide state.
#[derive(Debug, Clone)]
pub struct VaultPaths {
    base_dir: PathBuf,
}

impl VaultPaths {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.base_dir.join("registry.json")
    }

    pub fn records_dir(&self) -> PathBuf {
        self.base_dir.join("records")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join(".lock")
    }

    pub fn record_path(&self, profile_ref: &ProfileRef) -> PathBuf {
        self.records_dir()
            .join(profile_ref.provider.to_string())
            .join(format!("{}.sealed", profile_ref.name))
    }

    /// Create the vault directory tree with owner-only permissions.
    pub fn ensure(&self) -> Result<(), VaultError> {
        for dir in [&self.base_dir, &self.records_dir()] {
            fs::create_dir_all(dir)
                .map_err(|e| VaultError::storage(format!("creating {}", dir.display()), e))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.base_dir, fs::Permissions::from_mode(0o700))
                .map_err(|e| VaultError::storage("restricting vault directory permissions", e))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudvault_core::Provider;
    use tempfile::tempdir;

    #[test]
    fn layout_is_stable() {
        let paths = VaultPaths::new("/srv/vault");
        assert_eq!(paths.registry_path(), PathBuf::from("/srv/vault/registry.json"));
        let r = ProfileRef::new(Provider::Aws, "prod");
        assert_eq!(
            paths.record_path(&r),
            PathBuf::from("/srv/vault/records/aws/prod.sealed")
        );
    }

    #[cfg(unix)]
    #[test]
    fn ensure_creates_owner_only_base_dir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let base = dir.path().join("vault");
        let paths = VaultPaths::new(&base);
        paths.ensure().unwrap();

        let mode = fs::metadata(&base).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
        assert!(paths.records_dir().is_dir());
    }
}
