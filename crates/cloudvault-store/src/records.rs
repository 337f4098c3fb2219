// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sealed-record file store with staged commits.
//!
//! Records live at `records/<provider>/<name>.sealed`. A write is always
//! staged to a dot-prefixed temp file in the final directory first and
//! renamed into place only when the caller commits -- the add path can
//! therefore discard the record when the registry insert fails, and a
//! crash mid-stage leaves only an ignorable temp file. Profile names may
//! not start with a dot, so staged files never collide with real records.

use std::fs;
use std::path::PathBuf;

use cloudvault_core::{ProfileRef, Provider, VaultError};
use cloudvault_vault::SealedRecord;
use tracing::debug;

use crate::paths::VaultPaths;

const RECORD_EXT: &str = "sealed";

/// Read/write access to the sealed-record tree.
#[derive(Debug, Clone)]
pub struct RecordStore {
    paths: VaultPaths,
}

/// A record written to disk but not yet visible under its final name.
///
/// Dropping a staged record without committing removes the temp file.
#[derive(Debug)]
pub struct StagedRecord {
    tmp_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl StagedRecord {
    /// Atomically publish the record under its final name.
    pub fn commit(mut self) -> Result<(), VaultError> {
        fs::rename(&self.tmp_path, &self.final_path)
            .map_err(|e| VaultError::storage("committing sealed record", e))?;
        self.committed = true;
        Ok(())
    }

    /// Explicitly remove the staged file (same as dropping).
    pub fn discard(self) {}
}

impl Drop for StagedRecord {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

impl RecordStore {
    pub fn new(paths: VaultPaths) -> Self {
        Self { paths }
    }

    /// Stage a sealed record for `profile_ref`. The temp file is
    /// restricted to mode 0600 before the commit makes it visible.
    pub fn stage(
        &self,
        profile_ref: &ProfileRef,
        record: &SealedRecord,
    ) -> Result<StagedRecord, VaultError> {
        let final_path = self.paths.record_path(profile_ref);
        let dir = final_path
            .parent()
            .ok_or_else(|| VaultError::Internal("record path has no parent".into()))?;
        fs::create_dir_all(dir)
            .map_err(|e| VaultError::storage("creating provider record directory", e))?;

        let tmp_path = dir.join(format!(".{}.staged", profile_ref.name));
        fs::write(&tmp_path, record.to_json()?)
            .map_err(|e| VaultError::storage("staging sealed record", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| VaultError::storage("restricting sealed record permissions", e))?;
        }

        debug!(profile = %profile_ref, "sealed record staged");
        Ok(StagedRecord {
            tmp_path,
            final_path,
            committed: false,
        })
    }

    /// Load the sealed record for a registered profile. A missing file
    /// under a live registry entry is a storage-level inconsistency, not
    /// a NotFound -- the registry is the source of truth for existence.
    pub fn load(&self, profile_ref: &ProfileRef) -> Result<SealedRecord, VaultError> {
        let path = self.paths.record_path(profile_ref);
        let bytes = fs::read(&path).map_err(|e| {
            VaultError::Storage(format!("sealed record missing for {profile_ref}: {e}"))
        })?;
        SealedRecord::from_json(&bytes)
    }

    /// Delete a record. Returns whether a file was actually removed.
    pub fn delete(&self, profile_ref: &ProfileRef) -> Result<bool, VaultError> {
        let path = self.paths.record_path(profile_ref);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(profile = %profile_ref, "sealed record deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VaultError::storage("deleting sealed record", e)),
        }
    }

    /// Enumerate every committed record on disk, including ones no
    /// registry entry points at (orphans from interrupted deletes).
    pub fn list_refs(&self) -> Result<Vec<ProfileRef>, VaultError> {
        let mut refs = Vec::new();
        for provider in Provider::ALL {
            let dir = self.paths.records_dir().join(provider.to_string());
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(VaultError::storage("listing sealed records", e)),
            };
            for entry in entries {
                let entry = entry.map_err(|e| VaultError::storage("listing sealed records", e))?;
                let path = entry.path();
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if stem.starts_with('.') || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT)
                {
                    continue;
                }
                refs.push(ProfileRef::new(provider, stem));
            }
        }
        refs.sort_by(|a, b| a.context().cmp(&b.context()));
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudvault_vault::RECORD_VERSION;
    use tempfile::tempdir;

    fn record_for(profile_ref: &ProfileRef) -> SealedRecord {
        SealedRecord {
            version: RECORD_VERSION,
            context: profile_ref.context(),
            nonce: vec![0u8; 12],
            ciphertext: vec![1, 2, 3],
        }
    }

    fn store(dir: &std::path::Path) -> RecordStore {
        let paths = VaultPaths::new(dir);
        paths.ensure().unwrap();
        RecordStore::new(paths)
    }

    #[test]
    fn stage_commit_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let profile_ref = ProfileRef::new(Provider::Aws, "prod");
        let record = record_for(&profile_ref);

        let staged = store.stage(&profile_ref, &record).unwrap();
        // Not visible before commit.
        assert!(store.load(&profile_ref).is_err());

        staged.commit().unwrap();
        assert_eq!(store.load(&profile_ref).unwrap(), record);
    }

    #[test]
    fn discarded_stage_leaves_nothing() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let profile_ref = ProfileRef::new(Provider::Gcp, "svc");

        let staged = store.stage(&profile_ref, &record_for(&profile_ref)).unwrap();
        staged.discard();

        assert!(store.load(&profile_ref).is_err());
        assert!(store.list_refs().unwrap().is_empty());
        // The provider directory holds no leftover temp file either.
        let leftover: Vec<_> = fs::read_dir(dir.path().join("records/gcp"))
            .unwrap()
            .collect();
        assert!(leftover.is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let profile_ref = ProfileRef::new(Provider::Azure, "sp");

        store
            .stage(&profile_ref, &record_for(&profile_ref))
            .unwrap()
            .commit()
            .unwrap();
        assert!(store.delete(&profile_ref).unwrap());
        assert!(!store.delete(&profile_ref).unwrap());
    }

    #[test]
    fn list_refs_spans_providers_and_skips_staged_files() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let aws = ProfileRef::new(Provider::Aws, "a");
        let gcp = ProfileRef::new(Provider::Gcp, "g");
        store.stage(&aws, &record_for(&aws)).unwrap().commit().unwrap();
        store.stage(&gcp, &record_for(&gcp)).unwrap().commit().unwrap();
        // One staged-but-uncommitted record must not be listed.
        let staged_ref = ProfileRef::new(Provider::Aws, "pending");
        let _staged = store.stage(&staged_ref, &record_for(&staged_ref)).unwrap();

        let refs = store.list_refs().unwrap();
        assert_eq!(refs, vec![aws, gcp]);
    }

    #[cfg(unix)]
    #[test]
    fn committed_record_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let profile_ref = ProfileRef::new(Provider::Aws, "perm");
        store
            .stage(&profile_ref, &record_for(&profile_ref))
            .unwrap()
            .commit()
            .unwrap();

        let mode = fs::metadata(dir.path().join("records/aws/perm.sealed"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
