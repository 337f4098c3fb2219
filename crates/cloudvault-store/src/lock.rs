// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Advisory cross-process lock for the vault directory.
//!
//! Each tool invocation is a short-lived process, so concurrency is
//! across processes. Mutating operations take this lock before touching
//! registry or vault files; read-only operations rely on atomic
//! rename-on-publish instead and never block.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};

use cloudvault_core::VaultError;
use fs2::FileExt;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// An exclusive advisory lock, released on drop on every exit path.
#[derive(Debug)]
pub struct VaultLock {
    file: File,
}

impl VaultLock {
    /// Acquire the lock at `lock_path`, polling until `timeout` elapses.
    ///
    /// On timeout the operation fails with a retryable
    /// [`VaultError::LockTimeout`] rather than blocking indefinitely.
    pub fn acquire(lock_path: &Path, timeout: Duration) -> Result<Self, VaultError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(lock_path)
            .map_err(|e| VaultError::storage("opening vault lock file", e))?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(path = %lock_path.display(), "vault lock acquired");
                    return Ok(Self { file });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(VaultError::LockTimeout { timeout });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(VaultError::storage("locking vault directory", e)),
            }
        }
    }
}

impl Drop for VaultLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
