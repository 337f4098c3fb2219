// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage for the cloudvault credential vault: the profile
//! registry, the sealed-record tree, and the advisory directory lock.
//!
//! Everything here publishes updates via write-new-file-then-rename, so
//! lock-free readers always observe a self-consistent snapshot.

pub mod lock;
pub mod paths;
pub mod records;
pub mod registry;

pub use lock::VaultLock;
pub use paths::VaultPaths;
pub use records::{RecordStore, StagedRecord};
pub use registry::{Registry, RegistryStore, RemovedProfile};
