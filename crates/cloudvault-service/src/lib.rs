// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! High-level profile operations for the cloudvault credential vault.
//!
//! [`ProfileService`] ties the registry, sealed-record store, master key
//! manager, and import adapters together over one vault directory and
//! enforces the locking and staged-commit discipline every mutating
//! operation follows.

pub mod service;

pub use cloudvault_import::{ImportOptions, SourceDescriptor};
pub use cloudvault_store::RemovedProfile;
pub use service::ProfileService;
