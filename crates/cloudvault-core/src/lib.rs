// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the cloudvault credential vault.
//!
//! This crate provides the provider enum, profile metadata types, typed
//! credential payloads, and the error taxonomy shared by the vault,
//! store, import, and service crates.

pub mod credentials;
pub mod error;
pub mod profile;
pub mod provider;

// Re-export key items at crate root for ergonomic imports.
pub use credentials::{AwsCredentials, AzureCredentials, Credentials, GcpCredentials};
pub use error::VaultError;
pub use profile::{Profile, TokenStorage};
pub use provider::{validate_profile_name, ProfileRef, ProfileSelector, Provider};
