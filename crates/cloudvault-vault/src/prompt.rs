// SPDX-FileCopyrightText: 2026 Cloudvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret acquisition as an injectable capability.
//!
//! Commands that need a secret from the operator (e.g. a client secret
//! while adding an Azure profile) go through a [`SecretSource`] rather
//! than touching the terminal directly, so tests can substitute a
//! closure.

use cloudvault_core::VaultError;
use secrecy::SecretString;

/// The environment variable consulted before any interactive prompt.
pub const VAULT_SECRET_ENV_VAR: &str = "CLOUDVAULT_SECRET";

/// A capability that yields a secret given a prompt label.
pub type SecretSource = Box<dyn Fn(&str) -> Result<SecretString, VaultError> + Send + Sync>;

/// The default source: `CLOUDVAULT_SECRET` environment variable first
/// (for headless use), then an interactive TTY prompt via `rpassword`.
///
/// Returns an error if neither source is available.
pub fn env_or_tty() -> SecretSource {
    Box::new(|label: &str| {
        if let Ok(value) = std::env::var(VAULT_SECRET_ENV_VAR)
            && !value.is_empty()
        {
            return Ok(SecretString::from(value));
        }

        if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
            eprint!("{label}: ");
            let secret = rpassword::read_password()
                .map_err(|e| VaultError::Internal(format!("failed to read secret: {e}")))?;
            if secret.is_empty() {
                return Err(VaultError::Validation("empty secret not allowed".into()));
            }
            return Ok(SecretString::from(secret));
        }

        Err(VaultError::Validation(format!(
            "no secret provided for '{label}'. Set {VAULT_SECRET_ENV_VAR} or run interactively."
        )))
    })
}

/// A fixed-value source for tests and non-interactive callers.
pub fn fixed(value: &str) -> SecretSource {
    let value = value.to_string();
    Box::new(move |_label: &str| Ok(SecretString::from(value.clone())))
}
