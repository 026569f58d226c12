//! Durable secret store backed by the system keyring.

use std::env;

use tracing::debug;

use super::{ApiKey, CredentialSource, SecretStore, decode, encode};
use crate::{CredentialType, Error, Result};

/// Credential storage in the system keyring with environment fallback.
///
/// # Storage Priority
///
/// When retrieving credentials:
/// 1. System keyring (if available)
/// 2. Environment variables (if `env_fallback` is enabled)
///
/// When storing credentials:
/// - Always uses the system keyring
/// - Environment variables are read-only
///
/// # Thread Safety
///
/// Keyring operations are thread-safe. Multiple instances can access the
/// same credentials.
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service_name: String,
    env_fallback: bool,
}

impl KeyringSecretStore {
    /// Create a new keyring store.
    ///
    /// # Arguments
    ///
    /// * `service_name` - Service identifier for the keyring (e.g., "timelens")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            env_fallback: false,
        }
    }

    /// Enable environment variable fallback.
    ///
    /// When enabled, a credential missing from the keyring is looked up in
    /// [`CredentialType::env_var`].
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// Service name entries are stored under.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Get the source of a credential, if one is available.
    pub fn credential_source(&self, kind: CredentialType) -> Option<CredentialSource> {
        if self.get_from_keyring(kind).is_some() {
            Some(CredentialSource::Keyring)
        } else if self.env_fallback && get_from_env(kind).is_some() {
            Some(CredentialSource::Environment)
        } else {
            None
        }
    }

    fn keyring_entry(&self, kind: CredentialType) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service_name, &entry_name(kind))
            .map_err(|e| Error::Keyring(e.to_string()))
    }

    fn get_from_keyring(&self, kind: CredentialType) -> Option<ApiKey> {
        let entry = self.keyring_entry(kind).ok()?;
        let stored = entry.get_password().ok()?;
        decode(&stored).map(ApiKey::new)
    }
}

impl SecretStore for KeyringSecretStore {
    fn save(&self, kind: CredentialType, value: &str) -> Result<()> {
        let entry = self.keyring_entry(kind)?;
        entry
            .set_password(&encode(value))
            .map_err(|e| Error::Keyring(e.to_string()))?;
        debug!(credential = %kind, "stored credential in keyring");
        Ok(())
    }

    fn get(&self, kind: CredentialType) -> Option<ApiKey> {
        if let Some(key) = self.get_from_keyring(kind) {
            debug!(credential = %kind, "retrieved credential from keyring");
            return Some(key);
        }

        if self.env_fallback
            && let Some(key) = get_from_env(kind)
        {
            debug!(credential = %kind, "retrieved credential from environment");
            return Some(key);
        }

        None
    }

    fn remove(&self, kind: CredentialType) -> Result<()> {
        let entry = self.keyring_entry(kind)?;
        match entry.delete_credential() {
            Ok(()) => {
                debug!(credential = %kind, "deleted credential from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Keyring(e.to_string())),
        }
    }
}

/// Keyring entry name for a credential type.
fn entry_name(kind: CredentialType) -> String {
    format!("apikey_{}", kind.as_str())
}

fn get_from_env(kind: CredentialType) -> Option<ApiKey> {
    env::var(kind.env_var())
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| ApiKey::new(v.trim()))
}
