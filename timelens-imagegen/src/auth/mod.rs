//! Credential storage for provider API keys.
//!
//! One secret is kept per [`CredentialType`]; saving a new value replaces the
//! old one. Values are base64-encoded before they reach the backing store so
//! any store that only holds text can keep them. The encoding is not a
//! security measure: treat every store here as preference-grade persistence.
//!
//! # Example
//!
//! ```ignore
//! use timelens_imagegen::auth::{KeyringSecretStore, SecretStore};
//! use timelens_imagegen::CredentialType;
//!
//! let store = KeyringSecretStore::new("timelens").with_env_fallback();
//! store.save(CredentialType::Gemini, "AIza...")?;
//! let key = store.get(CredentialType::Gemini);
//! ```

mod keyring_store;
mod memory;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

use crate::{CredentialType, Result};

pub use keyring_store::KeyringSecretStore;
pub use memory::MemorySecretStore;

/// A secret API key that prevents accidental logging.
///
/// The key is wrapped in `SecretString` which:
/// - Implements `Debug` as `"[REDACTED]"`
/// - Zeroizes memory on drop
/// - Requires explicit `.expose_secret()` to access the value
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value.
    ///
    /// Use sparingly - only when actually sending to an API.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Key-value store for credentials, keyed by credential type.
///
/// Reads never mutate, so a store can be shared with a running orchestrator.
pub trait SecretStore: Send + Sync {
    /// Store a credential, overwriting any previous value for the type.
    ///
    /// The value is stored exactly as given; callers that want trimming or
    /// non-empty keys check before saving.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write could not be persisted.
    fn save(&self, kind: CredentialType, value: &str) -> Result<()>;

    /// Get the stored credential, or `None` if absent.
    fn get(&self, kind: CredentialType) -> Option<ApiKey>;

    /// Delete the credential. Deleting an absent credential is not an error.
    fn remove(&self, kind: CredentialType) -> Result<()>;

    /// Check if a credential is stored.
    fn has(&self, kind: CredentialType) -> bool {
        self.get(kind).is_some()
    }

    /// Credential types with a stored value.
    fn stored_types(&self) -> Vec<CredentialType> {
        CredentialType::ALL
            .into_iter()
            .filter(|kind| self.has(*kind))
            .collect()
    }
}

/// Source of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Stored in the system keyring.
    Keyring,
    /// Read from an environment variable.
    Environment,
}

fn encode(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

/// Decode a stored value. Anything that is not valid base64 UTF-8 reads as absent.
fn decode(stored: &str) -> Option<String> {
    let bytes = STANDARD.decode(stored.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}
