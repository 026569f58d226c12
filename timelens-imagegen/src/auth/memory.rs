//! In-process secret store.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use super::{ApiKey, SecretStore, decode, encode};
use crate::{CredentialType, Result};

/// Secret store held in memory, lost when the process exits.
///
/// Uses the same encoding as the durable store, so it behaves identically
/// in tests.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: RwLock<HashMap<CredentialType, String>>,
}

impl MemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with credentials.
    pub fn with_credentials<'a>(
        credentials: impl IntoIterator<Item = (CredentialType, &'a str)>,
    ) -> Result<Self> {
        let store = Self::new();
        for (kind, value) in credentials {
            store.save(kind, value)?;
        }
        Ok(store)
    }
}

impl SecretStore for MemorySecretStore {
    fn save(&self, kind: CredentialType, value: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind, encode(value));
        debug!(credential = %kind, "stored credential in memory");
        Ok(())
    }

    fn get(&self, kind: CredentialType) -> Option<ApiKey> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&kind).and_then(|v| decode(v)).map(ApiKey::new)
    }

    fn remove(&self, kind: CredentialType) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&kind);
        Ok(())
    }
}
