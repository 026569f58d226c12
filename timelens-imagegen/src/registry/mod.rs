//! Provider registry.
//!
//! An immutable catalog of image providers, built once and handed to the
//! orchestrator. Tests build their own registries with [`ProviderRegistry::new`].

use std::collections::HashSet;

use serde::Serialize;

use crate::{BackendKind, CredentialType, Error, ProviderId, Result};

/// Static description of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    /// Unique provider id.
    pub id: ProviderId,
    /// Human-readable name.
    pub display_name: String,
    /// Cosmetic icon.
    pub icon: String,
    /// Credential required to use the provider, if any.
    pub credential: Option<CredentialType>,
    /// Backend family the provider talks to.
    pub backend: BackendKind,
    /// Models to try, in order.
    pub models: Vec<String>,
}

impl ProviderDescriptor {
    /// Create a descriptor.
    pub fn new(
        id: &str,
        display_name: &str,
        credential: Option<CredentialType>,
        backend: BackendKind,
        models: &[&str],
    ) -> Self {
        Self {
            id: ProviderId::new(id),
            display_name: display_name.to_string(),
            icon: String::new(),
            credential,
            backend,
            models: models.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Set the icon.
    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }

    /// Whether the provider is usable given which credentials are present.
    pub fn is_available(&self, has_credential: impl Fn(CredentialType) -> bool) -> bool {
        self.credential.is_none_or(has_credential)
    }
}

/// Immutable catalog of providers plus the automatic-selection preference.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
    auto_preference: Vec<ProviderId>,
}

impl ProviderRegistry {
    /// Build a registry.
    ///
    /// `auto_preference` lists the providers `auto` may resolve to, best
    /// first. The first one whose credential is present wins.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRegistry` when ids repeat, a provider has no
    /// models, a preference names an unknown provider, or no preference
    /// entry can run without a credential.
    pub fn new(
        providers: Vec<ProviderDescriptor>,
        auto_preference: Vec<ProviderId>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.id.clone()) {
                return Err(Error::InvalidRegistry(format!(
                    "duplicate provider id: {}",
                    provider.id
                )));
            }
            if provider.models.is_empty() {
                return Err(Error::InvalidRegistry(format!(
                    "provider {} has no models",
                    provider.id
                )));
            }
        }

        let mut has_keyless_fallback = false;
        for id in &auto_preference {
            let Some(provider) = providers.iter().find(|p| &p.id == id) else {
                return Err(Error::InvalidRegistry(format!(
                    "auto preference names unknown provider: {id}"
                )));
            };
            has_keyless_fallback |= provider.credential.is_none();
        }
        if !has_keyless_fallback {
            return Err(Error::InvalidRegistry(
                "auto preference needs a provider without a credential".to_string(),
            ));
        }

        Ok(Self {
            providers,
            auto_preference,
        })
    }

    /// The built-in provider catalog.
    pub fn builtin() -> Self {
        Self {
            providers: builtin_providers(),
            auto_preference: vec![ProviderId::new("nanobanana"), ProviderId::new("pollinations")],
        }
    }

    /// Look up a provider by id.
    pub fn get(&self, id: &ProviderId) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| &p.id == id)
    }

    /// All providers in declaration order.
    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Resolve `auto` to a concrete provider.
    ///
    /// Pure function of credential presence. A validated registry always has
    /// a keyless preference entry, so this only returns `None` for a
    /// preference list that `new()` would have rejected.
    pub fn resolve_auto(
        &self,
        has_credential: impl Fn(CredentialType) -> bool,
    ) -> Option<&ProviderDescriptor> {
        self.auto_preference
            .iter()
            .filter_map(|id| self.get(id))
            .find(|p| p.is_available(&has_credential))
    }

    /// Providers usable with the present credentials, in declaration order.
    pub fn available(
        &self,
        has_credential: impl Fn(CredentialType) -> bool,
    ) -> Vec<&ProviderDescriptor> {
        self.providers
            .iter()
            .filter(|p| p.is_available(&has_credential))
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_providers() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor::new(
            "nanobanana",
            "Nano Banana (Free Tier)",
            Some(CredentialType::Gemini),
            BackendKind::Multimodal,
            &["gemini-2.5-flash-image", "gemini-2.5-flash-image-preview"],
        )
        .with_icon("🍌"),
        ProviderDescriptor::new(
            "gemini3",
            "Nano Banana Pro",
            Some(CredentialType::Gemini),
            BackendKind::Multimodal,
            &["gemini-3-pro-image-preview"],
        )
        .with_icon("✨"),
        ProviderDescriptor::new(
            "pollinations",
            "Pollinations (Backup)",
            None,
            BackendKind::DirectUrl,
            &["flux"],
        )
        .with_icon("🆓"),
        ProviderDescriptor::new(
            "openai",
            "DALL-E 3",
            Some(CredentialType::OpenAi),
            BackendKind::ImageApi,
            &["dall-e-3"],
        )
        .with_icon("🟢"),
    ]
}
