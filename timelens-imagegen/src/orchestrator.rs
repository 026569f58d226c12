//! Fallback orchestrator.
//!
//! Resolves a provider, fetches its credential, then walks the provider's
//! model list with the matching adapter until one model produces an image.
//! Only quota failures move on to the next model; anything else ends the
//! request. Every request ends in exactly one [`GenerationOutcome`].
//!
//! ```text
//! Idle ─▶ Resolving ─▶ Attempting(0) ─▶ Attempting(1) ─▶ …
//!              │              │ ok             │ ok
//!              ▼              ▼                ▼
//!           Failure        Success          Success / Failure
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::auth::SecretStore;
use crate::providers::{AttemptError, Endpoints, ImageAdapter, default_adapters};
use crate::registry::{ProviderDescriptor, ProviderRegistry};
use crate::transport::HttpTransport;
use crate::{
    BackendKind, FailureKind, GenerationOutcome, GenerationRequest, ProviderChoice, ProviderId,
    Result,
};

/// Observable state of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Ready for a request.
    Idle,
    /// Choosing a provider and loading its credential.
    Resolving,
    /// Waiting on a model.
    Attempting {
        provider: ProviderId,
        model_index: usize,
    },
}

/// Runs generation requests against the registered providers.
///
/// Handles one request at a time: a request issued while another is in
/// flight fails immediately with [`FailureKind::Busy`].
pub struct ImageOrchestrator {
    registry: ProviderRegistry,
    secrets: Arc<dyn SecretStore>,
    adapters: HashMap<BackendKind, Arc<dyn ImageAdapter>>,
    state: Mutex<OrchestratorState>,
}

impl ImageOrchestrator {
    /// Create an orchestrator with no adapters.
    pub fn new(registry: ProviderRegistry, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            registry,
            secrets,
            adapters: HashMap::new(),
            state: Mutex::new(OrchestratorState::Idle),
        }
    }

    /// Create an orchestrator with the standard adapters over `transport`.
    pub fn with_transport(
        registry: ProviderRegistry,
        secrets: Arc<dyn SecretStore>,
        transport: Arc<dyn HttpTransport>,
        endpoints: &Endpoints,
    ) -> Self {
        default_adapters(transport, endpoints)
            .into_iter()
            .fold(Self::new(registry, secrets), |orchestrator, adapter| {
                orchestrator.with_adapter(adapter)
            })
    }

    /// Register an adapter, replacing any adapter for the same backend.
    pub fn with_adapter(mut self, adapter: Arc<dyn ImageAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    /// The provider registry.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Current state.
    pub fn state(&self) -> OrchestratorState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Providers usable with the stored credentials, in registry order.
    ///
    /// Providers without a credential requirement are always included.
    pub fn list_available_providers(&self) -> Vec<&ProviderDescriptor> {
        self.registry.available(|kind| self.secrets.has(kind))
    }

    /// Provider `choice` resolves to, or `None` for an unknown id.
    ///
    /// Resolving `auto` reads the secret store synchronously.
    pub fn resolve(&self, choice: &ProviderChoice) -> Option<&ProviderDescriptor> {
        match choice {
            ProviderChoice::Auto => self.registry.resolve_auto(|kind| self.secrets.has(kind)),
            ProviderChoice::Explicit(id) => self.registry.get(id),
        }
    }

    /// Generate an image from a prompt.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyPrompt` without producing an outcome when the
    /// prompt is blank.
    pub async fn generate_prompt(
        &self,
        prompt: &str,
        choice: ProviderChoice,
    ) -> Result<GenerationOutcome> {
        let request = GenerationRequest::new(prompt, choice)?;
        Ok(self.generate(&request).await)
    }

    /// Run one generation request to its outcome.
    ///
    /// The secret store is read synchronously on the calling task before any
    /// network call. With [`KeyringSecretStore`](crate::auth::KeyringSecretStore)
    /// that is a blocking keyring lookup (Secret Service over D-Bus, or
    /// Keychain), once per request.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let Some(_in_flight) = InFlight::begin(&self.state) else {
            return failure(
                FailureKind::Busy,
                "another generation request is already in progress".to_string(),
                ProviderId::new(request.choice().to_string()),
                None,
            );
        };

        let Some(provider) = self.resolve(request.choice()) else {
            let requested = ProviderId::new(request.choice().to_string());
            return failure(
                FailureKind::InvalidProvider,
                format!("invalid provider: {requested}"),
                requested,
                None,
            );
        };
        debug!(provider = %provider.id, choice = %request.choice(), "resolved provider");

        let credential = match provider.credential {
            None => None,
            Some(kind) => match self.secrets.get(kind) {
                Some(key) => Some(key),
                None => {
                    return failure(
                        FailureKind::MissingCredential,
                        format!("missing credential for provider: {}", provider.id),
                        provider.id.clone(),
                        None,
                    );
                }
            },
        };

        let Some(adapter) = self.adapters.get(&provider.backend) else {
            return failure(
                FailureKind::BackendRejected,
                format!("backend rejected request: no adapter for {:?}", provider.backend),
                provider.id.clone(),
                None,
            );
        };

        let mut last_quota: Option<AttemptError> = None;
        for (model_index, model) in provider.models.iter().enumerate() {
            self.set_state(OrchestratorState::Attempting {
                provider: provider.id.clone(),
                model_index,
            });
            info!(provider = %provider.id, model, attempt = model_index + 1, "generating image");

            match adapter
                .invoke(model, request.prompt(), credential.as_ref())
                .await
            {
                Ok(image) => {
                    info!(provider = %provider.id, model, "image generated");
                    return GenerationOutcome::Success {
                        provider_id: provider.id.clone(),
                        model: model.clone(),
                        image,
                        generated_at: Utc::now(),
                    };
                }
                Err(err) if err.is_retryable() => {
                    warn!(provider = %provider.id, model, error = %err.message, "model quota reached, trying next model");
                    last_quota = Some(err);
                }
                Err(err) => return fatal_failure(provider, err),
            }
        }

        let (message, last_model) = match last_quota {
            Some(err) => (err.message, Some(err.model)),
            None => ("no models configured".to_string(), None),
        };
        failure(
            FailureKind::QuotaExhausted,
            format!(
                "quota exhausted on all {} models for {}: {message}",
                provider.models.len(),
                provider.display_name
            ),
            provider.id.clone(),
            last_model,
        )
    }

    fn set_state(&self, state: OrchestratorState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

/// Marks the orchestrator busy for the lifetime of one request.
///
/// Dropping it, including when the request future is dropped mid-flight,
/// returns the orchestrator to `Idle`.
struct InFlight<'a> {
    state: &'a Mutex<OrchestratorState>,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a Mutex<OrchestratorState>) -> Option<Self> {
        let mut current = state.lock().unwrap_or_else(|e| e.into_inner());
        if *current != OrchestratorState::Idle {
            return None;
        }
        *current = OrchestratorState::Resolving;
        Some(Self { state })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = OrchestratorState::Idle;
    }
}

fn failure(
    kind: FailureKind,
    reason: String,
    last_provider: ProviderId,
    last_model: Option<String>,
) -> GenerationOutcome {
    debug!(?kind, %reason, "generation failed");
    GenerationOutcome::Failure {
        kind,
        reason,
        last_provider,
        last_model,
    }
}

fn fatal_failure(provider: &ProviderDescriptor, err: AttemptError) -> GenerationOutcome {
    let (kind, reason) = if err.transport {
        (FailureKind::Transport, format!("request failed: {}", err.message))
    } else {
        (
            FailureKind::BackendRejected,
            format!("backend rejected request: {}", err.message),
        )
    };
    failure(kind, reason, provider.id.clone(), Some(err.model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ApiKey, MemorySecretStore};
    use crate::{CredentialType, ImagePayload};
    use async_trait::async_trait;

    /// Adapter that answers from a fixed list, one entry per call.
    struct ScriptedAdapter {
        kind: BackendKind,
        results: Mutex<Vec<std::result::Result<ImagePayload, AttemptError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedAdapter {
        fn new(
            kind: BackendKind,
            mut results: Vec<std::result::Result<ImagePayload, AttemptError>>,
        ) -> Arc<Self> {
            results.reverse();
            Arc::new(Self {
                kind,
                results: Mutex::new(results),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageAdapter for ScriptedAdapter {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn invoke(
            &self,
            model: &str,
            _prompt: &str,
            _credential: Option<&ApiKey>,
        ) -> std::result::Result<ImagePayload, AttemptError> {
            self.calls.lock().unwrap().push(model.to_string());
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AttemptError::fatal(model, "unscripted")))
        }
    }

    fn three_model_registry() -> ProviderRegistry {
        ProviderRegistry::new(
            vec![
                ProviderDescriptor::new(
                    "multi",
                    "Multi",
                    Some(CredentialType::Gemini),
                    BackendKind::Multimodal,
                    &["m1", "m2", "m3"],
                ),
                ProviderDescriptor::new("free", "Free", None, BackendKind::DirectUrl, &["f1"]),
            ],
            vec![ProviderId::new("multi"), ProviderId::new("free")],
        )
        .unwrap()
    }

    fn keyed_store() -> Arc<dyn SecretStore> {
        Arc::new(MemorySecretStore::with_credentials([(CredentialType::Gemini, "k")]).unwrap())
    }

    fn request(choice: &str) -> GenerationRequest {
        GenerationRequest::new("a prompt", choice.parse().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn escalates_in_declared_order_until_success() {
        let adapter = ScriptedAdapter::new(
            BackendKind::Multimodal,
            vec![
                Err(AttemptError::retryable("m1", "quota")),
                Err(AttemptError::retryable("m2", "limit: 0")),
                Ok(ImagePayload::inline("image/png", "AAAA")),
            ],
        );
        let orchestrator =
            ImageOrchestrator::new(three_model_registry(), keyed_store()).with_adapter(adapter.clone());

        let outcome = orchestrator.generate(&request("multi")).await;

        assert_eq!(adapter.calls(), vec!["m1", "m2", "m3"]);
        match outcome {
            GenerationOutcome::Success { provider_id, model, .. } => {
                assert_eq!(provider_id.as_str(), "multi");
                assert_eq!(model, "m3");
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fatal_error_stops_escalation() {
        let adapter = ScriptedAdapter::new(
            BackendKind::Multimodal,
            vec![
                Err(AttemptError::retryable("m1", "quota")),
                Err(AttemptError::fatal("m2", "API key not valid")),
                Ok(ImagePayload::inline("image/png", "AAAA")),
            ],
        );
        let orchestrator =
            ImageOrchestrator::new(three_model_registry(), keyed_store()).with_adapter(adapter.clone());

        let outcome = orchestrator.generate(&request("multi")).await;

        assert_eq!(adapter.calls(), vec!["m1", "m2"]);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::BackendRejected));
        assert_eq!(
            outcome.reason(),
            Some("backend rejected request: API key not valid")
        );
    }

    #[tokio::test]
    async fn exhausted_quota_reports_last_message() {
        let adapter = ScriptedAdapter::new(
            BackendKind::Multimodal,
            vec![
                Err(AttemptError::retryable("m1", "quota one")),
                Err(AttemptError::retryable("m2", "quota two")),
                Err(AttemptError::retryable("m3", "quota three")),
            ],
        );
        let orchestrator =
            ImageOrchestrator::new(three_model_registry(), keyed_store()).with_adapter(adapter.clone());

        let outcome = orchestrator.generate(&request("multi")).await;

        assert_eq!(adapter.calls().len(), 3);
        match outcome {
            GenerationOutcome::Failure {
                kind,
                reason,
                last_provider,
                last_model,
            } => {
                assert_eq!(kind, FailureKind::QuotaExhausted);
                assert_eq!(reason, "quota exhausted on all 3 models for Multi: quota three");
                assert_eq!(last_provider.as_str(), "multi");
                assert_eq!(last_model.as_deref(), Some("m3"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_error_is_not_escalated() {
        let adapter = ScriptedAdapter::new(
            BackendKind::Multimodal,
            vec![Err(AttemptError::transport("m1", "connection refused"))],
        );
        let orchestrator =
            ImageOrchestrator::new(three_model_registry(), keyed_store()).with_adapter(adapter.clone());

        let outcome = orchestrator.generate(&request("multi")).await;

        assert_eq!(adapter.calls(), vec!["m1"]);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Transport));
        assert_eq!(outcome.reason(), Some("request failed: connection refused"));
    }

    #[tokio::test]
    async fn missing_adapter_is_a_failure() {
        let orchestrator = ImageOrchestrator::new(three_model_registry(), keyed_store());
        let outcome = orchestrator.generate(&request("free")).await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::BackendRejected));
    }

    #[tokio::test]
    async fn state_returns_to_idle_after_each_request() {
        let adapter = ScriptedAdapter::new(
            BackendKind::DirectUrl,
            vec![Ok(ImagePayload::url("https://img"))],
        );
        let orchestrator =
            ImageOrchestrator::new(three_model_registry(), keyed_store()).with_adapter(adapter);

        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
        assert!(orchestrator.generate(&request("free")).await.is_success());
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
        // failures reset too
        orchestrator.generate(&request("nope")).await;
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[test]
    fn in_flight_guard_rejects_second_request() {
        let state = Mutex::new(OrchestratorState::Idle);
        let first = InFlight::begin(&state);
        assert!(first.is_some());
        assert_eq!(*state.lock().unwrap(), OrchestratorState::Resolving);
        assert!(InFlight::begin(&state).is_none());
        drop(first);
        assert_eq!(*state.lock().unwrap(), OrchestratorState::Idle);
        assert!(InFlight::begin(&state).is_some());
    }

    #[test]
    fn resolve_auto_follows_credentials() {
        let orchestrator = ImageOrchestrator::new(three_model_registry(), keyed_store());
        assert_eq!(
            orchestrator.resolve(&ProviderChoice::Auto).unwrap().id.as_str(),
            "multi"
        );

        let empty = ImageOrchestrator::new(three_model_registry(), Arc::new(MemorySecretStore::new()));
        assert_eq!(
            empty.resolve(&ProviderChoice::Auto).unwrap().id.as_str(),
            "free"
        );
        assert!(
            empty
                .resolve(&ProviderChoice::Explicit(ProviderId::new("missing")))
                .is_none()
        );
    }
}
