pub mod auth;
pub mod config;
pub mod generate;
pub mod prompt;
pub mod providers;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use timelens_imagegen::auth::KeyringSecretStore;
use timelens_imagegen::transport::{HttpTransport, ReqwestTransport};
use timelens_imagegen::{ImageOrchestrator, ProviderRegistry};

use crate::config::TimelensConfig;

/// Keyring-backed credential store for the configured service.
fn secret_store(config: &TimelensConfig) -> KeyringSecretStore {
    let store = KeyringSecretStore::new(&config.credentials.service_name);
    if config.credentials.env_fallback {
        store.with_env_fallback()
    } else {
        store
    }
}

fn transport(config: &TimelensConfig) -> Result<Arc<dyn HttpTransport>> {
    let transport = match config.http.timeout_secs {
        0 => ReqwestTransport::new(),
        secs => ReqwestTransport::with_timeout(Duration::from_secs(secs))?,
    };
    Ok(Arc::new(transport))
}

/// Orchestrator over the built-in providers, plus the transport it uses.
fn orchestrator(config: &TimelensConfig) -> Result<(ImageOrchestrator, Arc<dyn HttpTransport>)> {
    let transport = transport(config)?;
    let orchestrator = ImageOrchestrator::with_transport(
        ProviderRegistry::builtin(),
        Arc::new(secret_store(config)),
        transport.clone(),
        &config.endpoints,
    );
    Ok((orchestrator, transport))
}
