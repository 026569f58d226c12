//! Image provider adapters.
//!
//! One [`ImageAdapter`] per backend family. An adapter turns a model id and a
//! prompt into an [`ImagePayload`], or into an [`AttemptError`] saying whether
//! the orchestrator may move on to the next model.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use timelens_imagegen::providers::{GeminiAdapter, ImageAdapter};
//! use timelens_imagegen::transport::ReqwestTransport;
//!
//! let adapter = GeminiAdapter::new(Arc::new(ReqwestTransport::new()));
//! let image = adapter.invoke("gemini-2.5-flash-image", "a harbour at dawn", Some(&key)).await?;
//! ```

mod classify;
mod gemini;
mod openai;
mod pollinations;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use classify::{QUOTA_MARKERS, classify_failure};
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use pollinations::PollinationsAdapter;

use crate::auth::ApiKey;
use crate::transport::{HttpResponse, HttpTransport};
use crate::{BackendKind, ImagePayload};

/// Whether a failed attempt allows trying the next model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Quota or rate limit on this model; the next model may still work.
    Retryable,
    /// Stop escalating.
    Fatal,
}

/// Failure of a single model attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptError {
    /// Model that was tried.
    pub model: String,
    /// Human-readable message from the backend or transport.
    pub message: String,
    /// Retryable or fatal.
    pub classification: Classification,
    /// The request never got a response.
    pub transport: bool,
}

impl AttemptError {
    /// A quota-style failure.
    pub fn retryable(model: &str, message: impl Into<String>) -> Self {
        Self::build(model, message, Classification::Retryable, false)
    }

    /// A backend failure that ends escalation.
    pub fn fatal(model: &str, message: impl Into<String>) -> Self {
        Self::build(model, message, Classification::Fatal, false)
    }

    /// A network-level failure. Always fatal.
    pub fn transport(model: &str, message: impl Into<String>) -> Self {
        Self::build(model, message, Classification::Fatal, true)
    }

    /// Whether the orchestrator may try the next model.
    pub fn is_retryable(&self) -> bool {
        self.classification == Classification::Retryable
    }

    fn build(
        model: &str,
        message: impl Into<String>,
        classification: Classification,
        transport: bool,
    ) -> Self {
        Self {
            model: model.to_string(),
            message: message.into(),
            classification,
            transport,
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.model, self.message)
    }
}

impl std::error::Error for AttemptError {}

/// Adapter for one backend family.
#[async_trait]
pub trait ImageAdapter: Send + Sync {
    /// Backend family served by this adapter.
    fn kind(&self) -> BackendKind;

    /// Generate one image with `model`.
    ///
    /// `credential` is `None` for backends that need none.
    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        credential: Option<&ApiKey>,
    ) -> Result<ImagePayload, AttemptError>;
}

/// Base URLs of the three backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub pollinations: String,
    pub gemini: String,
    pub openai: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            pollinations: pollinations::DEFAULT_BASE_URL.to_string(),
            gemini: gemini::DEFAULT_BASE_URL.to_string(),
            openai: openai::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// One adapter per backend family, all sharing `transport`.
pub fn default_adapters(
    transport: Arc<dyn HttpTransport>,
    endpoints: &Endpoints,
) -> Vec<Arc<dyn ImageAdapter>> {
    let pollinations: Arc<dyn ImageAdapter> = Arc::new(PollinationsAdapter::with_base_url(
        transport.clone(),
        &endpoints.pollinations,
    ));
    let gemini: Arc<dyn ImageAdapter> =
        Arc::new(GeminiAdapter::with_base_url(transport.clone(), &endpoints.gemini));
    let openai: Arc<dyn ImageAdapter> =
        Arc::new(OpenAiAdapter::with_base_url(transport, &endpoints.openai));
    vec![pollinations, gemini, openai]
}

/// `{"error": {"message": ...}}`, shared by the Gemini and OpenAI APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Extract the error message from a non-success response.
fn error_message(response: &HttpResponse) -> String {
    response
        .json::<ApiErrorBody>()
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API error: {}", response.status))
}

fn require_credential<'a>(
    model: &str,
    credential: Option<&'a ApiKey>,
) -> Result<&'a ApiKey, AttemptError> {
    credential.ok_or_else(|| AttemptError::fatal(model, "API key not configured"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_reads_api_error_body() {
        let res = HttpResponse::json_body(
            429,
            &serde_json::json!({"error": {"message": "Quota exceeded for metric"}}),
        );
        assert_eq!(error_message(&res), "Quota exceeded for metric");
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(
            error_message(&HttpResponse::new(502, "<html>bad gateway</html>")),
            "API error: 502"
        );
        assert_eq!(
            error_message(&HttpResponse::json_body(
                400,
                &serde_json::json!({"error": {"message": ""}})
            )),
            "API error: 400"
        );
    }

    #[test]
    fn attempt_error_constructors() {
        let quota = AttemptError::retryable("m1", "quota");
        assert!(quota.is_retryable());
        assert!(!quota.transport);

        let net = AttemptError::transport("m1", "timed out");
        assert_eq!(net.classification, Classification::Fatal);
        assert!(net.transport);
        assert_eq!(net.to_string(), "m1: timed out");
    }

    #[test]
    fn default_adapters_cover_every_backend() {
        let transport = Arc::new(crate::transport::MockTransport::new());
        let kinds: Vec<BackendKind> = default_adapters(transport, &Endpoints::default())
            .iter()
            .map(|a| a.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                BackendKind::DirectUrl,
                BackendKind::Multimodal,
                BackendKind::ImageApi
            ]
        );
    }

    #[test]
    fn missing_credential_is_fatal() {
        let err = require_credential("m1", None).unwrap_err();
        assert_eq!(err.classification, Classification::Fatal);
    }
}
