//! Gemini multimodal image provider.
//!
//! Calls `generateContent` asking for both text and image modalities and
//! takes the first inline image part of the first candidate.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AttemptError, Classification, ImageAdapter, classify_failure, error_message};
use crate::auth::ApiKey;
use crate::transport::{HttpRequest, HttpTransport};
use crate::{BackendKind, ImagePayload};

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// API version serving the image models.
const API_VERSION: &str = "v1beta";

const DEFAULT_MIME_TYPE: &str = "image/png";

// ────────────────────────────────────────────────────────────────────────────
// Gemini API Types
// ────────────────────────────────────────────────────────────────────────────

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

impl GenerateContentRequest {
    /// Request both text and image output for a prompt.
    pub fn image(prompt: &str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }
}

/// Response from `generateContent`.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: Option<String>,
}

impl GenerateContentResponse {
    /// First inline image of the first candidate.
    pub fn first_image(&self) -> Option<ImagePayload> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        parts.iter().find_map(|part| {
            let inline = part.inline_data.as_ref()?;
            let data = inline.data.as_deref().filter(|d| !d.is_empty())?;
            let mime_type = inline.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE);
            Some(ImagePayload::inline(mime_type, data))
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiAdapter
// ────────────────────────────────────────────────────────────────────────────

/// Adapter for Gemini image models.
pub struct GeminiAdapter {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl GeminiAdapter {
    /// Create an adapter with the default base URL.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_base_url(transport, DEFAULT_BASE_URL)
    }

    /// Create an adapter with a custom base URL.
    pub fn with_base_url(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// Endpoint for a model.
    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{API_VERSION}/models/{model}:generateContent",
            self.base_url
        )
    }
}

#[async_trait]
impl ImageAdapter for GeminiAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Multimodal
    }

    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        credential: Option<&ApiKey>,
    ) -> Result<ImagePayload, AttemptError> {
        let key = super::require_credential(model, credential)?;
        let body = serde_json::to_value(GenerateContentRequest::image(prompt))
            .map_err(|e| AttemptError::fatal(model, e.to_string()))?;
        let request = HttpRequest::post_json(self.endpoint(model), body)
            .header("x-goog-api-key", key.expose_secret());

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AttemptError::transport(model, e.to_string()))?;

        if !response.is_success() {
            let message = error_message(&response);
            return Err(match classify_failure(&message) {
                Classification::Retryable => AttemptError::retryable(model, message),
                Classification::Fatal => AttemptError::fatal(model, message),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| AttemptError::fatal(model, format!("malformed response: {e}")))?;

        // An empty success is not a quota signal; do not escalate.
        let image = parsed
            .first_image()
            .ok_or_else(|| AttemptError::fatal(model, "no image returned by model"))?;

        debug!(model, "gemini returned inline image");
        Ok(image)
    }
}
