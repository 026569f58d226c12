//! OpenAI images provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AttemptError, ImageAdapter, error_message};
use crate::auth::ApiKey;
use crate::transport::{HttpRequest, HttpTransport};
use crate::{BackendKind, ImagePayload};

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const IMAGE_SIZE: &str = "1024x1024";

/// Request body for `/v1/images/generations`.
#[derive(Debug, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
    pub response_format: String,
}

/// Response from `/v1/images/generations`.
#[derive(Debug, Deserialize)]
pub struct ImageGenerationResponse {
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
pub struct ImageData {
    pub b64_json: Option<String>,
}

/// Adapter for the OpenAI images endpoint.
pub struct OpenAiAdapter {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl OpenAiAdapter {
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
}

#[async_trait]
impl ImageAdapter for OpenAiAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::ImageApi
    }

    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        credential: Option<&ApiKey>,
    ) -> Result<ImagePayload, AttemptError> {
        let key = super::require_credential(model, credential)?;
        let body = serde_json::to_value(ImageGenerationRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            n: 1,
            size: IMAGE_SIZE.to_string(),
            response_format: "b64_json".to_string(),
        })
        .map_err(|e| AttemptError::fatal(model, e.to_string()))?;

        let request = HttpRequest::post_json(format!("{}/v1/images/generations", self.base_url), body)
            .header("Authorization", format!("Bearer {}", key.expose_secret()));

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AttemptError::transport(model, e.to_string()))?;

        if !response.is_success() {
            return Err(AttemptError::fatal(model, error_message(&response)));
        }

        let parsed: ImageGenerationResponse = response
            .json()
            .map_err(|e| AttemptError::fatal(model, format!("malformed response: {e}")))?;

        let data = parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .filter(|b64| !b64.is_empty())
            .ok_or_else(|| AttemptError::fatal(model, "No image was generated"))?;

        debug!(model, "openai returned image");
        Ok(ImagePayload::inline("image/png", data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Classification;
    use crate::transport::MockTransport;
    use serde_json::json;

    fn key() -> ApiKey {
        ApiKey::new("sk-test")
    }

    #[tokio::test]
    async fn success_returns_png_data_uri() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, json!({"created": 1, "data": [{"b64_json": "iVBORw0K"}]}));
        let adapter = OpenAiAdapter::new(mock.clone());

        let payload = adapter
            .invoke("dall-e-3", "a lighthouse", Some(&key()))
            .await
            .unwrap();

        assert_eq!(payload.as_uri(), "data:image/png;base64,iVBORw0K");
        let request = &mock.requests()[0];
        assert_eq!(request.url, "https://api.openai.com/v1/images/generations");
        assert_eq!(request.header_value("authorization"), Some("Bearer sk-test"));
        assert_eq!(
            request.body,
            Some(json!({
                "model": "dall-e-3",
                "prompt": "a lighthouse",
                "n": 1,
                "size": "1024x1024",
                "response_format": "b64_json"
            }))
        );
    }

    #[tokio::test]
    async fn missing_image_data_is_fatal() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, json!({"data": [{"url": "https://x"}]}));
        let adapter = OpenAiAdapter::new(mock.clone());

        let err = adapter.invoke("dall-e-3", "p", Some(&key())).await.unwrap_err();

        assert_eq!(err.message, "No image was generated");
        assert_eq!(err.classification, Classification::Fatal);
    }

    #[tokio::test]
    async fn error_status_is_fatal_even_for_quota() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(429, json!({"error": {"message": "You exceeded your current quota"}}));
        let adapter = OpenAiAdapter::new(mock.clone());

        let err = adapter.invoke("dall-e-3", "p", Some(&key())).await.unwrap_err();

        assert_eq!(err.classification, Classification::Fatal);
        assert_eq!(err.message, "You exceeded your current quota");
    }

    #[tokio::test]
    async fn custom_base_url_is_used() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, json!({"data": [{"b64_json": "AAAA"}]}));
        let adapter = OpenAiAdapter::with_base_url(mock.clone(), "http://localhost:8080/");

        adapter.invoke("dall-e-3", "p", Some(&key())).await.unwrap();

        assert_eq!(
            mock.requests()[0].url,
            "http://localhost:8080/v1/images/generations"
        );
    }
}
