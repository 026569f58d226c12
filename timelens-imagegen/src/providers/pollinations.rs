//! Pollinations direct-URL provider.
//!
//! The image URL is derived from the prompt; a HEAD request makes the backend
//! render it and confirms the image exists.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use super::{AttemptError, ImageAdapter};
use crate::auth::ApiKey;
use crate::transport::{HttpRequest, HttpTransport};
use crate::{BackendKind, ImagePayload};

/// Default Pollinations image base URL.
pub const DEFAULT_BASE_URL: &str = "https://image.pollinations.ai";

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 768;
const SEED_RANGE: u32 = 1_000_000;

/// Adapter for the keyless Pollinations backend.
pub struct PollinationsAdapter {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    seed: Option<u32>,
}

impl PollinationsAdapter {
    /// Create an adapter with the default base URL.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_base_url(transport, DEFAULT_BASE_URL)
    }

    /// Create an adapter with a custom base URL.
    pub fn with_base_url(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            seed: None,
        }
    }

    /// Use a fixed seed instead of a random one.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Get the base URL for this adapter.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the image URL for a prompt.
    pub fn image_url(&self, model: &str, prompt: &str, seed: u32) -> String {
        format!(
            "{}/prompt/{}?width={WIDTH}&height={HEIGHT}&seed={seed}&nologo=true&model={}",
            self.base_url,
            urlencoding::encode(prompt),
            urlencoding::encode(model),
        )
    }

    fn next_seed(&self) -> u32 {
        self.seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..SEED_RANGE))
    }
}

#[async_trait]
impl ImageAdapter for PollinationsAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::DirectUrl
    }

    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        _credential: Option<&ApiKey>,
    ) -> Result<ImagePayload, AttemptError> {
        let url = self.image_url(model, prompt, self.next_seed());

        let response = self
            .transport
            .send(HttpRequest::head(&url))
            .await
            .map_err(|e| AttemptError::transport(model, e.to_string()))?;

        if !response.is_success() {
            return Err(AttemptError::fatal(
                model,
                format!("image generation failed (status {})", response.status),
            ));
        }

        debug!(model, "pollinations image ready");
        Ok(ImagePayload::url(url))
    }
}
