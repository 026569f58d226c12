//! Core types for image generation.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier of a registered provider (e.g. `nanobanana`, `pollinations`).
///
/// # Examples
///
/// ```
/// use timelens_imagegen::ProviderId;
///
/// let id = ProviderId::new("pollinations");
/// assert_eq!(id.as_str(), "pollinations");
/// assert_eq!(id.to_string(), "pollinations");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Create a provider id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Category of credential. At most one secret is stored per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    /// Google Gemini key, shared by every Gemini image model.
    Gemini,
    /// OpenAI key for the images API.
    #[serde(rename = "openai")]
    OpenAi,
}

impl CredentialType {
    /// All known credential types.
    pub const ALL: [CredentialType; 2] = [CredentialType::Gemini, CredentialType::OpenAi];

    /// Storage key for this credential type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::Gemini => "gemini",
            CredentialType::OpenAi => "openai",
        }
    }

    /// Environment variable consulted when env fallback is enabled.
    pub fn env_var(&self) -> &'static str {
        match self {
            CredentialType::Gemini => "GEMINI_API_KEY",
            CredentialType::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(CredentialType::Gemini),
            "openai" => Ok(CredentialType::OpenAi),
            other => Err(Error::InvalidCredential(format!(
                "unknown credential type: {other}"
            ))),
        }
    }
}

/// Backend family a provider talks to. Selects the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Image rendered from a templated URL, no credential.
    DirectUrl,
    /// Credential-gated model returning mixed text and inline image parts.
    Multimodal,
    /// Credential-gated image endpoint returning base64 images.
    ImageApi,
}

/// A generated image, either a remote URL or inline base64 data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImagePayload {
    /// Image hosted at a URL.
    Url { url: String },
    /// Base64-encoded image bytes.
    Inline { mime_type: String, data: String },
}

impl ImagePayload {
    /// Create a URL payload.
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// Create an inline payload from base64 data.
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Inline {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Displayable URI: the URL itself or a `data:` URI.
    pub fn as_uri(&self) -> String {
        match self {
            ImagePayload::Url { url } => url.clone(),
            ImagePayload::Inline { mime_type, data } => {
                format!("data:{mime_type};base64,{data}")
            }
        }
    }

    /// Decode inline image bytes. URLs have to be fetched instead.
    pub fn decode(&self) -> Result<Vec<u8>> {
        match self {
            ImagePayload::Url { url } => Err(Error::Decode(format!(
                "image is hosted remotely and must be fetched: {url}"
            ))),
            ImagePayload::Inline { data, .. } => STANDARD
                .decode(data.as_bytes())
                .map_err(|e| Error::Decode(e.to_string())),
        }
    }

    /// File extension matching the image type.
    pub fn extension(&self) -> &'static str {
        match self {
            // pollinations serves JPEG
            ImagePayload::Url { .. } => "jpg",
            ImagePayload::Inline { mime_type, .. } => match mime_type.as_str() {
                "image/jpeg" | "image/jpg" => "jpg",
                "image/webp" => "webp",
                "image/gif" => "gif",
                _ => "png",
            },
        }
    }

    /// Whether the payload carries no usable reference.
    pub fn is_empty(&self) -> bool {
        match self {
            ImagePayload::Url { url } => url.is_empty(),
            ImagePayload::Inline { data, .. } => data.is_empty(),
        }
    }
}

/// Which provider a request should use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderChoice {
    /// Pick the best provider for the stored credentials.
    #[default]
    Auto,
    /// Use the named provider.
    Explicit(ProviderId),
}

impl FromStr for ProviderChoice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            Ok(ProviderChoice::Auto)
        } else {
            Ok(ProviderChoice::Explicit(ProviderId::new(s)))
        }
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderChoice::Auto => f.write_str("auto"),
            ProviderChoice::Explicit(id) => write!(f, "{id}"),
        }
    }
}

/// A single image generation request.
///
/// The prompt is guaranteed non-empty; construct with [`GenerationRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    choice: ProviderChoice,
}

impl GenerationRequest {
    /// Create a request.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyPrompt` if the prompt is empty or only whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use timelens_imagegen::{GenerationRequest, ProviderChoice};
    ///
    /// let request = GenerationRequest::new("a Roman forum at noon", ProviderChoice::Auto).unwrap();
    /// assert_eq!(request.prompt(), "a Roman forum at noon");
    /// assert!(GenerationRequest::new("   ", ProviderChoice::Auto).is_err());
    /// ```
    pub fn new(prompt: impl Into<String>, choice: ProviderChoice) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(Error::EmptyPrompt);
        }
        Ok(Self { prompt, choice })
    }

    /// The prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The provider selection.
    pub fn choice(&self) -> &ProviderChoice {
        &self.choice
    }
}

/// Why a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Provider needs a credential that is not stored.
    MissingCredential,
    /// Provider id is not registered.
    InvalidProvider,
    /// Every model candidate reported quota exhaustion.
    QuotaExhausted,
    /// Backend rejected the request or returned no image.
    BackendRejected,
    /// Network-level failure.
    Transport,
    /// Another request was already in flight.
    Busy,
}

/// Terminal result of one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// An image was produced.
    Success {
        provider_id: ProviderId,
        model: String,
        image: ImagePayload,
        generated_at: DateTime<Utc>,
    },
    /// No image was produced.
    Failure {
        kind: FailureKind,
        reason: String,
        last_provider: ProviderId,
        last_model: Option<String>,
    },
}

impl GenerationOutcome {
    /// Whether the outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }

    /// Failure kind, if this is a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            GenerationOutcome::Failure { kind, .. } => Some(*kind),
            GenerationOutcome::Success { .. } => None,
        }
    }

    /// Failure reason, if this is a failure.
    pub fn reason(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Failure { reason, .. } => Some(reason),
            GenerationOutcome::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_serializes_as_string() {
        let id = ProviderId::new("gemini3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"gemini3\"");
    }

    #[test]
    fn credential_type_parses_aliases() {
        assert_eq!(
            "Gemini".parse::<CredentialType>().unwrap(),
            CredentialType::Gemini
        );
        assert_eq!(
            "google".parse::<CredentialType>().unwrap(),
            CredentialType::Gemini
        );
        assert_eq!(
            "openai".parse::<CredentialType>().unwrap(),
            CredentialType::OpenAi
        );
        assert!("stability".parse::<CredentialType>().is_err());
    }

    #[test]
    fn provider_choice_parses_auto_and_ids() {
        assert_eq!(
            "auto".parse::<ProviderChoice>().unwrap(),
            ProviderChoice::Auto
        );
        assert_eq!("AUTO".parse::<ProviderChoice>().unwrap(), ProviderChoice::Auto);
        assert_eq!(
            "openai".parse::<ProviderChoice>().unwrap(),
            ProviderChoice::Explicit(ProviderId::new("openai"))
        );
    }

    #[test]
    fn request_rejects_blank_prompt() {
        assert!(matches!(
            GenerationRequest::new("", ProviderChoice::Auto),
            Err(Error::EmptyPrompt)
        ));
        assert!(matches!(
            GenerationRequest::new(" \n\t", ProviderChoice::Auto),
            Err(Error::EmptyPrompt)
        ));
    }

    #[test]
    fn inline_payload_builds_data_uri() {
        let payload = ImagePayload::inline("image/png", "aGVsbG8=");
        assert_eq!(payload.as_uri(), "data:image/png;base64,aGVsbG8=");
        assert_eq!(payload.decode().unwrap(), b"hello");
        assert_eq!(payload.extension(), "png");
    }

    #[test]
    fn url_payload_cannot_be_decoded_locally() {
        let payload = ImagePayload::url("https://example.com/a.jpg");
        assert_eq!(payload.as_uri(), "https://example.com/a.jpg");
        assert!(matches!(payload.decode(), Err(Error::Decode(_))));
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let payload = ImagePayload::inline("image/png", "not base64!!");
        assert!(matches!(payload.decode(), Err(Error::Decode(_))));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = GenerationOutcome::Failure {
            kind: FailureKind::MissingCredential,
            reason: "missing credential for provider: openai".to_string(),
            last_provider: ProviderId::new("openai"),
            last_model: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "missing_credential");
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::MissingCredential));
    }
}
