//! Error types for image generation.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside a single generation attempt.
///
/// Attempt-level failures are [`AttemptError`](crate::providers::AttemptError)s
/// and are folded into a [`GenerationOutcome`](crate::GenerationOutcome) by the
/// orchestrator; callers of `generate` never see them directly.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to access the system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// Credential value rejected before storing.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Generation requested without a prompt.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// Registry definition is inconsistent.
    #[error("invalid provider registry: {0}")]
    InvalidRegistry(String),

    /// Request failed at the transport level.
    #[error("request failed: {0}")]
    Request(String),

    /// Image payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
