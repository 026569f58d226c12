//! Image generation for timelens.
//!
//! This crate provides:
//! - Provider registry with automatic provider selection
//! - Credential storage for API keys
//! - Backend adapters behind a unified interface
//! - An orchestrator that falls back across a provider's models on quota errors
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 ImageOrchestrator                    │
//! │   resolve provider ─▶ load credential ─▶ try models  │
//! └─────────────────────────────────────────────────────┘
//!          │                    │                 │
//!          ▼                    ▼                 ▼
//! ┌────────────────┐  ┌──────────────────┐  ┌─────────────────────────────┐
//! │ProviderRegistry│  │   SecretStore    │  │        ImageAdapter         │
//! │                │  │ (Keyring + Env / │  │ Pollinations│Gemini│OpenAI  │
//! │                │  │     Memory)      │  └─────────────────────────────┘
//! └────────────────┘  └──────────────────┘                │
//!                                                         ▼
//!                                                 ┌───────────────┐
//!                                                 │ HttpTransport │
//!                                                 └───────────────┘
//! ```

mod error;
mod orchestrator;
mod types;

pub mod auth;
pub mod providers;
pub mod registry;
pub mod transport;

pub use error::{Error, Result};
pub use orchestrator::{ImageOrchestrator, OrchestratorState};
pub use registry::{ProviderDescriptor, ProviderRegistry};
pub use types::{
    BackendKind, CredentialType, FailureKind, GenerationOutcome, GenerationRequest, ImagePayload,
    ProviderChoice, ProviderId,
};
