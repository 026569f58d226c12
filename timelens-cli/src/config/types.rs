use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use timelens_imagegen::providers::Endpoints;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTimelensConfig {
    #[serde(default)]
    pub generation: RawGenerationConfig,

    #[serde(default)]
    pub http: RawHttpConfig,

    #[serde(default)]
    pub credentials: RawCredentialsConfig,

    #[serde(default)]
    pub endpoints: RawEndpointsConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawGenerationConfig {
    /// Provider used when `--provider` is not given
    pub default_provider: Option<String>,

    /// Directory for `generate --save` without a path
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHttpConfig {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCredentialsConfig {
    pub service_name: Option<String>,
    pub env_fallback: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEndpointsConfig {
    pub pollinations: Option<String>,
    pub gemini: Option<String>,
    pub openai: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimelensConfig {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider used when `--provider` is not given ("auto" or a provider id)
    pub default_provider: String,

    /// Directory for `generate --save` without a path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_provider: DEFAULT_PROVIDER.to_string(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds, 0 for the client default
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Keyring service name
    pub service_name: String,

    /// Read GEMINI_API_KEY / OPENAI_API_KEY when the keyring has no entry
    pub env_fallback: bool,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            env_fallback: true,
        }
    }
}

/// Provider used when none is configured
pub const DEFAULT_PROVIDER: &str = "auto";

/// Image backends can take a while to render
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Keyring service name
pub const DEFAULT_SERVICE_NAME: &str = "timelens";
