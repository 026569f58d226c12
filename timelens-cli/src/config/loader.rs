use super::types::{
    CredentialsConfig, DEFAULT_PROVIDER, DEFAULT_SERVICE_NAME, DEFAULT_TIMEOUT_SECS,
    GenerationConfig, HttpConfig, RawCredentialsConfig, RawEndpointsConfig, RawGenerationConfig,
    RawHttpConfig, RawTimelensConfig, TimelensConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use timelens_imagegen::providers::Endpoints;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<TimelensConfig> {
        Self::load_layers(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Get user config path (`$XDG_CONFIG_HOME/timelens/config.toml` or similar)
    pub fn user_config_path() -> PathBuf {
        timelens_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with TIMELENS_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("TIMELENS_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".timelens/config.toml")
        }
    }

    /// Load two layers, the second overriding the first. Missing files are skipped.
    pub fn load_layers(user_path: &Path, project_path: &Path) -> Result<TimelensConfig> {
        let mut raw = RawTimelensConfig::default();

        // Layer 1: User config
        if let Some(user_config) = Self::read_raw(user_path)? {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<Option<RawTimelensConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawTimelensConfig, overlay: RawTimelensConfig) -> RawTimelensConfig {
        RawTimelensConfig {
            generation: RawGenerationConfig {
                default_provider: overlay
                    .generation
                    .default_provider
                    .or(base.generation.default_provider),
                output_dir: overlay.generation.output_dir.or(base.generation.output_dir),
            },
            http: RawHttpConfig {
                timeout_secs: overlay.http.timeout_secs.or(base.http.timeout_secs),
            },
            credentials: RawCredentialsConfig {
                service_name: overlay
                    .credentials
                    .service_name
                    .or(base.credentials.service_name),
                env_fallback: overlay
                    .credentials
                    .env_fallback
                    .or(base.credentials.env_fallback),
            },
            endpoints: RawEndpointsConfig {
                pollinations: overlay.endpoints.pollinations.or(base.endpoints.pollinations),
                gemini: overlay.endpoints.gemini.or(base.endpoints.gemini),
                openai: overlay.endpoints.openai.or(base.endpoints.openai),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawTimelensConfig) -> TimelensConfig {
        let endpoints = Endpoints::default();
        TimelensConfig {
            generation: GenerationConfig {
                default_provider: raw
                    .generation
                    .default_provider
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
                output_dir: raw.generation.output_dir,
            },
            http: HttpConfig {
                timeout_secs: raw.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            credentials: CredentialsConfig {
                service_name: raw
                    .credentials
                    .service_name
                    .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
                env_fallback: raw.credentials.env_fallback.unwrap_or(true),
            },
            endpoints: Endpoints {
                pollinations: raw.endpoints.pollinations.unwrap_or(endpoints.pollinations),
                gemini: raw.endpoints.gemini.unwrap_or(endpoints.gemini),
                openai: raw.endpoints.openai.unwrap_or(endpoints.openai),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{contents}").unwrap();
        path
    }

    // ==================== Load Tests ====================

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nonexistent.toml");

        let config = ConfigLoader::load_layers(&missing, &missing).unwrap();

        assert_eq!(config.generation.default_provider, "auto");
        assert_eq!(config.http.timeout_secs, 120);
        assert!(config.credentials.env_fallback);
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    fn test_load_from_valid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            "config.toml",
            r#"
[generation]
default_provider = "pollinations"
output_dir = "/tmp/timelens"

[http]
timeout_secs = 30

[credentials]
env_fallback = false
"#,
        );
        let missing = temp_dir.path().join("none.toml");

        let config = ConfigLoader::load_layers(&path, &missing).unwrap();

        assert_eq!(config.generation.default_provider, "pollinations");
        assert_eq!(
            config.generation.output_dir,
            Some(PathBuf::from("/tmp/timelens"))
        );
        assert_eq!(config.http.timeout_secs, 30);
        assert!(!config.credentials.env_fallback);
        assert_eq!(config.credentials.service_name, "timelens");
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "invalid.toml", "this is not valid toml {{{{");

        let result = ConfigLoader::load_layers(&path, &temp_dir.path().join("none.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_project_layer_overrides_user_layer() {
        let temp_dir = TempDir::new().unwrap();
        let user = write_config(
            &temp_dir,
            "user.toml",
            r#"
[generation]
default_provider = "openai"

[http]
timeout_secs = 45

[endpoints]
gemini = "http://user-proxy"
"#,
        );
        let project = write_config(
            &temp_dir,
            "project.toml",
            r#"
[generation]
default_provider = "nanobanana"
"#,
        );

        let config = ConfigLoader::load_layers(&user, &project).unwrap();

        assert_eq!(config.generation.default_provider, "nanobanana");
        // unset in project, so the user value survives
        assert_eq!(config.http.timeout_secs, 45);
        assert_eq!(config.endpoints.gemini, "http://user-proxy");
        assert_eq!(config.endpoints.openai, Endpoints::default().openai);
    }

    #[test]
    fn test_merge_raw_none_preserves_base() {
        let base = RawTimelensConfig {
            credentials: RawCredentialsConfig {
                service_name: Some("custom".to_string()),
                env_fallback: Some(false),
            },
            ..Default::default()
        };

        let merged = ConfigLoader::merge_raw(base, RawTimelensConfig::default());

        assert_eq!(merged.credentials.service_name.as_deref(), Some("custom"));
        assert_eq!(merged.credentials.env_fallback, Some(false));
    }

    #[test]
    #[serial]
    fn test_project_config_path_env_override() {
        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::set_var("TIMELENS_PROJECT_CONFIG_DIR", "/tmp/tl-project") };
        assert_eq!(
            ConfigLoader::project_config_path(),
            PathBuf::from("/tmp/tl-project/config.toml")
        );

        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::remove_var("TIMELENS_PROJECT_CONFIG_DIR") };
        assert_eq!(
            ConfigLoader::project_config_path(),
            PathBuf::from(".timelens/config.toml")
        );
    }
}
