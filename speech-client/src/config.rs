use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, SpeechError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend used when the caller does not name one
    #[serde(default = "default_backend")]
    pub default_backend: String,

    /// Backend-specific configuration (backend name -> settings)
    #[serde(default)]
    pub backends: HashMap<String, BackendConfig>,
}

fn default_backend() -> String {
    "edge-tts".to_string()
}

/// Backend-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Path to CLI binary (for the edge-tts backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_path: Option<PathBuf>,

    /// Speaking rate adjustment, e.g. "+10%"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,

    /// Volume adjustment, e.g. "-5%"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| SpeechError::Config("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/cli-programs/speech.toml"))
    }

    /// Backend to use: the caller's choice if given, else `default_backend`
    pub fn resolve_backend<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.default_backend)
    }

    /// Get backend config by backend name
    pub fn get_backend_config(&self, backend: &str) -> Option<&BackendConfig> {
        self.backends.get(backend)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_backend: default_backend(),
            backends: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_backend, "edge-tts");
        assert!(config.backends.is_empty());
        assert!(config.get_backend_config("edge-tts").is_none());
    }

    #[test]
    fn test_parse_backend_section() {
        let toml_str = r#"
default_backend = "edge-tts"

[backends.edge-tts]
cli_path = "/opt/edge/bin/edge-tts"
rate = "+10%"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let backend = config.get_backend_config("edge-tts").unwrap();
        assert_eq!(backend.cli_path, Some(PathBuf::from("/opt/edge/bin/edge-tts")));
        assert_eq!(backend.rate.as_deref(), Some("+10%"));
        assert!(backend.volume.is_none());
    }

    #[test]
    fn test_default_backend_is_the_fallback() {
        let config: Config = toml::from_str("default_backend = \"edge\"").unwrap();
        assert_eq!(config.resolve_backend(None), "edge");
        assert_eq!(config.resolve_backend(Some("edge-tts")), "edge-tts");
        assert_eq!(Config::default().resolve_backend(None), "edge-tts");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_backend, config.default_backend);
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path().unwrap();
        assert!(
            path.to_string_lossy()
                .contains(".config/cli-programs/speech.toml")
        );
    }
}
