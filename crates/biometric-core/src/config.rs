//! Configuration file handling
//!
//! Plain TOML, non-sensitive. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{BiometricError, BiometricResult};
use crate::models::PromptConfig;

/// Config directory name under the platform config dir
const CONFIG_DIR: &str = "bioauth";

/// Config file name
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "BIOAUTH_CONFIG";

/// Which host service backs the adapter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceBackend {
    /// Pick the native service for the current platform
    #[default]
    System,
    Fprintd,
    WindowsHello,
    Unsupported,
}

/// fprintd helper settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FprintdConfig {
    /// User whose fingers are checked; `$USER` when unset
    pub user: Option<String>,
    pub list_program: String,
    pub verify_program: String,
}

impl Default for FprintdConfig {
    fn default() -> Self {
        Self {
            user: None,
            list_program: "fprintd-list".to_string(),
            verify_program: "fprintd-verify".to_string(),
        }
    }
}

/// Adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct BiometricConfig {
    pub backend: ServiceBackend,

    /// Prompt used when the caller supplies none
    pub prompt: PromptConfig,

    pub fprintd: FprintdConfig,
}

/// Get the default config directory path
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Get the config file path inside a config directory
pub fn config_file_path(base_dir: &Path) -> PathBuf {
    base_dir.join(CONFIG_FILE)
}

/// Config file path, honouring the environment override
pub fn resolve_config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| config_file_path(&default_config_dir()))
}

/// Load configuration, falling back to defaults when the file is absent
pub async fn load_config(path: &Path) -> BiometricResult<BiometricConfig> {
    if !path.exists() {
        return Ok(BiometricConfig::default());
    }

    let content = fs::read_to_string(path).await?;
    let config: BiometricConfig = toml::from_str(&content)
        .map_err(|e| BiometricError::ConfigError(e.to_string()))?;

    Ok(config)
}

/// Save configuration, creating the parent directory if needed
pub async fn save_config(path: &Path, config: &BiometricConfig) -> BiometricResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| BiometricError::ConfigError(e.to_string()))?;

    fs::write(path, content).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(config, BiometricConfig::default());
        assert_eq!(config.prompt.cancel_label, "Cancel");
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_file_path(&temp_dir.path().join("nested"));

        let mut config = BiometricConfig::default();
        config.backend = ServiceBackend::Fprintd;
        config.prompt = PromptConfig::new("Unlock", "", "Not now");
        config.fprintd.user = Some("alice".to_string());

        save_config(&path, &config).await.unwrap();
        let loaded = load_config(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "backend = \"unsupported\"\n\n[prompt]\ntitle = \"Sign in\"\n")
            .await
            .unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.backend, ServiceBackend::Unsupported);
        assert_eq!(config.prompt.title, "Sign in");
        assert_eq!(config.prompt.cancel_label, "Cancel");
        assert_eq!(config.fprintd.verify_program, "fprintd-verify");
    }

    #[tokio::test]
    async fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "backend = 42").await.unwrap();

        let err = load_config(&path).await.unwrap_err();
        assert!(matches!(err, BiometricError::ConfigError(_)));
    }
}
