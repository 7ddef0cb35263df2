//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a small TOML file. Resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `TUTOR_CONFIG` environment variable
//! 3. `<config_dir>/tutor/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing file is not an error: callers get the compiled defaults and a
//! warning. `TUTOR_API_URL` and `TUTOR_API_TOKEN` override the file.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_ENV_VAR: &str = "TUTOR_CONFIG";
pub const API_URL_ENV_VAR: &str = "TUTOR_API_URL";
pub const API_TOKEN_ENV_VAR: &str = "TUTOR_API_TOKEN";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ordering: OrderingConfig,
}

/// Progress-tracking API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token (optional, usually supplied through the environment)
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Canonical display order for subjects and levels
///
/// Values not listed sort after the listed ones, alphabetically.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderingConfig {
    #[serde(default = "default_subject_order")]
    pub subjects: Vec<String>,

    #[serde(default = "default_level_order")]
    pub levels: Vec<String>,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            subjects: default_subject_order(),
            levels: default_level_order(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8051/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_subject_order() -> Vec<String> {
    ["英語", "国語", "数学", "日本史", "世界史", "政治経済", "物理", "化学", "生物"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_level_order() -> Vec<String> {
    ["基礎徹底", "日大", "MARCH", "早慶"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl TomlConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve, load and apply environment overrides
    ///
    /// Missing files fall back to defaults with a warning. A file that exists
    /// but does not parse is still an error.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration");
                Self::load(&path)?
            }
            Some(path) => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => {
                warn!("No config file location available, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `TUTOR_API_URL` / `TUTOR_API_TOKEN` on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
        if let Ok(token) = std::env::var(API_TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                self.api.token = Some(token.trim().to_string());
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(Error::Config("api.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Config file path by priority; `None` when no location can be determined
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// `<config_dir>/tutor/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tutor").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8051/api/v1");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.ordering.levels.len(), 4);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [api]
            timeout_secs = 5

            [ordering]
            subjects = ["Math", "English"]
            "#,
        )
        .unwrap();

        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.base_url, "http://localhost:8051/api/v1");
        assert_eq!(config.ordering.subjects, vec!["Math", "English"]);
        assert!(!config.ordering.levels.is_empty());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = TomlConfig::default();
        config.api.base_url = "localhost:8051".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[api\nbase_url = 1");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
