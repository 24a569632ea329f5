//! Configuration loading and validation for Baton.
//!
//! Loads `~/.baton/config.toml` with environment variable overrides for the
//! completion credentials. Every field has a default, so an absent file is a
//! fully working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.baton/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reasoning loop limits
    #[serde(default)]
    pub engine: EngineConfig,

    /// Tool dispatch behavior
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Event stream settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// Completion client settings
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Iteration budget per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Delegation depth bound; 0 disables sub-agents entirely
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_max_depth() -> u32 {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-attempt tool timeout in milliseconds; 0 disables the bound
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts after a failed tool call
    #[serde(default)]
    pub max_retries: u32,

    /// Cap on truncatable list fields in tool results; absent = no cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate_items: Option<usize>,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: 0,
            truncate_items: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Bounded event channel capacity
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Viewer level for filtered output: "full", "summary", or "hidden"
    #[serde(default = "default_viewer")]
    pub viewer: String,
}

fn default_capacity() -> usize {
    128
}
fn default_viewer() -> String {
    "summary".into()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            viewer: default_viewer(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Model identifier, informational for replayed runs
    #[serde(default = "default_model")]
    pub model: String,

    /// API key for a live completion client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "replay".into()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
        }
    }
}

/// Redact a secret for Debug output.
fn redact(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.baton/config.toml).
    ///
    /// Environment overrides, applied after the file:
    /// - `BATON_API_KEY` fills `completion.api_key` when the file left it out
    /// - `BATON_MODEL` replaces `completion.model`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.completion.api_key.is_none() {
            config.completion.api_key = std::env::var("BATON_API_KEY").ok();
        }
        if let Ok(model) = std::env::var("BATON_MODEL") {
            config.completion.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path. A missing file yields
    /// the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".baton")
    }

    /// Validate the configuration with field-level messages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_iterations must be at least 1".into(),
            ));
        }

        if self.stream.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "stream.capacity must be at least 1".into(),
            ));
        }

        if !matches!(self.stream.viewer.as_str(), "full" | "summary" | "hidden") {
            return Err(ConfigError::ValidationError(format!(
                "stream.viewer must be 'full', 'summary', or 'hidden', got '{}'",
                self.stream.viewer
            )));
        }

        if self.dispatch.truncate_items == Some(0) {
            return Err(ConfigError::ValidationError(
                "dispatch.truncate_items must be at least 1 when set".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            dispatch: DispatchConfig::default(),
            stream: StreamConfig::default(),
            completion: CompletionConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.max_iterations, 10);
        assert_eq!(config.engine.max_depth, 2);
        assert_eq!(config.dispatch.timeout_ms, 30_000);
        assert_eq!(config.stream.viewer, "summary");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.engine.max_iterations, config.engine.max_iterations);
        assert_eq!(parsed.stream.capacity, config.stream.capacity);
    }

    #[test]
    fn partial_files_fall_back_to_defaults_per_field() {
        let config: AppConfig = toml::from_str("[engine]\nmax_iterations = 3\n").unwrap();
        assert_eq!(config.engine.max_iterations, 3);
        assert_eq!(config.engine.max_depth, 2);
        assert_eq!(config.stream.capacity, 128);
    }

    #[test]
    fn zero_iterations_rejected() {
        let config: AppConfig = toml::from_str("[engine]\nmax_iterations = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_iterations"));
    }

    #[test]
    fn unknown_viewer_rejected() {
        let config: AppConfig = toml::from_str("[stream]\nviewer = \"loud\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn zero_truncate_items_rejected() {
        let config: AppConfig = toml::from_str("[dispatch]\ntruncate_items = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.engine.max_iterations, 10);
    }

    #[test]
    fn load_from_reads_and_validates_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nmax_iterations = 5\nmax_depth = 1").unwrap();
        writeln!(file, "[completion]\nmodel = \"test-model\"").unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.engine.max_iterations, 5);
        assert_eq!(config.engine.max_depth, 1);
        assert_eq!(config.completion.model, "test-model");
    }

    #[test]
    fn invalid_file_is_a_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stream]\nviewer = \"everything\"").unwrap();

        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn debug_output_redacts_the_api_key() {
        let config = AppConfig {
            completion: CompletionConfig {
                model: "live".into(),
                api_key: Some("sk-very-secret".into()),
            },
            ..AppConfig::default()
        };

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_iterations"));
        assert!(toml_str.contains("summary"));
    }
}
