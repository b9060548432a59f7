//! Playground configuration management
//!
//! Handles loading configuration from environment variables, TOML files, and CLI arguments.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API root: {0}. Must be an absolute http(s) URL")]
    InvalidApiRoot(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid split percentage: {0}. Must be between 20 and 80")]
    InvalidSplit(u16),

    #[error("Configuration file error: {0}")]
    FileError(String),
}

/// Log levels supported by the playground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Playground configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Root URL of the service being explored
    pub api_root: String,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Directory receiving triggered downloads
    pub download_dir: PathBuf,
    /// File receiving the interactive session's log
    pub log_file: PathBuf,
    /// Initial width of the left panel, in percent
    pub split_percent: u16,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            api_root: "http://localhost:8080".to_string(),
            log_level: LogLevel::Info,
            download_dir: PathBuf::from("."),
            log_file: PathBuf::from("playground.log"),
            split_percent: 36,
        }
    }
}

impl PlaygroundConfig {
    /// Create a new PlaygroundConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration pointing at `api_root`, defaults elsewhere
    pub fn for_api_root(api_root: impl Into<String>) -> Self {
        Self {
            api_root: normalise_api_root(&api_root.into()),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let mut config: PlaygroundConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.api_root = normalise_api_root(&config.api_root);

        config.validate()?;
        Ok(config)
    }

    /// Apply `PLAYGROUND_*` environment variables on top of this configuration
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(root) = std::env::var("PLAYGROUND_API_ROOT") {
            self.api_root = normalise_api_root(&root);
        }
        if let Ok(level) = std::env::var("PLAYGROUND_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Ok(dir) = std::env::var("PLAYGROUND_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }
        if let Ok(file) = std::env::var("PLAYGROUND_LOG_FILE") {
            self.log_file = PathBuf::from(file);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let root = self.api_root.as_str();
        let has_host = root
            .strip_prefix("http://")
            .or_else(|| root.strip_prefix("https://"))
            .map(|rest| !rest.is_empty())
            .unwrap_or(false);
        if !has_host {
            return Err(ConfigError::InvalidApiRoot(self.api_root.clone()));
        }

        if !(20..=80).contains(&self.split_percent) {
            return Err(ConfigError::InvalidSplit(self.split_percent));
        }

        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(root) = &cli.api_root {
            self.api_root = normalise_api_root(root);
        }
        if let Some(log_level) = &cli.log_level {
            if let Ok(level) = LogLevel::from_str(log_level) {
                self.log_level = level;
            }
        }
        if let Some(dir) = &cli.download_dir {
            self.download_dir = dir.clone();
        }
    }
}

/// Strip trailing slashes so route paths can be appended directly
pub fn normalise_api_root(root: &str) -> String {
    root.trim().trim_end_matches('/').to_string()
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// API root override
    pub api_root: Option<String>,
    /// Log level override
    pub log_level: Option<String>,
    /// Download directory override
    pub download_dir: Option<PathBuf>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<PlaygroundConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config_file {
        PlaygroundConfig::from_file(config_path)?
    } else {
        PlaygroundConfig::default()
    };

    config.merge_with_env()?;
    config.merge_with_cli(cli);

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PlaygroundConfig::default();
        assert_eq!(config.api_root, "http://localhost:8080");
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.download_dir, PathBuf::from("."));
        assert_eq!(config.log_file, PathBuf::from("playground.log"));
        assert_eq!(config.split_percent, 36);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);

        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(format!("{}", LogLevel::Trace), "trace");
        assert_eq!(format!("{}", LogLevel::Warn), "warn");
    }

    #[test]
    fn test_validate_api_root() {
        let mut config = PlaygroundConfig::default();
        config.api_root = "localhost:8080".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidApiRoot(_))));

        config.api_root = "http://".to_string();
        assert!(config.validate().is_err());

        config.api_root = "https://api.example.com".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_split() {
        let mut config = PlaygroundConfig::default();
        config.split_percent = 10;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSplit(10))));

        config.split_percent = 80;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalise_api_root() {
        assert_eq!(normalise_api_root("http://host:1/"), "http://host:1");
        assert_eq!(normalise_api_root(" http://host:1// "), "http://host:1");
    }

    #[test]
    fn test_cli_args_merge() {
        let mut config = PlaygroundConfig::default();
        let cli = CliArgs {
            api_root: Some("http://10.0.0.1:9000/".to_string()),
            log_level: Some("debug".to_string()),
            download_dir: Some(PathBuf::from("/tmp/downloads")),
            config_file: None,
        };

        config.merge_with_cli(&cli);

        assert_eq!(config.api_root, "http://10.0.0.1:9000");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.download_dir, PathBuf::from("/tmp/downloads"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            api_root = "http://127.0.0.1:3000"
            log_level = "debug"
            download_dir = "out"
            log_file = "session.log"
            split_percent = 50
        "#;

        let config: PlaygroundConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_root, "http://127.0.0.1:3000");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.download_dir, PathBuf::from("out"));
        assert_eq!(config.log_file, PathBuf::from("session.log"));
        assert_eq!(config.split_percent, 50);
    }

    #[test]
    fn test_partial_toml_deserialization() {
        let config: PlaygroundConfig = toml::from_str(r#"split_percent = 40"#).unwrap();
        // Should use defaults for unspecified fields
        assert_eq!(config.api_root, "http://localhost:8080");
        assert_eq!(config.split_percent, 40);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_from_file_normalises_root() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"api_root = "http://svc:8080/""#).unwrap();

        let config = PlaygroundConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_root, "http://svc:8080");
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_root = ").unwrap();

        let err = PlaygroundConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidApiRoot("x".to_string());
        assert!(err.to_string().contains("Invalid API root"));

        let err = ConfigError::InvalidLogLevel("bad".to_string());
        assert!(err.to_string().contains("Invalid log level"));
    }
}
