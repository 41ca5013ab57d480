//! Dashboard configuration, built once at startup and shared read-only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default backend origin (local backend server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("parse config: {0}")]
    Parse(String),

    #[error("invalid base url '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the pollers, the client and the exporter need to know.
///
/// Loaded from TOML; every field has a default so an empty file is valid:
///
/// ```toml
/// base_url = "http://localhost:8000"
/// poll_interval_ms = 5000
/// countdown_secs = 5
/// request_timeout_ms = 30000
/// report_dir = "out"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub countdown_secs: u32,
    /// 0 disables the request timeout.
    pub request_timeout_ms: u64,
    pub report_dir: PathBuf,
    /// Command used to open report URLs in a browser; platform default when unset.
    pub opener: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 5_000,
            countdown_secs: 5,
            request_timeout_ms: 30_000,
            report_dir: PathBuf::from("out"),
            opener: None,
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Load from an explicit path, else from the default location if that
    /// file exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/deskview/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("deskview").join("config.toml"))
    }

    /// Replace the base url (command-line override) and re-validate.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        self.base_url = base_url.into();
        self.validated()
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".into()));
        }
        if self.countdown_secs == 0 {
            return Err(ConfigError::Invalid("countdown_secs must be > 0".into()));
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    /// Refresh period in whole seconds, for display.
    pub fn refresh_secs(&self) -> u64 {
        (self.poll_interval_ms / 1_000).max(1)
    }
}
