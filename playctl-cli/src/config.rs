use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stream_session::SessionConfig;
use tracing::debug;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub colored_output: bool,
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            colored_output: true,
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// `<config_dir>/playctl/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("playctl").join("config.toml"))
    }

    pub fn resolve_path(path: Option<&Path>) -> Option<PathBuf> {
        path.map(Path::to_path_buf).or_else(Self::default_path)
    }

    /// Load the configuration, falling back to defaults when the file does
    /// not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_path(path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn apply_overrides(&mut self, endpoint: Option<String>, timeout: Option<u64>) {
        if let Some(endpoint) = endpoint {
            self.session.lookup_endpoint = endpoint;
        }
        if let Some(timeout) = timeout {
            self.session.request_timeout_secs = timeout;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.session
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
