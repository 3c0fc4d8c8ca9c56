// src/infrastructure/config.rs
use crate::constants::{AUTOSAVE_DEBOUNCE_MS, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// TOML configuration of the console
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EditorConfig {
    #[serde(default = "default_autosave_ms")]
    pub autosave_ms: u64,
}

// Default value functions
fn default_base_url() -> String { DEFAULT_API_URL.to_string() }
fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_autosave_ms() -> u64 { AUTOSAVE_DEBOUNCE_MS }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_ms: default_autosave_ms(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse TOML config")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }
        std::fs::write(path.as_ref(), toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// `<config dir>/ctfdesk/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ctfdesk").join("config.toml"))
    }

    /// Loads an explicitly given file, else the default file if present, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!(?path, "Loading config from explicit path");
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!(?path, "Loading config from default location");
                Self::load(path)
            }
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Flag or environment value wins over the file
    pub fn with_api_url(mut self, api_url: Option<&str>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        self
    }

    pub fn autosave_quiet(&self) -> Duration {
        Duration::from_millis(self.editor.autosave_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
