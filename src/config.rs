use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "tgdoc.toml";

/// Main configuration for tgdoc
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
}

/// Connection to the MTProto session gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Base URL of the session gateway
    pub gateway_url: String,
    /// Bearer token, either literal or "env:VAR_NAME" to read from the environment
    pub api_key: Option<String>,
    /// Timeout for individual (non-download) gateway calls
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8081".into(),
            api_key: None,
            request_timeout_secs: 30,
        }
    }
}

impl TelegramConfig {
    /// Resolve the API key, supporting "env:VAR_NAME" syntax
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.as_ref().and_then(|key| {
            if let Some(var_name) = key.strip_prefix("env:") {
                std::env::var(var_name).ok()
            } else if key.is_empty() {
                None
            } else {
                Some(key.clone())
            }
        })
    }
}

/// Configuration for channel discovery and document search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Entities requested from the global search per keyword
    pub channel_limit_per_keyword: usize,
    /// Messages inspected per channel
    pub messages_limit_per_channel: usize,
    /// Keywords used when the caller supplies none
    pub fallback_keywords: Vec<String>,
    /// Seconds added on top of every mandated flood wait
    pub flood_margin_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            channel_limit_per_keyword: 10,
            messages_limit_per_channel: 30,
            fallback_keywords: vec![],
            flood_margin_secs: 5,
        }
    }
}

/// HTTP front end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the given file, or the default location if it exists.
    ///
    /// An explicitly named file must exist; the default one is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let candidates = [PathBuf::from(CONFIG_FILE), Self::user_config_path()];
                match candidates.iter().find(|p| p.is_file()) {
                    Some(p) => Self::load(p),
                    None => Ok(Self::default()),
                }
            }
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Per-user config location (e.g. `~/.config/tgdoc/tgdoc.toml`)
    pub fn user_config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "tgdoc", "tgdoc")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }
}
