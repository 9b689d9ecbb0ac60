//! CLI settings
//!
//! Layered from built-in defaults, an optional TOML/YAML file and
//! `SESSIONGUARD__SECTION__KEY` environment variables, in that order.

use crate::state_dir::StateDir;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use sessionguard_http::ClientConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// Backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    /// Per-request timeout in seconds (0 = none)
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Session document; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings, reading `file` if given or the default config file if it exists
    pub fn load(file: Option<&Path>, state_dir: &StateDir) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("log.level", defaults.log.level)?
            .set_default("log.json", defaults.log.json)?;

        match file {
            Some(path) => builder = builder.add_source(File::from(path)),
            None => {
                let fallback = state_dir.default_config_file();
                if fallback.exists() {
                    builder = builder.add_source(File::from(fallback).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("SESSIONGUARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.api.base_url);
        match self.api.timeout_secs {
            0 => config,
            secs => config.with_timeout(Duration::from_secs(secs)),
        }
    }

    pub fn session_path(&self, state_dir: &StateDir) -> PathBuf {
        self.session
            .path
            .clone()
            .unwrap_or_else(|| state_dir.session_file())
    }
}
