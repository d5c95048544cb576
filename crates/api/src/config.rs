//! Server Configuration
//!
//! Read from environment variables (after `.env`), with defaults for every
//! field except the optional Google Drive credentials.

use config::{Config, ConfigError, Environment, Source};
use inference_engine::DEFAULT_MODEL;
use serde::Deserialize;
use std::path::PathBuf;

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Verbose logging
    pub debug: bool,
    /// Directory holding model artifacts
    pub models_dir: PathBuf,
    /// Model used when a request names none
    pub default_model: String,
    /// Drive folder to fetch models from when `models_dir` is empty
    pub google_drive_folder_id: Option<String>,
    /// Drive API key
    pub google_drive_api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            debug: false,
            models_dir: PathBuf::from("models"),
            default_model: DEFAULT_MODEL.to_string(),
            google_drive_folder_id: None,
            google_drive_api_key: None,
        }
    }
}

impl ApiConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default().try_parsing(true))
    }

    /// Load from an arbitrary source layered over the defaults
    pub fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("debug", defaults.debug)?
            .set_default("models_dir", defaults.models_dir.to_string_lossy().into_owned())?
            .set_default("default_model", defaults.default_model)?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
