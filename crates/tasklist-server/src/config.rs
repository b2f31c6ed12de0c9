//! Server configuration
//!
//! Layered with the `config` crate, later sources winning:
//!
//! 1. Built-in defaults
//! 2. An optional file (`.toml`, `.yaml`/`.yml` or `.json`)
//! 3. `TASKLIST_*` environment variables, `__` between nested keys
//!    (`TASKLIST_AUTH__JWKS_URL`, `TASKLIST_LOGGING__JSON=false`)
//!
//! Attachment signing credentials are not part of this document; they come
//! from the standard `AWS_*` variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tasklist_auth::AuthConfig;
use tasklist_core::{AttachmentConfig, StorageConfig};

use crate::logging::LoggingConfig;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "TASKLIST";

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, `host:port`
    pub bind_address: String,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub attachments: AttachmentConfig,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            attachments: AttachmentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// A required setting is empty
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

impl ServerConfig {
    /// Load defaults, then `path` if given, then the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist or has an unsupported extension
    /// - A source contains invalid configuration
    /// - `auth.jwks_url` ends up empty
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading overrides from `env` instead of the
    /// process environment when given
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        use config::{Config, File, FileFormat};

        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }

            let format = match path.extension().and_then(|s| s.to_str()) {
                Some("toml") => FileFormat::Toml,
                Some("yaml" | "yml") => FileFormat::Yaml,
                Some("json") => FileFormat::Json,
                _ => return Err(ConfigError::UnsupportedFormat),
            };

            builder = builder.add_source(File::new(
                path.to_str().ok_or(ConfigError::UnsupportedFormat)?,
                format,
            ));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwks_url.trim().is_empty() {
            return Err(ConfigError::Missing("auth.jwks_url"));
        }
        Ok(())
    }
}
