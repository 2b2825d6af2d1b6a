//! Configuration module for lzpay.
//!
//! Handles loading configuration from the optional TOML file and applying
//! command line overrides.

pub mod file;

use crate::config::file::FileConfig;
use crate::wait::{MAX_TIMEOUT, WaitConfig};
use lzpay_sdk::config::{ClientConfig, PhonePolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./lzpay.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Values given on the command line, taking precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cookies: Option<PathBuf>,
    pub base_url: Option<Url>,
    pub wait_interval_secs: Option<u64>,
    pub wait_timeout_secs: Option<u64>,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub client: ClientConfig,
    pub cookies_path: PathBuf,
    pub wait: WaitConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    overrides: Overrides,
}

impl ConfigLoader {
    /// Create a new config loader.
    ///
    /// Without an explicit path, [`DEFAULT_CONFIG_PATH`] is read if it
    /// exists and defaults are used otherwise.
    pub fn new(config_path: Option<PathBuf>, overrides: Overrides) -> Self {
        Self {
            config_path,
            overrides,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, if any
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = match &self.config_path {
            Some(path) => Self::read(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::read(default_path)?
                } else {
                    tracing::debug!("No config file, using defaults");
                    FileConfig::default()
                }
            }
        };

        self.apply_overrides(&mut file_config);
        self.validate(&file_config)?;
        Ok(Self::build_loaded_config(file_config))
    }

    fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Configuration file read");
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut FileConfig) {
        if let Some(cookies) = &self.overrides.cookies {
            config.session.cookies = cookies.clone();
        }
        if let Some(base_url) = &self.overrides.base_url {
            config.client.base_url = base_url.clone();
        }
        if let Some(interval) = self.overrides.wait_interval_secs {
            config.wait.interval_secs = interval;
        }
        if let Some(timeout) = self.overrides.wait_timeout_secs {
            config.wait.timeout_secs = timeout;
        }
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let scheme = config.client.base_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::ValidationError(format!(
                "base_url must be http or https, got {}",
                config.client.base_url
            )));
        }
        // Endpoints are absolute paths, so a path prefix would be dropped.
        let base_url = &config.client.base_url;
        if base_url.path() != "/" || base_url.query().is_some() || base_url.fragment().is_some() {
            return Err(ConfigError::ValidationError(format!(
                "base_url must be the site root without path or query, got {base_url}"
            )));
        }
        if config.wait.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "wait.interval_secs must be positive".to_string(),
            ));
        }
        if config.wait.timeout_secs < config.wait.interval_secs {
            return Err(ConfigError::ValidationError(format!(
                "wait.timeout_secs ({}) is shorter than wait.interval_secs ({})",
                config.wait.timeout_secs, config.wait.interval_secs
            )));
        }
        if config.wait.timeout_secs > MAX_TIMEOUT.as_secs() {
            return Err(ConfigError::ValidationError(format!(
                "wait.timeout_secs ({}) exceeds the maximum of {}",
                config.wait.timeout_secs,
                MAX_TIMEOUT.as_secs()
            )));
        }
        Ok(())
    }

    fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
        let phone_policy = if file_config.client.require_phone {
            PhonePolicy::Require
        } else {
            PhonePolicy::Synthesize
        };

        LoadedConfig {
            client: ClientConfig::new(file_config.client.base_url)
                .with_user_agent(file_config.client.user_agent)
                .with_phone_policy(phone_policy),
            cookies_path: file_config.session.cookies,
            wait: WaitConfig {
                interval: Duration::from_secs(file_config.wait.interval_secs),
                timeout: Duration::from_secs(file_config.wait.timeout_secs),
            },
        }
    }
}
