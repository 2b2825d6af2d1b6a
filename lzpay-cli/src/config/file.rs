//! TOML file configuration structures.
//!
//! These structs directly map to the `lzpay.toml` file format. Every key is
//! optional.

use lzpay_sdk::config::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub client: ClientConfig,
    pub session: SessionConfig,
    pub wait: WaitConfig,
}

/// Marketplace connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: Url,
    pub user_agent: String,
    /// Reject SBP payments without a phone number instead of using a
    /// placeholder.
    pub require_phone: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            require_phone: false,
        }
    }
}

fn default_base_url() -> Url {
    DEFAULT_BASE_URL.parse().expect("valid default base url")
}

/// Browser session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie export of a logged-in browser (JSON array of name/value
    /// objects).
    pub cookies: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookies: PathBuf::from("cookies/lolz.json"),
        }
    }
}

/// Polling settings of the `wait` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            timeout_secs: 300,
        }
    }
}
