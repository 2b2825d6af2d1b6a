//! Client configuration.
//!
//! These are the settings the SDK itself needs. Loading them from a file is
//! left to the binary.

use serde::{Deserialize, Serialize};
use url::Url;

/// Marketplace the client talks to unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "https://lzt.market";

/// Browser identity sent with every request. The session cookies were
/// issued to a desktop Chrome, so the requests keep looking like one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// What to do when an SBP payment is requested without a phone number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhonePolicy {
    /// Fill in a random `+79XXXXXXXXX` number and log a warning.
    #[default]
    Synthesize,
    /// Reject the request with a validation error.
    Require,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root URL of the marketplace, e.g. `https://lzt.market`.
    ///
    /// Endpoints are joined as absolute paths, so any path on this URL is
    /// replaced rather than prefixed.
    pub base_url: Url,
    pub user_agent: String,
    pub phone_policy: PhonePolicy,
}

impl ClientConfig {
    /// Configuration for `base_url` with the default browser identity and
    /// phone policy.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            phone_policy: PhonePolicy::default(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_phone_policy(mut self, phone_policy: PhonePolicy) -> Self {
        self.phone_policy = phone_policy;
        self
    }
}

impl Default for ClientConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_BASE_URL).expect("valid default base url"))
    }
}
