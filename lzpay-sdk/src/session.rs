//! Browser session cookies.
//!
//! The marketplace authenticates the deposit flow with the cookies of a
//! logged-in browser. They are exported from the browser as a JSON array of
//! cookie objects; only `name` and `value` are used, other keys (`domain`,
//! `path`, `expirationDate`, ...) are ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, error};

/// Errors that can occur while reading a cookie export.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse cookie file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
}

/// Cookie name to value map, read-only once the client is built.
///
/// `Debug` only shows the cookie names.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCookies(BTreeMap<String, String>);

impl SessionCookies {
    /// Read a cookie export, reporting any failure.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, CookieError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json(&content)?)
    }

    /// Read a cookie export, falling back to an empty session.
    ///
    /// The failure is only logged: requests made with an empty session are
    /// rejected by the marketplace and surface as authorization errors.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(cookies) => {
                debug!(path = %path.display(), count = cookies.len(), "Loaded session cookies");
                cookies
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load session cookies");
                Self::default()
            }
        }
    }

    /// Parse a JSON array of `{"name": ..., "value": ...}` objects.
    ///
    /// A later cookie with the same name replaces an earlier one.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let stored: Vec<StoredCookie> = serde_json::from_str(json)?;
        Ok(stored.into_iter().map(|c| (c.name, c.value)).collect())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Value for a `Cookie` request header, `None` for an empty session.
    pub fn header_value(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}

impl FromIterator<(String, String)> for SessionCookies {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {"domain": ".lzt.market", "name": "xf_user", "value": "123%2Cabc", "path": "/", "secure": true},
        {"domain": ".lzt.market", "name": "xf_session", "value": "s3ss10n", "httpOnly": true},
        {"name": "df_id", "value": "d1"}
    ]"#;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("lzpay-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn test_parse_browser_export() {
        let cookies = SessionCookies::from_json(EXPORT).unwrap();
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies.get("xf_session"), Some("s3ss10n"));
        assert_eq!(
            cookies.header_value().unwrap(),
            "df_id=d1; xf_session=s3ss10n; xf_user=123%2Cabc"
        );
    }

    #[test]
    fn test_debug_hides_values() {
        let cookies = SessionCookies::from_json(EXPORT).unwrap();
        let debug = format!("{cookies:?}");
        assert!(debug.contains("xf_session"));
        assert!(!debug.contains("s3ss10n"));
    }

    #[test]
    fn test_load_from_file() {
        let path = temp_path("cookies-ok");
        std::fs::write(&path, EXPORT).unwrap();
        let cookies = SessionCookies::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cookies.get("df_id"), Some("d1"));
    }

    #[test]
    fn test_missing_file_gives_empty_session() {
        let path = temp_path("cookies-missing");
        assert!(matches!(
            SessionCookies::try_load(&path),
            Err(CookieError::Io(_))
        ));
        let cookies = SessionCookies::load(&path);
        assert!(cookies.is_empty());
        assert_eq!(cookies.header_value(), None);
    }

    #[test]
    fn test_malformed_file_gives_empty_session() {
        let path = temp_path("cookies-malformed");
        std::fs::write(&path, r#"{"name": "not an array"}"#).unwrap();
        let result = SessionCookies::try_load(&path);
        let fallback = SessionCookies::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(CookieError::Json(_))));
        assert!(fallback.is_empty());
    }
}
