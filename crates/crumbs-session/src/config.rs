//! Configuration for cookie sessions.
//!
//! Accepts either a `[session]` table or bare keys:
//! ```toml
//! [session]
//! cookie_name = "SESSID"
//! path = "/"
//! expires_secs = 3600
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default name of the session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "SESSID";

/// Default cookie path.
pub const DEFAULT_PATH: &str = "/";

/// Default lifetime (0 = browser-session cookie, no renewal window).
pub const DEFAULT_EXPIRES_SECS: u64 = 0;

/// Configuration for a cookie session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie that carries the session payload.
    pub cookie_name: String,

    /// Cookie `Path` attribute.
    pub path: String,

    /// Session lifetime in seconds.
    /// When non-zero, every write pushes the absolute expiry forward by this much
    /// and the cookie carries a matching transport-level expiry.
    pub expires_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            path: DEFAULT_PATH.to_string(),
            expires_secs: DEFAULT_EXPIRES_SECS,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the cookie path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the session lifetime in seconds (0 disables expiry).
    pub fn with_expires_secs(mut self, secs: u64) -> Self {
        self.expires_secs = secs;
        self
    }

    /// Lifetime as a signed offset, if one is configured.
    pub(crate) fn lifetime(&self) -> Option<i64> {
        match self.expires_secs {
            0 => None,
            secs => Some(i64::try_from(secs).unwrap_or(i64::MAX)),
        }
    }

    /// Check that the values can be rendered into a `Set-Cookie` header.
    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.is_empty() {
            return Err(Error::InvalidConfig("cookie_name must not be empty".into()));
        }
        if let Some(bad) = self.cookie_name.chars().find(|c| !is_token_char(*c)) {
            return Err(Error::InvalidConfig(format!(
                "cookie_name '{}' contains invalid character {:?}",
                self.cookie_name, bad
            )));
        }
        if !self.path.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "path '{}' must start with '/'",
                self.path
            )));
        }
        if self.path.chars().any(|c| c == ';' || c.is_control()) {
            return Err(Error::InvalidConfig(format!(
                "path '{}' contains ';' or a control character",
                self.path
            )));
        }
        if i64::try_from(self.expires_secs).is_err() {
            return Err(Error::InvalidConfig(format!(
                "expires_secs {} is out of range",
                self.expires_secs
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut table: toml::Table = toml::from_str(content)?;
        let section = match table.remove("session") {
            Some(toml::Value::Table(section)) => section,
            Some(other) => {
                return Err(Error::InvalidConfig(format!(
                    "[session] must be a table, found {}",
                    other.type_str()
                )));
            }
            None => table,
        };
        let config: SessionConfig = toml::Value::Table(section).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), cookie_name = %config.cookie_name, "Loaded session config");
        Ok(config)
    }
}

/// RFC 6265 cookie-name token characters.
fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c)
}
