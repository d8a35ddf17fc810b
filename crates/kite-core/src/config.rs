//! Connector configuration.
//!
//! Settings are validated at load time, with defaults matching a stock
//! local daemon install.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::client::TransportError;

/// Default daemon port.
pub const DEFAULT_PORT: u16 = 46624;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting has an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The transport could not be built from the settings.
    #[error("failed to build transport: {0}")]
    Transport(#[from] TransportError),
}

impl ConfigError {
    /// Creates a validation error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// How the connector reaches the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Daemon host name.
    pub hostname: String,

    /// Daemon port.
    pub port: u16,

    /// Prefix prepended to every request path.
    pub base_path: String,

    /// Use `https` instead of `http`.
    pub tls: bool,

    /// Path probed for reachability.
    pub health_path: String,

    /// Path returning the logged-in user.
    pub user_path: String,

    /// Timeout of the reachability probe.
    #[serde(with = "humantime_serde")]
    pub reachability_timeout: Duration,

    /// Log every request and response at `debug`.
    pub request_debug: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: DEFAULT_PORT,
            base_path: String::new(),
            tls: false,
            health_path: "/settings".to_string(),
            user_path: "/clientapi/user".to_string(),
            reachability_timeout: Duration::from_millis(100),
            request_debug: false,
        }
    }
}

impl ConnectorConfig {
    /// Sets the host name.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the path prefix.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Enables or disables TLS.
    #[must_use]
    pub const fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the reachability probe path.
    #[must_use]
    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    /// Sets the authenticated-user path.
    #[must_use]
    pub fn with_user_path(mut self, path: impl Into<String>) -> Self {
        self.user_path = path.into();
        self
    }

    /// Sets the reachability probe timeout.
    #[must_use]
    pub const fn with_reachability_timeout(mut self, timeout: Duration) -> Self {
        self.reachability_timeout = timeout;
        self
    }

    /// Enables or disables request debug logging.
    #[must_use]
    pub const fn with_request_debug(mut self, enabled: bool) -> Self {
        self.request_debug = enabled;
        self
    }

    /// Returns the base URL, e.g. `http://localhost:46624`.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!(
            "{scheme}://{}:{}{}",
            self.hostname,
            self.port,
            self.base_path.trim_end_matches('/')
        )
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.is_empty() {
            return Err(ConfigError::invalid("hostname cannot be empty"));
        }
        if self.hostname.contains(['/', ' ']) {
            return Err(ConfigError::invalid("hostname must not contain '/' or spaces"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("port must be greater than 0"));
        }
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::invalid("base_path must start with '/'"));
        }
        for (name, path) in [("health_path", &self.health_path), ("user_path", &self.user_path)] {
            if !path.starts_with('/') {
                return Err(ConfigError::invalid(format!("{name} must start with '/'")));
            }
        }
        if self.reachability_timeout.is_zero() {
            return Err(ConfigError::invalid("reachability_timeout must be positive"));
        }
        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}

/// Serde helper for human-readable durations.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
