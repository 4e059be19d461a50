//! Client configuration.
//!
//! [`ClientConfig`] holds every runtime setting.  It can be loaded from a
//! TOML file, where every key is optional:
//!
//! ```toml
//! address = "10.0.0.5:8080"
//! user = "operator"
//! password = "secret"
//! reconnect_interval_secs = 5
//! request_timeout_secs = 30
//! ```
//!
//! The CLI layers its flags on top of the loaded file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Connection settings for one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host:port`, optionally with an `http://` or `https://` scheme.
    pub address: String,
    /// Login user; login is skipped unless both user and password are set.
    pub user: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// Delay before a dropped feed is reconnected.
    pub reconnect_interval_secs: u64,
    /// Per-request timeout for REST calls.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    /// | Field                   | Default           |
    /// |-------------------------|-------------------|
    /// | address                 | `127.0.0.1:8080`  |
    /// | user / password         | unset             |
    /// | reconnect_interval_secs | 5                 |
    /// | request_timeout_secs    | 30                |
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            user: None,
            password: None,
            reconnect_interval_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Default settings pointed at `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid TOML for this struct.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Base URL of the REST API, e.g. `http://10.0.0.5:8080`.
    pub fn base_url(&self) -> String {
        let address = self.address.trim_end_matches('/');
        if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{address}")
        }
    }

    /// WebSocket URL for a feed path, using `wss` when the API uses `https`.
    pub fn feed_url(&self, path: &str) -> String {
        let base = self.base_url();
        let ws_base = match base.strip_prefix("https://") {
            Some(rest) => format!("wss://{rest}"),
            None => format!("ws://{}", base.trim_start_matches("http://")),
        };
        format!("{ws_base}{path}")
    }

    /// `(user, password)` when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// [`Self::reconnect_interval_secs`] as a `Duration`.
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs)
    }

    /// [`Self::request_timeout_secs`] as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address_is_loopback_8080() {
        assert_eq!(ClientConfig::default().address, "127.0.0.1:8080");
    }

    #[test]
    fn test_default_intervals() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.reconnect_interval(), Duration::from_secs(5));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_base_url_adds_http_scheme() {
        assert_eq!(ClientConfig::new("10.0.0.5:8080").base_url(), "http://10.0.0.5:8080");
    }

    #[test]
    fn test_base_url_keeps_scheme_and_strips_trailing_slash() {
        assert_eq!(
            ClientConfig::new("https://rig.lab/").base_url(),
            "https://rig.lab"
        );
    }

    #[test]
    fn test_feed_url_maps_schemes() {
        assert_eq!(
            ClientConfig::new("10.0.0.5:8080").feed_url("/websocket/state"),
            "ws://10.0.0.5:8080/websocket/state"
        );
        assert_eq!(
            ClientConfig::new("https://rig.lab").feed_url("/websocket/applications"),
            "wss://rig.lab/websocket/applications"
        );
    }

    #[test]
    fn test_credentials_require_both_parts() {
        let mut cfg = ClientConfig::default();
        cfg.user = Some("operator".to_string());
        assert_eq!(cfg.credentials(), None);

        cfg.password = Some("secret".to_string());
        assert_eq!(cfg.credentials(), Some(("operator", "secret")));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: ClientConfig = toml::from_str(r#"address = "rig:9000""#).unwrap();
        assert_eq!(cfg.address, "rig:9000");
        assert_eq!(cfg.reconnect_interval_secs, 5);
        assert_eq!(cfg.user, None);
    }

    #[test]
    fn test_load_reads_file() {
        // Arrange
        let path = std::env::temp_dir().join(format!("rigsync-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "address = \"rig:9000\"\nuser = \"op\"\npassword = \"pw\"\n").unwrap();

        // Act
        let cfg = ClientConfig::load(&path);
        let _ = std::fs::remove_file(&path);

        // Assert
        let cfg = cfg.unwrap();
        assert_eq!(cfg.base_url(), "http://rig:9000");
        assert_eq!(cfg.credentials(), Some(("op", "pw")));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ClientConfig::load(Path::new("/nonexistent/rigsync.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let path = std::env::temp_dir().join(format!("rigsync-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "reconnect_interval_secs = \"soon\"").unwrap();

        let result = ClientConfig::load(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }
}
