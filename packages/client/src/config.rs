//! Client settings, loaded from TOML.
//!
//! ```toml
//! api_base_url = "https://api.datawrapper.de/v3"
//! token_file = "auth.txt"
//! request_timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ClientError;
use crate::auth::TOKEN_FILE;

fn default_api_base_url() -> String {
    "https://api.datawrapper.de/v3".to_string()
}

fn default_token_file() -> PathBuf {
    PathBuf::from(TOKEN_FILE)
}

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Datawrapper client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// File the API token is read from when none is given explicitly.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token_file: default_token_file(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Parses a config from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the TOML is malformed or has
    /// unknown keys.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ClientError> {
        toml::from_str(toml_str).map_err(|e| ClientError::Config {
            message: e.to_string(),
        })
    }

    /// Reads a config file.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Io`] if the file cannot be read
    /// * any error from [`Self::from_toml_str`]
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Joins an API path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.token_file, PathBuf::from("auth.txt"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.url("charts/abc12/data"),
            "https://api.datawrapper.de/v3/charts/abc12/data"
        );
    }

    #[test]
    fn overrides() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_base_url = "http://localhost:9000/v3/"
            request_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.url("/charts"), "http://localhost:9000/v3/charts");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            ClientConfig::from_toml_str("token = \"abc\""),
            Err(ClientError::Config { .. })
        ));
    }

    #[test]
    fn reads_from_file() {
        let path = std::env::temp_dir().join("dw_graphics_client_config.toml");
        std::fs::write(&path, "request_timeout_secs = 12\n").unwrap();
        let config = ClientConfig::from_path(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 12);
        std::fs::remove_file(&path).unwrap();
    }
}
