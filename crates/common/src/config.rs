//! API configuration
//!
//! Loaded from an optional TOML file and overridden by CLI flags and the
//! `CLOUDSCALE_API_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Default API endpoint
pub const DEFAULT_API_URL: &str = "https://api.cloudscale.ch/v1/";

/// Default per-request timeout in seconds
pub const DEFAULT_API_TIMEOUT: u64 = 30;

/// Polls for asynchronous state changes may take this many request timeouts.
pub const WAIT_TIMEOUT_FACTOR: u32 = 2;

/// Bearer token. Never printed, never logged.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// Connection settings for the cloudscale.ch API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API
    pub api_url: String,

    /// Bearer token
    #[serde(skip_serializing)]
    pub api_token: Option<ApiToken>,

    /// Per-request timeout in seconds
    pub api_timeout: u64,

    /// Compute changes without performing them
    pub check_mode: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            api_timeout: DEFAULT_API_TIMEOUT,
            check_mode: false,
        }
    }
}

impl ApiConfig {
    /// Load configuration from file, falling back to defaults when the file
    /// does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Check the settings and normalise the base URL
    pub fn validate(mut self) -> Result<Self> {
        match &self.api_token {
            Some(token) if !token.is_empty() => {}
            _ => {
                return Err(Error::InvalidConfig(
                    "api_token is required (or set CLOUDSCALE_API_TOKEN)".to_string(),
                ))
            }
        }

        if self.api_timeout == 0 {
            return Err(Error::InvalidConfig(
                "api_timeout must be greater than zero".to_string(),
            ));
        }

        if !self.api_url.ends_with('/') {
            self.api_url.push('/');
        }
        Url::parse(&self.api_url)?;

        Ok(self)
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.api_url)?)
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout)
    }

    /// Deadline budget for asynchronous state changes
    pub fn wait_timeout(&self) -> Duration {
        self.request_timeout() * WAIT_TIMEOUT_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ApiConfig::load(&tmp.path().join("absent.toml")).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_timeout, 30);
        assert!(!config.check_mode);
        assert_eq!(config.wait_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_from_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cloudscale.toml");
        std::fs::write(
            &path,
            "api_url = \"https://api.example.test/v1\"\napi_token = \"secret\"\napi_timeout = 5\n",
        )
        .unwrap();

        let config = ApiConfig::load(&path).unwrap().validate().unwrap();
        assert_eq!(config.api_url, "https://api.example.test/v1/");
        assert_eq!(config.api_token.as_ref().map(ApiToken::expose), Some("secret"));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_requires_token() {
        let err = ApiConfig::default().validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = ApiToken::new("very-secret");
        assert_eq!(format!("{:?}", token), "ApiToken(***)");
    }
}
