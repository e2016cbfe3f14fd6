//! Client configuration
//!
//! Settings are layered: built-in defaults, then an optional `shelf.toml`,
//! then `SHELF_*` environment variables (e.g. `SHELF_API_URL`).

use crate::error::{CoreError, CoreResult};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default backend address used during local development
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable prefix for all settings
pub const ENV_PREFIX: &str = "SHELF";

/// Settings shared by every front end
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL of the REST API, without trailing slash
    pub api_url: String,
    /// Request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientSettings {
    /// Load settings from the environment only
    pub fn from_env() -> CoreResult<Self> {
        Self::load(None)
    }

    /// Load settings, reading `file` first when given
    pub fn load(file: Option<&Path>) -> CoreResult<Self> {
        let mut builder = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let settings: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validated()
    }

    /// Override the API URL (e.g. from a command-line flag)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> CoreResult<Self> {
        self.api_url = api_url.into();
        self.validated()
    }

    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    fn validated(mut self) -> CoreResult<Self> {
        let url = Url::parse(&self.api_url)
            .map_err(|e| CoreError::invalid_config(format!("api_url '{}': {e}", self.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::invalid_config(format!(
                "api_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}
