//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};

/// Base URL used when `AUTOSHORTS_API_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/autoshorts/v1";

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the generation API, always ending with `/`
    base_url: Url,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8000/autoshorts/v1/")
                .expect("default base URL is valid"),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a config for the given base URL with default timeouts.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Default::default()
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("AUTOSHORTS_API_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            timeout: Duration::from_secs(
                std::env::var("AUTOSHORTS_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("AUTOSHORTS_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }

    /// Replace the base URL, keeping the timeouts.
    pub fn with_base_url(mut self, base_url: &str) -> ClientResult<Self> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path (without leading slash) against the base URL.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::invalid_config(format!("bad endpoint {path}: {e}")))
    }
}

fn normalize_base_url(raw: &str) -> ClientResult<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw)
        .map_err(|e| ClientError::invalid_config(format!("invalid base URL {raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::invalid_config(format!(
            "unsupported scheme {other} in base URL"
        ))),
    }
}
