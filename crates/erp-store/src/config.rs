//! Client configuration
//!
//! The only externally configurable behavior is the backend base URL, resolved
//! once at startup from environment variables.

use crate::error::NetworkError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Base URL used when no variable is set
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Variables consulted for the base URL, in preference order
pub const BASE_URL_VARS: [&str; 3] = ["ERP_API_URL", "API_BASE_URL", "API_URL"];

/// REST client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Scheme, host and optional path prefix the `/api` routes hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl ClientConfig {
    /// Configuration pointing at `base_url`
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Resolve from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` for variable access.
    ///
    /// The first of [`BASE_URL_VARS`] with a non-blank value wins; otherwise
    /// [`DEFAULT_BASE_URL`].
    #[must_use]
    pub fn resolve_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = BASE_URL_VARS
            .iter()
            .copied()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .unwrap_or_else(default_base_url);
        Self { base_url }
    }

    /// Parse the base URL
    ///
    /// # Errors
    /// - `NetworkError::InvalidBaseUrl` if it is not an absolute http(s) URL
    pub fn parsed_base_url(&self) -> Result<Url, NetworkError> {
        let invalid = |reason: String| NetworkError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) base url".to_string()));
        }
        Ok(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
