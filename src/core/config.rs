//! Provider configuration.
//!
//! Settings come from the manifest's `[provider]` table and are overridden by
//! `CPLN_*` environment variables. The token is never written back anywhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants::{
    DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, ENV_ENDPOINT, ENV_ORG, ENV_TIMEOUT, ENV_TOKEN,
};
use crate::core::validation;
use crate::error::{ConfigError, Result};

/// Raw `[provider]` table as written in the manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Prefer `CPLN_TOKEN`; a token in the manifest is accepted for local use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Resolved provider configuration.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Organization all resources live in.
    pub org: String,
    /// API base URL without a trailing slash.
    pub endpoint: String,
    /// API token sent as the `Authorization` header.
    pub token: Zeroizing<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("org", &self.org)
            .field("endpoint", &self.endpoint)
            .field("token", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve settings against the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when the org or token is not set
    /// anywhere, or `ConfigError::InvalidValue` when a value is malformed.
    pub fn resolve(settings: &ProviderSettings) -> Result<Self> {
        Self::resolve_with(settings, |key| std::env::var(key).ok())
    }

    /// Resolve settings using `env` to look up environment variables.
    pub fn resolve_with<F>(settings: &ProviderSettings, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let org = env(ENV_ORG)
            .or_else(|| settings.org.clone())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingField {
                field: "org",
                env: ENV_ORG,
            })?;

        let endpoint = env(ENV_ENDPOINT)
            .or_else(|| settings.endpoint.clone())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let token = env(ENV_TOKEN)
            .or_else(|| settings.token.clone())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingField {
                field: "token",
                env: ENV_TOKEN,
            })?;

        let timeout_secs = match env(ENV_TIMEOUT) {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: format!("not a number: {}", raw),
            })?,
            None => settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let config = Self {
            org,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: Zeroizing::new(token),
            timeout: Duration::from_secs(timeout_secs),
        };

        config.validate()?;
        debug!(org = %config.org, endpoint = %config.endpoint, "provider configured");

        Ok(config)
    }

    /// Validate the resolved configuration.
    ///
    /// Checks:
    /// - The org is a valid object name
    /// - The endpoint is an http(s) URL
    /// - The timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        validation::validate_name("org", &self.org).map_err(|e| ConfigError::InvalidValue {
            field: "org",
            reason: e.to_string(),
        })?;

        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "endpoint",
                reason: format!("must be an http(s) URL: {}", self.endpoint),
            }
            .into());
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Path prefix of every org-scoped API call.
    pub fn org_path(&self) -> String {
        format!("/org/{}", self.org)
    }
}
