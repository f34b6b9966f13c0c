//! Declarative client configuration.
//!
//! `ClientConfig` can be deserialized from any serde source or read from the
//! environment. Reading from the environment rejects values that cannot be
//! parsed or are zero; `Client::from_config` applies the same checks as the
//! individual setters.

use std::env;
use std::fmt;

use serde::Deserialize;

use crate::error::{ApiError, Result};

pub const ENV_API_KEY: &str = "AIRTABLE_API_KEY";
pub const ENV_BASE_URL: &str = "AIRTABLE_BASE_URL";
pub const ENV_UPLOAD_BASE_URL: &str = "AIRTABLE_UPLOAD_BASE_URL";
pub const ENV_RATE_LIMIT: &str = "AIRTABLE_RATE_LIMIT";
pub const ENV_TIMEOUT_SECS: &str = "AIRTABLE_TIMEOUT_SECS";

#[derive(Clone, Default, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub upload_base_url: Option<String>,
    #[serde(default)]
    pub requests_per_second: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Read the configuration from `AIRTABLE_*` environment variables.
    ///
    /// Only the API key is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.is_empty())
            .ok_or(ApiError::MissingConfig(ENV_API_KEY))?;
        let parse_number = |key: &'static str| -> Result<Option<u64>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|_| ApiError::InvalidConfig {
                            key,
                            reason: format!("must be a number, got {raw:?}"),
                        })
                })
                .transpose()
        };
        let requests_per_second = parse_number(ENV_RATE_LIMIT)?
            .map(|n| u32::try_from(n).map_err(|_| ApiError::InvalidRateLimit))
            .transpose()?;

        let timeout_secs = parse_number(ENV_TIMEOUT_SECS)?;
        if timeout_secs == Some(0) {
            return Err(ApiError::InvalidConfig {
                key: ENV_TIMEOUT_SECS,
                reason: "timeout must be at least one second".to_string(),
            });
        }

        Ok(Self {
            api_key,
            base_url: lookup(ENV_BASE_URL),
            upload_base_url: lookup(ENV_UPLOAD_BASE_URL),
            requests_per_second,
            timeout_secs,
        })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("upload_base_url", &self.upload_base_url)
            .field("requests_per_second", &self.requests_per_second)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
