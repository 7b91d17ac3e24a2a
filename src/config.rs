//! Resolver configuration.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::relay::DEFAULT_RELAY_URL;

/// Environment variable overriding [`Config::relay_url`].
pub const RELAY_URL_VAR: &str = "DID_DHT_RELAY_URL";

/// Environment variable overriding [`Config::timeout`], in seconds. `0`
/// disables the timeout.
pub const TIMEOUT_SECS_VAR: &str = "DID_DHT_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: `{1}`")]
    InvalidVar(&'static str, String),

    #[error("relay URL is empty")]
    EmptyRelayUrl,
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Base URL of the Pkarr relay.
    pub relay_url: String,

    /// Timeout applied to every relay request, unless the resolution
    /// context sets its own.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl Config {
    /// Default configuration, overridden by the `DID_DHT_*` environment
    /// variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = var(RELAY_URL_VAR) {
            config.relay_url = url;
        }
        if let Some(secs) = var(TIMEOUT_SECS_VAR) {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidVar(TIMEOUT_SECS_VAR, secs.clone()))?;
            config.timeout = (secs != 0).then(|| Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay_url.trim().is_empty() {
            return Err(ConfigError::EmptyRelayUrl);
        }
        Ok(())
    }
}
