//! Redis configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Redis configuration.
///
/// Optional: without a URL the prepared-intent store stays in process
/// memory, which only works for a single instance.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub url: Option<String>,

    /// Key namespace for prepared intents
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn is_enabled(&self) -> bool {
        self.url.as_deref().map(|u| !u.trim().is_empty()).unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ValidationError::InvalidRedisUrl);
            }
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_prefix: default_key_prefix(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_key_prefix() -> String {
    "storefront:intent:".to_string()
}

fn default_timeout() -> u64 {
    5
}
