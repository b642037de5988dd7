//! Webhook ingress configuration

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::error::ValidationError;

/// Webhook routing and reconciliation settings
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Reference prefix owned by this deployment
    #[serde(default = "default_tenant_prefix")]
    pub tenant_prefix: String,

    /// Sibling deployments by reference prefix, e.g.
    /// `STOREFRONT__WEBHOOK__FORWARDING__MX=https://mx.example.com/payments/webhook`
    #[serde(default)]
    pub forwarding: HashMap<String, String>,

    /// Order lookup attempts before giving up
    #[serde(default = "default_lookup_attempts")]
    pub lookup_attempts: u32,

    /// Fixed delay between lookup attempts, in milliseconds
    #[serde(default = "default_lookup_delay_ms")]
    pub lookup_delay_ms: u64,

    /// Anti-replay window, in seconds
    #[serde(default = "default_max_event_age")]
    pub max_event_age_secs: i64,

    /// Concurrent reconciliation jobs
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pending jobs before submissions are rejected
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_secs: u64,
}

impl WebhookConfig {
    /// Whether `prefix` belongs to this deployment.
    pub fn owns_prefix(&self, prefix: &str) -> bool {
        self.tenant_prefix.eq_ignore_ascii_case(prefix)
    }

    pub fn lookup_delay(&self) -> Duration {
        Duration::from_millis(self.lookup_delay_ms)
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_prefix(&self.tenant_prefix)?;
        for (prefix, url) in &self.forwarding {
            validate_prefix(prefix)?;
            if self.owns_prefix(prefix) {
                return Err(ValidationError::InvalidTenantPrefix(format!(
                    "{} forwards to itself",
                    prefix
                )));
            }
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidForwardingUrl(prefix.clone()));
            }
        }
        if self.lookup_attempts == 0 {
            return Err(ValidationError::MustBePositive("WEBHOOK__LOOKUP_ATTEMPTS"));
        }
        if self.max_event_age_secs <= 0 {
            return Err(ValidationError::MustBePositive("WEBHOOK__MAX_EVENT_AGE_SECS"));
        }
        if self.workers == 0 {
            return Err(ValidationError::MustBePositive("WEBHOOK__WORKERS"));
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::MustBePositive("WEBHOOK__QUEUE_CAPACITY"));
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            tenant_prefix: default_tenant_prefix(),
            forwarding: HashMap::new(),
            lookup_attempts: default_lookup_attempts(),
            lookup_delay_ms: default_lookup_delay_ms(),
            max_event_age_secs: default_max_event_age(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            forward_timeout_secs: default_forward_timeout(),
        }
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.is_empty() || prefix.len() > 8 || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidTenantPrefix(prefix.to_string()));
    }
    Ok(())
}

fn default_tenant_prefix() -> String {
    "SP".to_string()
}

fn default_lookup_attempts() -> u32 {
    3
}

fn default_lookup_delay_ms() -> u64 {
    2_000
}

fn default_max_event_age() -> i64 {
    10 * 60
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_forward_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WebhookConfig::default();
        assert_eq!(config.lookup_attempts, 3);
        assert_eq!(config.lookup_delay(), Duration::from_secs(2));
        assert_eq!(config.max_event_age_secs, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn own_prefix_matching_ignores_case() {
        let config = WebhookConfig::default();
        assert!(config.owns_prefix("sp"));
        assert!(!config.owns_prefix("MX"));
    }

    #[test]
    fn forwarding_to_own_prefix_is_rejected() {
        let mut config = WebhookConfig::default();
        config
            .forwarding
            .insert("sp".to_string(), "https://elsewhere.example.com".to_string());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTenantPrefix(_))
        ));
    }

    #[test]
    fn forwarding_url_must_be_http() {
        let mut config = WebhookConfig::default();
        config.forwarding.insert("MX".to_string(), "ftp://mx".to_string());
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidForwardingUrl("MX".to_string()))
        );
    }

    #[test]
    fn zero_workers_rejected() {
        let config = WebhookConfig {
            workers: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("WEBHOOK__WORKERS"))
        );
    }
}
