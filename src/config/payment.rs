//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::domain::payment::Currency;

const SANDBOX_BASE_URL: &str = "https://sandbox.wompi.co/v1";
const PRODUCTION_BASE_URL: &str = "https://production.wompi.co/v1";

/// Gateway environment, derived from the credential prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEnvironment {
    Sandbox,
    Production,
}

impl GatewayEnvironment {
    fn of_key(key: &str, test_prefix: &str, prod_prefix: &str) -> Option<Self> {
        if key.starts_with(test_prefix) {
            Some(GatewayEnvironment::Sandbox)
        } else if key.starts_with(prod_prefix) {
            Some(GatewayEnvironment::Production)
        } else {
            None
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            GatewayEnvironment::Sandbox => SANDBOX_BASE_URL,
            GatewayEnvironment::Production => PRODUCTION_BASE_URL,
        }
    }
}

/// Payment gateway credentials and checkout settings
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Public key, safe to hand to the checkout widget
    pub public_key: String,

    /// Private key for server-to-gateway calls
    pub private_key: SecretString,

    /// Secret for integrity signatures
    pub integrity_secret: SecretString,

    /// Secret for webhook checksums
    pub events_secret: SecretString,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Where the gateway sends the shopper after checkout
    pub redirect_url: String,

    /// Prepared intent lifetime in seconds
    #[serde(default = "default_intent_ttl")]
    pub intent_ttl_secs: u64,

    /// How often expired intents are swept, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Overrides the base URL selected from the key prefix
    #[serde(default)]
    pub base_url: Option<String>,

    /// Gateway request timeout in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,
}

impl PaymentConfig {
    /// Environment selected by the public key prefix
    pub fn environment(&self) -> Option<GatewayEnvironment> {
        GatewayEnvironment::of_key(&self.public_key, "pub_test_", "pub_prod_")
    }

    pub fn is_test_mode(&self) -> bool {
        self.environment() == Some(GatewayEnvironment::Sandbox)
    }

    /// Gateway base URL: explicit override, otherwise sandbox or production
    /// according to the credentials.
    pub fn base_url(&self) -> String {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.is_empty()) {
            return url.trim_end_matches('/').to_string();
        }
        self.environment()
            .unwrap_or(GatewayEnvironment::Sandbox)
            .base_url()
            .to_string()
    }

    pub fn currency(&self) -> Result<Currency, ValidationError> {
        Currency::parse(&self.currency).map_err(|_| ValidationError::InvalidCurrency)
    }

    pub fn intent_ttl_secs(&self) -> i64 {
        self.intent_ttl_secs as i64
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.public_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__PUBLIC_KEY"));
        }
        if self.private_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__PRIVATE_KEY"));
        }
        if self.integrity_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__INTEGRITY_SECRET"));
        }
        if self.events_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__EVENTS_SECRET"));
        }
        if self.redirect_url.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__REDIRECT_URL"));
        }

        let public = self
            .environment()
            .ok_or(ValidationError::InvalidGatewayKey("public_key"))?;
        let private = GatewayEnvironment::of_key(self.private_key.expose_secret(), "prv_test_", "prv_prod_")
            .ok_or(ValidationError::InvalidGatewayKey("private_key"))?;
        if public != private {
            return Err(ValidationError::MixedGatewayEnvironments);
        }

        // Secrets carry an environment prefix in the merchant dashboard but
        // older accounts issued unprefixed ones.
        for (secret, test, prod) in [
            (&self.integrity_secret, "test_integrity_", "prod_integrity_"),
            (&self.events_secret, "test_events_", "prod_events_"),
        ] {
            if let Some(env) = GatewayEnvironment::of_key(secret.expose_secret(), test, prod) {
                if env != public {
                    return Err(ValidationError::MixedGatewayEnvironments);
                }
            }
        }

        if *environment == Environment::Production && public == GatewayEnvironment::Sandbox {
            return Err(ValidationError::SandboxKeysInProduction);
        }

        self.currency()?;
        if self.intent_ttl_secs == 0 {
            return Err(ValidationError::MustBePositive("PAYMENT__INTENT_TTL_SECS"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::MustBePositive("PAYMENT__SWEEP_INTERVAL_SECS"));
        }
        Ok(())
    }
}

fn default_currency() -> String {
    "COP".to_string()
}

fn default_intent_ttl() -> u64 {
    15 * 60
}

fn default_sweep_interval() -> u64 {
    5 * 60
}

fn default_gateway_timeout() -> u64 {
    10
}
