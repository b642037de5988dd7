//! Application configuration module
//!
//! Configuration is read from environment variables with the `STOREFRONT`
//! prefix, nested values separated by `__`. A `.env` file is honoured in
//! development.
//!
//! # Example
//!
//! ```no_run
//! use storefront_payments::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod redis;
mod server;
mod webhook;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::{GatewayEnvironment, PaymentConfig};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

#[cfg(test)]
pub(crate) use payment::tests::sandbox_config;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Shared intent store; in-process when no URL is set
    #[serde(default)]
    pub redis: RedisConfig,

    /// Customer bearer token verification
    pub auth: AuthConfig,

    /// Gateway credentials and checkout settings
    pub payment: PaymentConfig,

    /// Webhook routing and reconciliation
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `STOREFRONT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `STOREFRONT__PAYMENT__PUBLIC_KEY=pub_test_...` -> `payment.public_key`
    /// - `STOREFRONT__WEBHOOK__FORWARDING__MX=https://...` -> `webhook.forwarding["mx"]`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STOREFRONT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.auth.validate()?;
        self.payment.validate(&self.server.environment)?;
        self.webhook.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
