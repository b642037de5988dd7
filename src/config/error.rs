//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid gateway key format: {0}")]
    InvalidGatewayKey(&'static str),

    #[error("Gateway public and private keys belong to different environments")]
    MixedGatewayEnvironments,

    #[error("Sandbox gateway credentials are not allowed in production")]
    SandboxKeysInProduction,

    #[error("Invalid currency code")]
    InvalidCurrency,

    #[error("Invalid tenant prefix: {0}")]
    InvalidTenantPrefix(String),

    #[error("Forwarding URL for '{0}' must be an absolute http(s) URL")]
    InvalidForwardingUrl(String),

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("JWT secret must be at least 32 bytes")]
    WeakJwtSecret,
}
