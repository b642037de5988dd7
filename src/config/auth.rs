//! Customer authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// HS256 bearer tokens issued by the storefront's session service
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,

    pub issuer: String,

    pub audience: String,

    /// Allowed clock skew when checking `exp`, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.jwt_secret.expose_secret().len() < 32 {
            return Err(ValidationError::WeakJwtSecret);
        }
        if self.issuer.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__ISSUER"));
        }
        if self.audience.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__AUDIENCE"));
        }
        Ok(())
    }
}

fn default_leeway() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::new(secret.to_string()),
            issuer: "https://shop.example.com".to_string(),
            audience: "storefront".to_string(),
            leeway_secs: default_leeway(),
        }
    }

    #[test]
    fn short_secret_rejected() {
        assert_eq!(config("short").validate(), Err(ValidationError::WeakJwtSecret));
    }

    #[test]
    fn valid_config() {
        assert!(config(&"k".repeat(32)).validate().is_ok());
    }

    #[test]
    fn missing_audience_rejected() {
        let mut c = config(&"k".repeat(32));
        c.audience.clear();
        assert_eq!(c.validate(), Err(ValidationError::MissingRequired("AUTH__AUDIENCE")));
    }
}
