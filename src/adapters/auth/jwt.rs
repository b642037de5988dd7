//! HS256 bearer token validation.
//!
//! Tokens are issued by the storefront's session service and shared with
//! this service through a symmetric secret.
//!
//! # Validated claims
//!
//! - `iss` and `aud` must match the configuration
//! - `exp` is required, checked with the configured leeway
//! - `sub` is required and becomes the customer id

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedCustomer};
use crate::ports::SessionValidator;

#[derive(Debug, Serialize, Deserialize)]
struct CustomerClaims {
    sub: String,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
}

pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = config.leeway_secs;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedCustomer, AuthError> {
        let data = decode::<CustomerClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => {
                        tracing::debug!(error = %e, "Bearer token rejected");
                        AuthError::InvalidToken
                    }
                }
            },
        )?;

        let claims = data.claims;
        Ok(AuthenticatedCustomer::new(
            claims.sub,
            claims.email.unwrap_or_default(),
            claims.email_verified.unwrap_or(false),
        ))
    }
}
