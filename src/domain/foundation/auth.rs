//! Authenticated storefront customers.
//!
//! Populated by a `SessionValidator` adapter from a verified bearer token.

use thiserror::Error;

/// A signed-in storefront customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedCustomer {
    /// Token subject.
    pub id: String,

    pub email: String,

    pub email_verified: bool,
}

impl AuthenticatedCustomer {
    pub fn new(id: impl Into<String>, email: impl Into<String>, email_verified: bool) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            email_verified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if the client should obtain a new token.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }
}
