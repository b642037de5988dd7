//! Session validation port for bearer tokens.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedCustomer};

/// Validates access tokens and extracts the customer identity.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed tokens or bad signatures
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedCustomer, AuthError>;
}
