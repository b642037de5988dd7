//! Mock session validator for tests.
//!
//! # Example
//!
//! ```ignore
//! let validator = MockSessionValidator::new().with_test_customer("valid-token", "customer-1");
//! assert!(validator.validate("valid-token").await.is_ok());
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedCustomer};
use crate::ports::SessionValidator;

/// Maps tokens to customers. Unknown tokens are `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedCustomer>>,
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer(self, token: impl Into<String>, customer: AuthenticatedCustomer) -> Self {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), customer);
        self
    }

    /// Adds a token for a verified customer named after `id`.
    pub fn with_test_customer(self, token: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        let customer = AuthenticatedCustomer::new(id.clone(), format!("{}@test.example.com", id), true);
        self.with_customer(token, customer)
    }

    /// Every validation fails with `error`.
    pub fn with_error(self, error: AuthError) -> Self {
        *self.force_error.write().unwrap_or_else(PoisonError::into_inner) = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedCustomer, AuthError> {
        if let Some(error) = self
            .force_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(error);
        }
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
