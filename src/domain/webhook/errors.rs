//! Webhook ingress errors.
//!
//! None of these reach the gateway as a non-2xx response. They decide the
//! status token returned and what gets logged.

use thiserror::Error;

use crate::domain::payment::{ChecksumError, PaymentError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Neither the header nor the body carried a checksum.
    #[error("Missing checksum")]
    MissingChecksum,

    #[error("Missing timestamp")]
    MissingTimestamp,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Event timestamp is outside the anti-replay window.
    #[error("Stale event: {age_secs}s old")]
    StaleEvent { age_secs: i64 },

    #[error("Checksum rejected: {0}")]
    Checksum(#[from] ChecksumError),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Reference prefix belongs to no known deployment.
    #[error("No route for tenant prefix '{0}'")]
    UnknownTenant(String),

    /// The reconciliation queue is saturated.
    #[error("Reconciliation queue is full")]
    QueueFull,
}

impl WebhookError {
    /// True for errors that mean the sender could not prove it is the gateway.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingChecksum | WebhookError::Checksum(_)
        )
    }
}

impl From<WebhookError> for PaymentError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::MissingChecksum | WebhookError::Checksum(_) => {
                PaymentError::UnauthorizedWebhook(err.to_string())
            }
            WebhookError::StaleEvent { age_secs } => PaymentError::StaleEvent { age_secs },
            WebhookError::MissingTimestamp
            | WebhookError::InvalidTimestamp(_)
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_) => PaymentError::Validation(err.to_string()),
            WebhookError::UnknownTenant(_) | WebhookError::QueueFull => {
                PaymentError::Infrastructure(err.to_string())
            }
        }
    }
}
