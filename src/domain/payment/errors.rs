//! Payment error taxonomy.
//!
//! Fraud-adjacent variants carry enough detail for incident response but
//! present a single generic message to clients.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, ValidationError};

/// What could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Intent,
    Order,
    Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Malformed request.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Cart total is not a positive number of minor units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{kind:?} not found: {id}")]
    NotFound { kind: NotFoundKind, id: String },

    /// Client-reported amount differs from the prepared one.
    #[error("Amount mismatch: expected {expected}, received {received}")]
    AmountMismatch { expected: i64, received: i64 },

    /// Client-submitted integrity signature does not match.
    #[error("Invalid integrity signature")]
    InvalidSignature,

    /// Gateway record disagrees with the prepared intent.
    #[error("Gateway {field} mismatch: expected {expected}, got {actual}")]
    DataMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Unauthorized webhook: {0}")]
    UnauthorizedWebhook(String),

    #[error("Stale event: {age_secs}s outside the accepted window")]
    StaleEvent { age_secs: i64 },

    #[error("Gateway error: {message}")]
    Gateway { message: String, retryable: bool },

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl PaymentError {
    pub fn not_found(kind: NotFoundKind, id: impl Into<String>) -> Self {
        PaymentError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn data_mismatch(
        field: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        PaymentError::DataMismatch {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Stable error code for API responses.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::Validation(_) => ErrorCode::ValidationFailed,
            PaymentError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            PaymentError::NotFound { kind, .. } => match kind {
                NotFoundKind::Intent => ErrorCode::IntentNotFound,
                NotFoundKind::Order => ErrorCode::OrderNotFound,
                NotFoundKind::Transaction => ErrorCode::TransactionNotFound,
            },
            PaymentError::AmountMismatch { .. } => ErrorCode::AmountMismatch,
            PaymentError::InvalidSignature => ErrorCode::InvalidSignature,
            PaymentError::DataMismatch { .. } => ErrorCode::DataMismatch,
            PaymentError::UnauthorizedWebhook(_) => ErrorCode::UnauthorizedWebhook,
            PaymentError::StaleEvent { .. } => ErrorCode::StaleEvent,
            PaymentError::Gateway { .. } => ErrorCode::GatewayError,
            PaymentError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// True for errors that suggest client-side tampering.
    pub fn is_fraud_signal(&self) -> bool {
        matches!(
            self,
            PaymentError::AmountMismatch { .. }
                | PaymentError::InvalidSignature
                | PaymentError::DataMismatch { .. }
        )
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::Gateway { retryable, .. } => *retryable,
            PaymentError::Infrastructure(_) => true,
            _ => false,
        }
    }

    /// Message safe to show to the client.
    pub fn client_message(&self) -> String {
        if self.is_fraud_signal() {
            return "payment data mismatch".to_string();
        }
        match self {
            PaymentError::Gateway { .. } => "payment gateway unavailable".to_string(),
            PaymentError::Infrastructure(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ValidationError> for PaymentError {
    fn from(err: ValidationError) -> Self {
        PaymentError::Validation(err.to_string())
    }
}
