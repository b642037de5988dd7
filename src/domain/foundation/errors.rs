//! Error types shared across the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid state transition error.
    pub fn invalid_transition(from: impl fmt::Debug, to: impl fmt::Debug) -> Self {
        ValidationError::InvalidTransition {
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }
}

/// Stable, client-visible error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request errors
    ValidationFailed,
    InvalidAmount,

    // Not found errors
    IntentNotFound,
    OrderNotFound,
    TransactionNotFound,

    // Fraud-adjacent
    AmountMismatch,
    InvalidSignature,
    DataMismatch,

    // Webhook authentication
    UnauthorizedWebhook,
    StaleEvent,

    // Authorization errors
    Unauthorized,

    // Upstream and infrastructure
    GatewayError,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// Returns the wire representation, e.g. `AMOUNT_MISMATCH`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::IntentNotFound => "INTENT_NOT_FOUND",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            ErrorCode::AmountMismatch => "AMOUNT_MISMATCH",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::DataMismatch => "DATA_MISMATCH",
            ErrorCode::UnauthorizedWebhook => "UNAUTHORIZED_WEBHOOK",
            ErrorCode::StaleEvent => "STALE_EVENT",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
