//! Payment gateway port.
//!
//! Defines the calls this service makes to the card/PSE/bank-transfer
//! gateway. The gateway's REST API is consumed, not reimplemented.
//!
//! # Design
//!
//! - **Read calls are retryable**: acceptance token, transaction lookup, banks
//! - **Charge creation is not**: a timed-out create may still have charged

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::payment::{GatewayTransaction, NotFoundKind, PaymentError, PaymentMethod};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetch the merchant's current acceptance (consent) token.
    async fn acceptance_token(&self) -> Result<AcceptanceToken, GatewayError>;

    /// Fetch a transaction's authoritative record.
    async fn get_transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, GatewayError>;

    /// Create a transaction. Callers must never retry this automatically.
    async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<GatewayTransaction, GatewayError>;

    /// Tokenize a card so the PAN never touches our servers afterwards.
    async fn tokenize_card(&self, request: CardDetails) -> Result<CardToken, GatewayError>;

    /// Banks available for PSE redirects.
    async fn list_pse_banks(&self) -> Result<Vec<FinancialInstitution>, GatewayError>;
}

/// Merchant consent token and the terms it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceToken {
    pub token: String,
    pub permalink: String,
}

/// Request to create a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub reference: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub signature: String,
    pub customer_email: String,
    pub acceptance_token: String,
    pub redirect_url: Option<String>,
    pub payment_method: PaymentMethodData,
}

/// Method-specific charge data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodData {
    Card {
        token: String,
        installments: u32,
    },
    Pse {
        user_type: u8,
        user_legal_id_type: String,
        user_legal_id: String,
        financial_institution_code: String,
        payment_description: String,
    },
    Nequi {
        phone_number: String,
    },
    BancolombiaTransfer {
        payment_description: String,
    },
}

impl PaymentMethodData {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentMethodData::Card { .. } => PaymentMethod::Card,
            PaymentMethodData::Pse { .. } => PaymentMethod::Pse,
            PaymentMethodData::Nequi { .. } => PaymentMethod::Nequi,
            PaymentMethodData::BancolombiaTransfer { .. } => PaymentMethod::BancolombiaTransfer,
        }
    }
}

/// Raw card details for tokenization.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub cvc: String,
    pub exp_month: String,
    pub exp_year: String,
    pub card_holder: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last4 = self
            .number
            .get(self.number.len().saturating_sub(4)..)
            .unwrap_or_default();
        f.debug_struct("CardDetails")
            .field("number", &format!("****{}", last4))
            .field("card_holder", &self.card_holder)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardToken {
    pub id: String,
    pub brand: String,
    pub last_four: String,
    pub exp_month: String,
    pub exp_year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialInstitution {
    pub financial_institution_code: String,
    pub financial_institution_name: String,
}

/// Errors from gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,

    pub message: String,

    /// HTTP status the gateway answered with, if any.
    pub status: Option<u16>,

    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Marks the error as not retryable, used for charge creation.
    pub fn non_retryable(mut self) -> Self {
        self.retryable = false;
        self
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        match err.code {
            GatewayErrorCode::NotFound => PaymentError::not_found(NotFoundKind::Transaction, err.message),
            GatewayErrorCode::InvalidRequest => PaymentError::Validation(err.message),
            _ => PaymentError::Gateway {
                message: err.to_string(),
                retryable: err.retryable,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    NetworkError,
    AuthenticationError,
    /// The gateway rejected the request body (422).
    InvalidRequest,
    NotFound,
    RateLimitExceeded,
    /// Unexpected 5xx or malformed response.
    ProviderError,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError
                | GatewayErrorCode::RateLimitExceeded
                | GatewayErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::InvalidRequest => "invalid_request",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn network_errors_are_retryable() {
        assert!(GatewayError::network("timeout").retryable);
        assert!(!GatewayError::network("timeout").non_retryable().retryable);
        assert!(!GatewayError::not_found("transaction").retryable);
    }

    #[test]
    fn not_found_converts_to_transaction_not_found() {
        let err: PaymentError = GatewayError::not_found("transaction").into();
        assert_eq!(err.code(), ErrorCode::TransactionNotFound);
    }

    #[test]
    fn other_errors_convert_to_gateway_error() {
        let err: PaymentError = GatewayError::new(GatewayErrorCode::ProviderError, "boom")
            .with_status(503)
            .into();
        assert_eq!(err.code(), ErrorCode::GatewayError);
        assert!(err.is_retryable());
    }

    #[test]
    fn card_details_debug_masks_number() {
        let card = CardDetails {
            number: "4242424242424242".to_string(),
            cvc: "123".to_string(),
            exp_month: "08".to_string(),
            exp_year: "28".to_string(),
            card_holder: "Ana Gómez".to_string(),
        };
        let debug = format!("{:?}", card);
        assert!(debug.contains("****4242"));
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("123"));
    }

    #[test]
    fn method_data_serializes_with_gateway_tag() {
        let data = PaymentMethodData::Card {
            token: "tok_test_1".into(),
            installments: 1,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "CARD");
        assert_eq!(data.method(), PaymentMethod::Card);
    }
}
