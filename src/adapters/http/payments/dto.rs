//! Data Transfer Objects for payment endpoints.
//!
//! Request types deserialize client JSON; response types are built from
//! handler results and never carry a secret.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{ConfirmTransactionResult, PaymentIntent};
use crate::domain::foundation::Timestamp;
use crate::domain::order::ShippingAddress;
use crate::domain::payment::{CartLine, GatewayTransaction, PaymentMethod, TransactionStatus};
use crate::ports::{CardToken, FinancialInstitution, PaymentMethodData};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to prepare a payment for a cart.
#[derive(Debug, Clone, Deserialize)]
pub struct PrepareTransactionRequest {
    pub items: Vec<CartLine>,

    /// Contact for the order. Defaults to the signed-in customer.
    #[serde(default)]
    pub customer: Option<CustomerContact>,

    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,

    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerContact {
    pub email: String,
}

/// Client-reported outcome of the checkout widget.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmTransactionRequest {
    pub reference: String,
    pub transaction_id: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub integrity_signature: String,
}

/// Server-side charge for a prepared reference.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionRequest {
    pub reference: String,
    pub payment_method: PaymentMethodData,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Signed intent for the checkout widget.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentResponse {
    pub public_key: String,
    pub signature: String,
    pub reference: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub acceptance_token: String,
    pub acceptance_permalink: String,
    pub redirect_url: String,
    pub expires_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

impl From<PaymentIntent> for PaymentIntentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            public_key: intent.public_key,
            signature: intent.signature,
            reference: intent.reference.to_string(),
            amount_in_cents: intent.amount_in_cents,
            currency: intent.currency.to_string(),
            acceptance_token: intent.acceptance_token,
            acceptance_permalink: intent.acceptance_permalink,
            redirect_url: intent.redirect_url,
            expires_at: intent.expires_at,
            payment_method: intent.payment_method,
        }
    }
}

/// Verified status of a confirmed transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationResponse {
    pub reference: String,
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub status_message: Option<String>,
    pub amount_in_cents: i64,
    pub currency: String,
    pub payment_method_type: Option<String>,
}

impl From<ConfirmTransactionResult> for ConfirmationResponse {
    fn from(result: ConfirmTransactionResult) -> Self {
        Self {
            reference: result.reference.to_string(),
            transaction_id: result.transaction_id,
            status: result.status,
            status_message: result.status_message,
            amount_in_cents: result.amount_in_cents,
            currency: result.currency,
            payment_method_type: result.payment_method_type,
        }
    }
}

/// Gateway transaction as shown to the customer.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub reference: String,
    pub status: TransactionStatus,
    pub status_message: Option<String>,
    pub amount_in_cents: i64,
    pub currency: String,
    pub payment_method_type: Option<String>,
}

impl From<GatewayTransaction> for TransactionResponse {
    fn from(tx: GatewayTransaction) -> Self {
        Self {
            id: tx.id,
            reference: tx.reference,
            status: tx.status,
            status_message: tx.status_message,
            amount_in_cents: tx.amount_in_cents,
            currency: tx.currency,
            payment_method_type: tx.payment_method_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BankListResponse {
    pub banks: Vec<BankResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankResponse {
    pub code: String,
    pub name: String,
}

impl From<FinancialInstitution> for BankResponse {
    fn from(bank: FinancialInstitution) -> Self {
        Self {
            code: bank.financial_institution_code,
            name: bank.financial_institution_name,
        }
    }
}

/// Tokenized card. The full number never leaves the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CardTokenResponse {
    pub token: String,
    pub brand: String,
    pub last_four: String,
    pub exp_month: String,
    pub exp_year: String,
}

impl From<CardToken> for CardTokenResponse {
    fn from(card: CardToken) -> Self {
        Self {
            token: card.id,
            brand: card.brand,
            last_four: card.last_four,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
