//! Gateway REST wire types.
//!
//! Every gateway response wraps its payload in `{ "data": ... }`; errors
//! come back as `{ "error": { "type": ..., "reason"|"messages": ... } }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::{AcceptanceToken, CardToken, PaymentMethodData};

// ════════════════════════════════════════════════════════════════════════════════
// Envelopes
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    /// Field-level validation messages, keyed by field.
    #[serde(default)]
    pub messages: Option<Value>,
}

impl ErrorBody {
    pub fn describe(&self) -> String {
        let kind = self.kind.as_deref().unwrap_or("ERROR");
        match (&self.reason, &self.messages) {
            (Some(reason), _) => format!("{}: {}", kind, reason),
            (None, Some(messages)) => format!("{}: {}", kind, messages),
            (None, None) => kind.to_string(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Merchant
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct Merchant {
    pub presigned_acceptance: PresignedAcceptance,
}

#[derive(Debug, Deserialize)]
pub struct PresignedAcceptance {
    pub acceptance_token: String,
    pub permalink: String,
}

impl From<PresignedAcceptance> for AcceptanceToken {
    fn from(p: PresignedAcceptance) -> Self {
        AcceptanceToken {
            token: p.acceptance_token,
            permalink: p.permalink,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Transactions
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct CreateTransactionBody<'a> {
    pub acceptance_token: &'a str,
    pub amount_in_cents: i64,
    pub currency: &'a str,
    pub signature: &'a str,
    pub customer_email: &'a str,
    pub reference: &'a str,
    pub payment_method: &'a PaymentMethodData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<&'a str>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Cards
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct TokenizeCardBody<'a> {
    pub number: &'a str,
    pub cvc: &'a str,
    pub exp_month: &'a str,
    pub exp_year: &'a str,
    pub card_holder: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenizedCard {
    pub id: String,
    #[serde(default)]
    pub brand: String,
    pub last_four: String,
    pub exp_month: String,
    pub exp_year: String,
}

impl From<TokenizedCard> for CardToken {
    fn from(c: TokenizedCard) -> Self {
        CardToken {
            id: c.id,
            brand: c.brand,
            last_four: c.last_four,
            exp_month: c.exp_month,
            exp_year: c.exp_year,
        }
    }
}
