//! Prepared payment intents.

use serde::{Deserialize, Serialize};

use super::{Currency, MinorUnits, PaymentReference};
use crate::domain::foundation::Timestamp;

/// Payment method hint from the storefront checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Pse,
    Nequi,
    BancolombiaTransfer,
}

impl PaymentMethod {
    /// Gateway name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::Pse => "PSE",
            PaymentMethod::Nequi => "NEQUI",
            PaymentMethod::BancolombiaTransfer => "BANCOLOMBIA_TRANSFER",
        }
    }
}

/// The server's record of what a client was quoted.
///
/// Created by preparation, consumed by confirmation. The amount never
/// changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedIntent {
    reference: PaymentReference,
    amount: MinorUnits,
    currency: Currency,
    customer_email: String,
    created_at: Timestamp,
    expires_at: Timestamp,
}

impl PreparedIntent {
    pub fn new(
        reference: PaymentReference,
        amount: MinorUnits,
        currency: Currency,
        customer_email: impl Into<String>,
        created_at: Timestamp,
        ttl_secs: i64,
    ) -> Self {
        Self {
            reference,
            amount,
            currency,
            customer_email: customer_email.into(),
            created_at,
            expires_at: created_at.plus_secs(ttl_secs),
        }
    }

    pub fn reference(&self) -> &PaymentReference {
        &self.reference
    }

    pub fn amount(&self) -> MinorUnits {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// An intent is dead from `expires_at` onwards.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    /// Seconds until expiry, zero once expired.
    pub fn remaining_secs(&self, now: Timestamp) -> i64 {
        self.expires_at.duration_since(&now).num_seconds().max(0)
    }
}
