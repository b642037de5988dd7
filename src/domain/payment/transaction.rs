//! The gateway's view of a transaction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order::ReconciliationAction;

/// Transaction status as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Declined,
    Voided,
    Error,
    Refunded,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Declined => "DECLINED",
            TransactionStatus::Voided => "VOIDED",
            TransactionStatus::Error => "ERROR",
            TransactionStatus::Refunded => "REFUNDED",
            TransactionStatus::Unknown => "UNKNOWN",
        }
    }

    /// Maps a gateway status to the reconciliation it implies.
    ///
    /// `PENDING` and unrecognised statuses imply nothing.
    pub fn action(&self) -> Option<ReconciliationAction> {
        match self {
            TransactionStatus::Approved => Some(ReconciliationAction::Approve),
            TransactionStatus::Declined | TransactionStatus::Error => {
                Some(ReconciliationAction::Decline)
            }
            TransactionStatus::Voided => Some(ReconciliationAction::Void),
            TransactionStatus::Refunded => Some(ReconciliationAction::Refund),
            TransactionStatus::Pending | TransactionStatus::Unknown => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction record, either fetched from the gateway API or carried in a
/// webhook's `data.transaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub id: String,
    pub reference: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub payment_method_type: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}
