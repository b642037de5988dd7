//! Gateway webhook envelope.
//!
//! ```json
//! {
//!   "event": "transaction.updated",
//!   "data": { "transaction": { "id": "...", "reference": "...", "status": "APPROVED", ... } },
//!   "signature": { "properties": ["transaction.id", "transaction.status"], "checksum": "..." },
//!   "timestamp": 1530291411
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::WebhookError;
use crate::domain::foundation::Timestamp;
use crate::domain::order::ReconciliationAction;
use crate::domain::payment::{GatewayTransaction, TransactionStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSignature {
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

/// The gateway sends the timestamp as a number, some proxies re-encode it
/// as a string. The checksum covers the text as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTimestamp {
    Seconds(i64),
    Text(String),
}

impl EventTimestamp {
    /// Text form used in the checksum.
    pub fn signed_text(&self) -> String {
        match self {
            EventTimestamp::Seconds(secs) => secs.to_string(),
            EventTimestamp::Text(text) => text.trim().to_string(),
        }
    }

    pub fn to_timestamp(&self) -> Result<Timestamp, WebhookError> {
        let secs = match self {
            EventTimestamp::Seconds(secs) => *secs,
            EventTimestamp::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| WebhookError::InvalidTimestamp(text.clone()))?,
        };
        Timestamp::from_unix_secs(secs).ok_or_else(|| WebhookError::InvalidTimestamp(secs.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub signature: Option<EventSignature>,
    #[serde(default)]
    pub timestamp: Option<EventTimestamp>,
    #[serde(default)]
    pub sent_at: Option<String>,
}

impl GatewayEvent {
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.event)
    }

    /// Checksum from the body, if the gateway put it there.
    pub fn body_checksum(&self) -> Option<&str> {
        self.signature
            .as_ref()
            .and_then(|s| s.checksum.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    pub fn signed_properties(&self) -> &[String] {
        self.signature
            .as_ref()
            .map(|s| s.properties.as_slice())
            .unwrap_or(&[])
    }

    /// The `data.transaction` object.
    pub fn transaction(&self) -> Result<GatewayTransaction, WebhookError> {
        let raw = self
            .data
            .get("transaction")
            .ok_or(WebhookError::MissingField("data.transaction"))?;
        serde_json::from_value(raw.clone()).map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

/// Event type, accepting both the gateway's dotted names and the short
/// names used by older integrations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    TransactionUpdated,
    Approved,
    Declined,
    Error,
    Voided,
    RefundApplied,
    Other(String),
}

impl EventKind {
    pub fn parse(raw: &str) -> Self {
        let name = raw.trim().to_ascii_lowercase();
        let short = name.strip_prefix("transaction.").unwrap_or(&name);
        match short {
            "updated" => EventKind::TransactionUpdated,
            "approved" => EventKind::Approved,
            "declined" => EventKind::Declined,
            "error" => EventKind::Error,
            "voided" => EventKind::Voided,
            "refund_applied" | "refunded" => EventKind::RefundApplied,
            _ => EventKind::Other(raw.to_string()),
        }
    }

    /// The action this event implies. Generic `updated` events are mapped
    /// through the carried status so that both paths converge.
    pub fn action(&self, status: &TransactionStatus) -> Option<ReconciliationAction> {
        match self {
            EventKind::TransactionUpdated => status.action(),
            EventKind::Approved => Some(ReconciliationAction::Approve),
            EventKind::Declined | EventKind::Error => Some(ReconciliationAction::Decline),
            EventKind::Voided => Some(ReconciliationAction::Void),
            EventKind::RefundApplied => Some(ReconciliationAction::Refund),
            EventKind::Other(_) => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::TransactionUpdated => "transaction.updated",
            EventKind::Approved => "transaction.approved",
            EventKind::Declined => "transaction.declined",
            EventKind::Error => "transaction.error",
            EventKind::Voided => "transaction.voided",
            EventKind::RefundApplied => "transaction.refund_applied",
            EventKind::Other(raw) => raw.as_str(),
        };
        f.write_str(name)
    }
}
