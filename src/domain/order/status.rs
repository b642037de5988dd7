//! Payment and order status state machines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Payment lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting the gateway outcome.
    Pending,

    /// Charge approved. Stock has been decremented and commissions created.
    Paid,

    /// Charge declined or errored. A later approval may still arrive.
    Failed,

    /// Voided or refunded after the fact.
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Paid)
                | (Pending, Failed)
                | (Pending, Refunded)
                // Approval delivered after a decline of an earlier attempt
                | (Failed, Paid)
                | (Paid, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Paid, Failed, Refunded],
            Failed => vec![Paid],
            Paid => vec![Refunded],
            Refunded => vec![],
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "payment_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Fulfilment lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, Refunded)
                | (Confirmed, Cancelled)
                | (Confirmed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Confirmed, Cancelled, Refunded],
            Confirmed => vec![Cancelled, Refunded],
            Cancelled | Refunded => vec![],
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "order_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // PaymentStatus
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn pending_can_reach_every_outcome() {
        let status = PaymentStatus::Pending;
        assert_eq!(status.transition_to(PaymentStatus::Paid), Ok(PaymentStatus::Paid));
        assert_eq!(status.transition_to(PaymentStatus::Failed), Ok(PaymentStatus::Failed));
        assert_eq!(
            status.transition_to(PaymentStatus::Refunded),
            Ok(PaymentStatus::Refunded)
        );
    }

    #[test]
    fn paid_can_only_be_refunded() {
        assert_eq!(PaymentStatus::Paid.valid_transitions(), vec![PaymentStatus::Refunded]);
        assert!(PaymentStatus::Paid.transition_to(PaymentStatus::Failed).is_err());
        assert!(PaymentStatus::Paid.transition_to(PaymentStatus::Pending).is_err());
    }

    #[test]
    fn failed_can_still_be_paid() {
        assert!(PaymentStatus::Failed.can_transition_to(&PaymentStatus::Paid));
        assert!(!PaymentStatus::Failed.can_transition_to(&PaymentStatus::Refunded));
    }

    #[test]
    fn refunded_is_terminal() {
        assert!(PaymentStatus::Refunded.is_terminal());
    }

    #[test]
    fn payment_status_parses_its_own_display() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(status.to_string().parse::<PaymentStatus>(), Ok(status));
        }
        assert!("PAID".parse::<PaymentStatus>().is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // OrderStatus
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn pending_order_confirms() {
        assert_eq!(
            OrderStatus::Pending.transition_to(OrderStatus::Confirmed),
            Ok(OrderStatus::Confirmed)
        );
    }

    #[test]
    fn confirmed_order_can_be_cancelled_or_refunded() {
        assert!(OrderStatus::Confirmed.can_transition_to(&OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(&OrderStatus::Refunded));
        assert!(!OrderStatus::Confirmed.can_transition_to(&OrderStatus::Pending));
    }

    #[test]
    fn cancelled_and_refunded_orders_are_terminal() {
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
    }

    #[test]
    fn statuses_serialize_lower_case() {
        assert_eq!(serde_json::to_string(&OrderStatus::Confirmed).unwrap(), "\"confirmed\"");
        assert_eq!(serde_json::to_string(&PaymentStatus::Paid).unwrap(), "\"paid\"");
    }
}
