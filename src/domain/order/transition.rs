//! Reconciliation actions and the guarded transitions they apply.
//!
//! Every webhook outcome is reduced to one [`ReconciliationAction`]. Each
//! action becomes a [`PaymentTransition`]: a target status plus the set of
//! current statuses it may be applied from. Stores apply it as a single
//! conditional update, which is the idempotency guard for all side effects.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CommissionStatus, OrderStatus, PaymentStatus};

const FROM_PENDING: &[PaymentStatus] = &[PaymentStatus::Pending];
const FROM_PENDING_OR_FAILED: &[PaymentStatus] = &[PaymentStatus::Pending, PaymentStatus::Failed];
const FROM_PENDING_OR_PAID: &[PaymentStatus] = &[PaymentStatus::Pending, PaymentStatus::Paid];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationAction {
    Approve,
    Decline,
    Void,
    Refund,
}

impl ReconciliationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationAction::Approve => "approve",
            ReconciliationAction::Decline => "decline",
            ReconciliationAction::Void => "void",
            ReconciliationAction::Refund => "refund",
        }
    }

    /// Builds the guarded transition for this action.
    pub fn transition(self, provider_transaction_id: impl Into<String>) -> PaymentTransition {
        let (target_payment, target_order, allowed_from) = match self {
            ReconciliationAction::Approve => (
                PaymentStatus::Paid,
                Some(OrderStatus::Confirmed),
                FROM_PENDING_OR_FAILED,
            ),
            ReconciliationAction::Decline => (PaymentStatus::Failed, None, FROM_PENDING),
            ReconciliationAction::Void => (
                PaymentStatus::Refunded,
                Some(OrderStatus::Cancelled),
                FROM_PENDING_OR_PAID,
            ),
            ReconciliationAction::Refund => (
                PaymentStatus::Refunded,
                Some(OrderStatus::Refunded),
                FROM_PENDING_OR_PAID,
            ),
        };

        PaymentTransition {
            action: self,
            target_payment,
            target_order,
            allowed_from,
            provider_transaction_id: provider_transaction_id.into(),
        }
    }

    /// Whether applying this action takes stock out of inventory.
    pub fn decrements_inventory(&self) -> bool {
        matches!(self, ReconciliationAction::Approve)
    }

    /// Whether applying this action creates commission rows.
    pub fn creates_commissions(&self) -> bool {
        matches!(self, ReconciliationAction::Approve)
    }

    /// Commission statuses that this action cancels.
    pub fn commissions_to_cancel(&self) -> &'static [CommissionStatus] {
        match self {
            ReconciliationAction::Void => &[CommissionStatus::Pending],
            ReconciliationAction::Refund => &[CommissionStatus::Pending, CommissionStatus::Approved],
            ReconciliationAction::Approve | ReconciliationAction::Decline => &[],
        }
    }
}

impl fmt::Display for ReconciliationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conditional status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransition {
    pub action: ReconciliationAction,
    pub target_payment: PaymentStatus,
    /// `None` leaves the order status untouched.
    pub target_order: Option<OrderStatus>,
    pub allowed_from: &'static [PaymentStatus],
    pub provider_transaction_id: String,
}

impl PaymentTransition {
    pub fn applies_from(&self, current: PaymentStatus) -> bool {
        self.allowed_from.contains(&current)
    }

    /// Stock goes back only when the order is leaving `paid`.
    pub fn restores_inventory(&self, previous: PaymentStatus) -> bool {
        previous == PaymentStatus::Paid && self.target_payment != PaymentStatus::Paid
    }
}
