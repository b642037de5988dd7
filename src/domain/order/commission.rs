//! Staff commissions on paid orders.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Order;
use crate::domain::foundation::{
    CommissionId, CommissionRate, OrderId, TeamMemberId, Timestamp, ValidationError,
};
use crate::domain::payment::MinorUnits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    /// Approved for payout by an administrator.
    Approved,
    Cancelled,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Approved => "approved",
            CommissionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommissionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommissionStatus::Pending),
            "approved" => Ok(CommissionStatus::Approved),
            "cancelled" => Ok(CommissionStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "commission_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// A staff member and their commission rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionedStaff {
    pub team_member_id: TeamMemberId,
    pub rate: CommissionRate,
}

/// One commission row per (order, team member).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub id: CommissionId,
    pub team_member_id: TeamMemberId,
    pub order_id: OrderId,
    pub order_total: MinorUnits,
    pub rate: CommissionRate,
    pub amount: MinorUnits,
    pub status: CommissionStatus,
    pub created_at: Timestamp,
}

impl Commission {
    /// Computes the commission a staff member earns on `order`.
    ///
    /// Returns `None` for staff without a positive rate.
    pub fn for_order(order: &Order, staff: &CommissionedStaff, now: Timestamp) -> Option<Self> {
        if !staff.rate.is_positive() {
            return None;
        }
        Some(Self {
            id: CommissionId::new(),
            team_member_id: staff.team_member_id,
            order_id: order.id,
            order_total: order.total,
            rate: staff.rate,
            amount: MinorUnits::new(staff.rate.apply(order.total.value())),
            status: CommissionStatus::Pending,
            created_at: now,
        })
    }

    /// Cancels the commission if its status is one of `from`.
    ///
    /// Returns true when the status changed.
    pub fn cancel_if(&mut self, from: &[CommissionStatus]) -> bool {
        if from.contains(&self.status) {
            self.status = CommissionStatus::Cancelled;
            true
        } else {
            false
        }
    }
}
