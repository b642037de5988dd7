//! Commission repository port.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::foundation::OrderId;
use crate::domain::order::{Commission, CommissionStatus, CommissionedStaff};

#[async_trait]
pub trait CommissionRepository: Send + Sync {
    /// Staff members with a positive commission rate.
    async fn list_commissioned_staff(&self) -> Result<Vec<CommissionedStaff>, StoreError>;

    /// Insert unless a row for `(order_id, team_member_id)` already exists.
    ///
    /// Returns true when a row was inserted.
    async fn insert_if_absent(&self, commission: &Commission) -> Result<bool, StoreError>;

    /// Set status to cancelled for the order's rows currently in `from`.
    ///
    /// Returns the number of rows cancelled. Rows are never deleted.
    async fn cancel_for_order(
        &self,
        order_id: OrderId,
        from: &[CommissionStatus],
    ) -> Result<u64, StoreError>;

    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Commission>, StoreError>;
}
