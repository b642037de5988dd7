//! Order repository port.
//!
//! Orders are written once by preparation and afterwards changed only
//! through [`OrderRepository::transition_payment`], which must be atomic:
//! the "current status allows this" check and the write happen together.
//!
//! # Example
//!
//! ```ignore
//! let transition = ReconciliationAction::Approve.transition(tx_id);
//! match repo.transition_payment(order.id, &transition, clock.now()).await? {
//!     Some(previous) => { /* apply side effects exactly once */ }
//!     None => { /* duplicate or out-of-order delivery, nothing to do */ }
//! }
//! ```

use async_trait::async_trait;

use super::StoreError;
use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::order::{Order, PaymentStatus, PaymentTransition};
use crate::domain::payment::PaymentReference;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order.
    ///
    /// # Errors
    ///
    /// - `Duplicate` if an order with the same order number exists
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_by_order_number(
        &self,
        order_number: &PaymentReference,
    ) -> Result<Option<Order>, StoreError>;

    async fn find_by_provider_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Order>, StoreError>;

    /// Conditionally apply `transition`.
    ///
    /// Returns the payment status the order had before the update when it
    /// applied, `None` when the current status is outside
    /// `transition.allowed_from` (or the order does not exist).
    async fn transition_payment(
        &self,
        order_id: OrderId,
        transition: &PaymentTransition,
        now: Timestamp,
    ) -> Result<Option<PaymentStatus>, StoreError>;
}
