//! ReconcileTransactionHandler - applies a gateway outcome to an order.
//!
//! The conditional update in [`OrderRepository::transition_payment`] is the
//! only idempotency guard. Every side effect below runs only when that update
//! reports it applied, so duplicate or concurrent deliveries of the same
//! event change inventory and commissions at most once.
//!
//! Errors never escape [`ReconcileTransactionHandler::handle`]: they are
//! logged with the transaction id and event, and reported for tests.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::domain::foundation::OrderId;
use crate::domain::order::{Commission, Order, PaymentStatus, ReconciliationAction};
use crate::domain::payment::{PaymentError, PaymentReference};
use crate::ports::{Clock, CommissionRepository, InventoryLedger, OrderRepository};

/// Bounded order lookup: `attempts` tries, `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupRetry {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for LookupRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileTransactionCommand {
    pub reference: PaymentReference,
    pub transaction_id: String,
    pub action: ReconciliationAction,
    /// Event name as delivered, for logs.
    pub event: String,
}

/// What happened to one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationReport {
    /// The transition applied and its side effects ran.
    Applied {
        order_id: OrderId,
        previous: PaymentStatus,
        current: PaymentStatus,
    },
    /// The order's status did not allow the transition; nothing changed.
    Ignored {
        order_id: OrderId,
        status: PaymentStatus,
    },
    /// No order after every lookup attempt.
    OrderNotFound,
    /// An error was logged and swallowed.
    Failed(String),
}

pub struct ReconcileTransactionHandler {
    orders: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryLedger>,
    commissions: Arc<dyn CommissionRepository>,
    clock: Arc<dyn Clock>,
    retry: LookupRetry,
}

impl ReconcileTransactionHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryLedger>,
        commissions: Arc<dyn CommissionRepository>,
        clock: Arc<dyn Clock>,
        retry: LookupRetry,
    ) -> Self {
        Self {
            orders,
            inventory,
            commissions,
            clock,
            retry,
        }
    }

    pub async fn handle(&self, cmd: ReconcileTransactionCommand) -> ReconciliationReport {
        match self.reconcile(&cmd).await {
            Ok(report) => report,
            Err(e) => {
                error!(
                    reference = %cmd.reference,
                    transaction_id = %cmd.transaction_id,
                    event = %cmd.event,
                    action = %cmd.action,
                    error = %e,
                    "Reconciliation failed; order needs manual review"
                );
                ReconciliationReport::Failed(e.to_string())
            }
        }
    }

    async fn reconcile(&self, cmd: &ReconcileTransactionCommand) -> Result<ReconciliationReport, PaymentError> {
        let Some(order) = self.find_order(&cmd.reference, &cmd.transaction_id).await? else {
            error!(
                reference = %cmd.reference,
                transaction_id = %cmd.transaction_id,
                event = %cmd.event,
                attempts = self.retry.attempts,
                "CRITICAL: order not found for gateway transaction"
            );
            return Ok(ReconciliationReport::OrderNotFound);
        };

        let now = self.clock.now();
        let transition = cmd.action.transition(cmd.transaction_id.as_str());
        let Some(previous) = self
            .orders
            .transition_payment(order.id, &transition, now)
            .await?
        else {
            self.log_ignored(cmd, &order);
            return Ok(ReconciliationReport::Ignored {
                order_id: order.id,
                status: order.payment_status,
            });
        };

        self.apply_side_effects(cmd, &order, previous, transition.restores_inventory(previous))
            .await?;

        info!(
            reference = %cmd.reference,
            transaction_id = %cmd.transaction_id,
            order_id = %order.id,
            action = %cmd.action,
            from = %previous,
            to = %transition.target_payment,
            "Order reconciled"
        );

        Ok(ReconciliationReport::Applied {
            order_id: order.id,
            previous,
            current: transition.target_payment,
        })
    }

    async fn apply_side_effects(
        &self,
        cmd: &ReconcileTransactionCommand,
        order: &Order,
        previous: PaymentStatus,
        restore_inventory: bool,
    ) -> Result<(), PaymentError> {
        if cmd.action.decrements_inventory() {
            self.inventory.decrement(&order.items).await?;
        }
        if restore_inventory {
            self.inventory.restore(&order.items).await?;
            debug!(order_id = %order.id, from = %previous, "Inventory restored");
        }

        if cmd.action.creates_commissions() {
            let now = self.clock.now();
            for staff in self.commissions.list_commissioned_staff().await? {
                let Some(commission) = Commission::for_order(order, &staff, now) else {
                    continue;
                };
                if !self.commissions.insert_if_absent(&commission).await? {
                    debug!(
                        order_id = %order.id,
                        team_member_id = %staff.team_member_id,
                        "Commission already recorded"
                    );
                }
            }
        }

        let cancel_from = cmd.action.commissions_to_cancel();
        if !cancel_from.is_empty() {
            let cancelled = self.commissions.cancel_for_order(order.id, cancel_from).await?;
            debug!(order_id = %order.id, cancelled, "Commissions cancelled");
        }
        Ok(())
    }

    /// By reference, then by gateway transaction id, up to `attempts` times.
    async fn find_order(
        &self,
        reference: &PaymentReference,
        transaction_id: &str,
    ) -> Result<Option<Order>, PaymentError> {
        let attempts = self.retry.attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(order) = self.orders.find_by_order_number(reference).await? {
                return Ok(Some(order));
            }
            if let Some(order) = self.orders.find_by_provider_transaction_id(transaction_id).await? {
                return Ok(Some(order));
            }
            if attempt < attempts {
                debug!(
                    reference = %reference,
                    attempt,
                    attempts,
                    "Order not visible yet, retrying"
                );
                tokio::time::sleep(self.retry.delay).await;
            }
        }
        Ok(None)
    }

    fn log_ignored(&self, cmd: &ReconcileTransactionCommand, order: &Order) {
        if cmd.action == ReconciliationAction::Decline && order.is_paid() {
            warn!(
                reference = %cmd.reference,
                transaction_id = %cmd.transaction_id,
                order_id = %order.id,
                "Decline for a paid order ignored"
            );
        } else {
            info!(
                reference = %cmd.reference,
                transaction_id = %cmd.transaction_id,
                order_id = %order.id,
                action = %cmd.action,
                status = %order.payment_status,
                "Duplicate or out-of-order event ignored"
            );
        }
    }
}
