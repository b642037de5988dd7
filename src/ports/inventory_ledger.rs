//! Inventory port.
//!
//! Stock movements are per order line: the product row always moves, the
//! variant row moves too when the line names one. Callers gate every call on
//! an applied payment transition, so the ledger itself is not idempotent.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::order::OrderLine;

#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// `stock -= quantity`, `sold += quantity` for every line.
    async fn decrement(&self, lines: &[OrderLine]) -> Result<(), StoreError>;

    /// `stock += quantity`, `sold -= quantity` (floored at zero) for every line.
    async fn restore(&self, lines: &[OrderLine]) -> Result<(), StoreError>;
}
