//! PostgreSQL adapters for the persistence ports.
//!
//! - `PostgresOrderRepository` - orders with conditional payment transitions
//! - `PostgresInventoryLedger` - product and variant stock
//! - `PostgresCommissionRepository` - staff commissions

mod commission_repository;
mod inventory_ledger;
mod order_repository;

pub use commission_repository::PostgresCommissionRepository;
pub use inventory_ledger::PostgresInventoryLedger;
pub use order_repository::PostgresOrderRepository;

use crate::ports::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

fn db_error(operation: &str, e: sqlx::Error) -> StoreError {
    let unique_violation = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false);
    if unique_violation {
        StoreError::Duplicate(format!("{}: {}", operation, e))
    } else {
        StoreError::Unavailable(format!("Failed to {}: {}", operation, e))
    }
}

fn corrupt(column: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{}: {}", column, e))
}
