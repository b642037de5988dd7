//! In-process adapters.
//!
//! Used by tests and single-instance development deployments. Each store
//! serialises writes behind a `tokio::sync::RwLock`, which gives the
//! conditional order update the same atomicity as the SQL version.

mod commission_repository;
mod intent_store;
mod inventory_ledger;
mod order_repository;

pub use commission_repository::InMemoryCommissionRepository;
pub use intent_store::InMemoryIntentStore;
pub use inventory_ledger::{InMemoryInventoryLedger, StockLevel};
pub use order_repository::InMemoryOrderRepository;
