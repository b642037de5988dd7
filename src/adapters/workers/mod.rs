//! Background workers.
//!
//! - `IntentSweeper` - periodic removal of expired prepared intents
//! - `ReconciliationPool` / `ReconciliationWorker` - bounded webhook job pool

mod intent_sweeper;
mod reconciliation_pool;

pub use intent_sweeper::IntentSweeper;
pub use reconciliation_pool::{
    reconciliation_pool, JobOutcome, JobReport, PoolConfig, ReconciliationPool,
    ReconciliationWorker,
};
