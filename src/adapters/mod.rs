//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - in-process stores for tests and single-instance runs
//! - `postgres_store` - sqlx-backed orders, inventory and commissions
//! - `redis_store` - shared prepared-intent store with native expiry
//! - `gateway` - payment gateway REST client and mock
//! - `forwarding` - webhook relay to sibling tenant deployments
//! - `workers` - reconciliation worker pool and intent sweeper
//! - `auth` - bearer token validation
//! - `http` - axum routes

pub mod auth;
mod clock;
pub mod forwarding;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod postgres_store;
pub mod redis_store;
pub mod workers;

pub use auth::{JwtSessionValidator, MockSessionValidator};
pub use clock::{ManualClock, SystemClock};
pub use forwarding::HttpWebhookForwarder;
pub use gateway::{HttpPaymentGateway, MockPaymentGateway};
pub use memory::{
    InMemoryCommissionRepository, InMemoryIntentStore, InMemoryInventoryLedger,
    InMemoryOrderRepository, StockLevel,
};
pub use postgres_store::{
    PostgresCommissionRepository, PostgresInventoryLedger, PostgresOrderRepository,
};
pub use redis_store::RedisIntentStore;
pub use workers::{
    reconciliation_pool, IntentSweeper, JobOutcome, JobReport, PoolConfig, ReconciliationPool,
    ReconciliationWorker,
};
