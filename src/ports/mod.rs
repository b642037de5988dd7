//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `OrderRepository` - order rows with atomic conditional payment transitions
//! - `InventoryLedger` - stock and sold-count movements
//! - `CommissionRepository` - commission rows, unique per (order, staff member)
//! - `IntentStore` - expiring prepared-intent store
//!
//! ## Integration Ports
//!
//! - `PaymentGateway` - outbound gateway REST calls
//! - `WebhookForwarder` - relay to sibling tenant deployments
//! - `ReconciliationQueue` - background job submission
//!
//! ## Ambient Ports
//!
//! - `Clock` - injected time source
//! - `SessionValidator` - bearer token validation

mod clock;
mod commission_repository;
mod intent_store;
mod inventory_ledger;
mod order_repository;
mod payment_gateway;
mod reconciliation_queue;
mod session_validator;
mod store_error;
mod webhook_forwarder;

pub use clock::Clock;
pub use commission_repository::CommissionRepository;
pub use intent_store::IntentStore;
pub use inventory_ledger::InventoryLedger;
pub use order_repository::OrderRepository;
pub use payment_gateway::{
    AcceptanceToken, CardDetails, CardToken, CreateTransactionRequest, FinancialInstitution,
    GatewayError, GatewayErrorCode, PaymentGateway, PaymentMethodData,
};
pub use reconciliation_queue::ReconciliationQueue;
pub use session_validator::SessionValidator;
pub use store_error::StoreError;
pub use webhook_forwarder::{ForwardError, WebhookForwarder};
