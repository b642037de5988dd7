//! Application handlers.
//!
//! - `payment` - preparation, confirmation, charge creation and gateway queries
//! - `webhook` - notification ingress and order reconciliation

pub mod payment;
pub mod webhook;

pub use payment::{
    ConfirmTransactionCommand, ConfirmTransactionHandler, ConfirmTransactionResult,
    CreateTransactionCommand, CreateTransactionHandler, GatewayQueryHandler, PaymentIntent,
    PrepareSettings, PrepareTransactionCommand, PrepareTransactionHandler,
};
pub use webhook::{
    IngestSettings, IngestWebhookCommand, IngestWebhookHandler, LookupRetry,
    ReconcileTransactionCommand, ReconcileTransactionHandler, ReconciliationReport,
};
