//! Webhook handlers.

mod ingest_webhook;
mod reconcile_transaction;

pub use ingest_webhook::{IngestSettings, IngestWebhookCommand, IngestWebhookHandler};
pub use reconcile_transaction::{
    LookupRetry, ReconcileTransactionCommand, ReconcileTransactionHandler, ReconciliationReport,
};
