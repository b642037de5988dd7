//! Payment handlers.

mod confirm_transaction;
mod create_transaction;
mod gateway_queries;
mod prepare_transaction;

pub use confirm_transaction::{
    ConfirmTransactionCommand, ConfirmTransactionHandler, ConfirmTransactionResult,
};
pub use create_transaction::{CreateTransactionCommand, CreateTransactionHandler};
pub use gateway_queries::GatewayQueryHandler;
pub use prepare_transaction::{
    PaymentIntent, PrepareSettings, PrepareTransactionCommand, PrepareTransactionHandler,
};
