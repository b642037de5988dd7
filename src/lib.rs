//! Storefront Payments - transaction integrity and webhook reconciliation.
//!
//! Signs payment intents so the client cannot tamper with the amount,
//! cross-checks client-reported transactions against the gateway, and turns
//! authenticated gateway notifications into idempotent order, inventory and
//! commission updates.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
