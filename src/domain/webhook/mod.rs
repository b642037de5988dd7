//! Webhook domain module.
//!
//! Types for inbound gateway notifications: the event envelope, its
//! classification into reconciliation actions, ingress outcomes and the
//! background jobs dispatched from the ingress edge.

mod errors;
mod event;
mod job;

pub use errors::WebhookError;
pub use event::{EventKind, EventSignature, EventTimestamp, GatewayEvent};
pub use job::{IngressOutcome, ReconciliationJob};
