//! Webhook relay to sibling deployments.

mod http_forwarder;

pub use http_forwarder::{HttpWebhookForwarder, CHECKSUM_HEADER};
