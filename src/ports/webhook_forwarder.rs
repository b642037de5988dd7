//! Port for relaying webhooks to sibling deployments.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    #[error("Forward request failed: {0}")]
    Network(String),

    #[error("Sibling endpoint answered {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait WebhookForwarder: Send + Sync {
    /// POST the raw notification body to `target_url`, passing the checksum
    /// header through when the gateway sent one.
    async fn forward(
        &self,
        target_url: &str,
        body: &[u8],
        checksum_header: Option<&str>,
    ) -> Result<(), ForwardError>;
}
