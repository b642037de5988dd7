//! Relays raw gateway notifications to sibling tenant deployments.
//!
//! The body is sent byte-for-byte so the sibling can verify the checksum
//! itself. The checksum header is passed through when the gateway sent one.

use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{ForwardError, WebhookForwarder};

/// Header the gateway may use to carry the event checksum.
pub const CHECKSUM_HEADER: &str = "x-event-checksum";

pub struct HttpWebhookForwarder {
    http_client: reqwest::Client,
}

impl HttpWebhookForwarder {
    pub fn new(timeout: Duration) -> Result<Self, ForwardError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForwardError::Network(e.to_string()))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl WebhookForwarder for HttpWebhookForwarder {
    async fn forward(
        &self,
        target_url: &str,
        body: &[u8],
        checksum_header: Option<&str>,
    ) -> Result<(), ForwardError> {
        let mut request = self
            .http_client
            .post(target_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_vec());
        if let Some(checksum) = checksum_header {
            request = request.header(CHECKSUM_HEADER, checksum);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ForwardError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ForwardError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_sibling_is_network_error() {
        let forwarder = HttpWebhookForwarder::new(Duration::from_millis(200)).unwrap();

        let err = forwarder
            .forward("http://127.0.0.1:9/payments/webhook", b"{}", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Network(_)));
    }
}
