//! IngestWebhookHandler - authenticates, routes and dispatches gateway
//! notifications.
//!
//! The HTTP endpoint always answers 200; this handler decides which status
//! token goes back and logs everything else. Reconciliation itself runs on
//! the worker pool behind [`ReconciliationQueue`].

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::domain::payment::signature::verify_webhook_checksum;
use crate::domain::payment::{ChecksumError, PaymentReference};
use crate::domain::webhook::{GatewayEvent, IngressOutcome, ReconciliationJob, WebhookError};
use crate::ports::{Clock, ReconciliationQueue};

/// Ingress settings. Built from `WebhookConfig` and `PaymentConfig`.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    events_secret: SecretString,
    max_event_age_secs: i64,
    tenant_prefix: String,
    /// Sibling endpoints keyed by upper-cased prefix.
    routes: HashMap<String, String>,
}

impl IngestSettings {
    pub fn new(
        events_secret: SecretString,
        max_event_age_secs: i64,
        tenant_prefix: &str,
        routes: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            events_secret,
            max_event_age_secs,
            tenant_prefix: tenant_prefix.to_ascii_uppercase(),
            routes: routes
                .into_iter()
                .map(|(prefix, url)| (prefix.to_ascii_uppercase(), url))
                .collect(),
        }
    }

    fn route_for(&self, prefix: &str) -> Route<'_> {
        let prefix = prefix.to_ascii_uppercase();
        if prefix == self.tenant_prefix {
            return Route::Local;
        }
        match self.routes.get(&prefix) {
            Some(url) => Route::Forward(url),
            None => Route::Unknown,
        }
    }
}

enum Route<'a> {
    Local,
    Forward(&'a str),
    Unknown,
}

/// One inbound notification, as received.
#[derive(Debug, Clone)]
pub struct IngestWebhookCommand {
    pub body: Vec<u8>,
    /// `X-Event-Checksum` header, if present.
    pub checksum_header: Option<String>,
    /// Client address for incident logs.
    pub source_ip: Option<String>,
}

pub struct IngestWebhookHandler {
    queue: Arc<dyn ReconciliationQueue>,
    clock: Arc<dyn Clock>,
    settings: IngestSettings,
}

impl IngestWebhookHandler {
    pub fn new(
        queue: Arc<dyn ReconciliationQueue>,
        clock: Arc<dyn Clock>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            queue,
            clock,
            settings,
        }
    }

    /// Never fails: every error becomes `ERROR_LOGGED` after being logged.
    pub fn handle(&self, cmd: IngestWebhookCommand) -> IngressOutcome {
        let source_ip = cmd.source_ip.clone().unwrap_or_else(|| "unknown".to_string());
        match self.ingest(cmd) {
            Ok(outcome) => outcome,
            Err(e) => {
                log_rejection(&e, &source_ip);
                IngressOutcome::ErrorLogged
            }
        }
    }

    fn ingest(&self, cmd: IngestWebhookCommand) -> Result<IngressOutcome, WebhookError> {
        let event = GatewayEvent::parse(&cmd.body)?;

        // 1. Checksum present (header first), timestamp present and fresh
        let checksum = cmd
            .checksum_header
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or_else(|| event.body_checksum())
            .ok_or(WebhookError::MissingChecksum)?
            .to_string();

        let timestamp = event.timestamp.as_ref().ok_or(WebhookError::MissingTimestamp)?;
        let sent_at = timestamp.to_timestamp()?;
        let age_secs = self.clock.now().abs_diff_secs(&sent_at);
        if age_secs > self.settings.max_event_age_secs {
            return Err(WebhookError::StaleEvent { age_secs });
        }

        // 2. Checksum over the declared properties
        verify_webhook_checksum(
            &event.data,
            event.signed_properties(),
            &timestamp.signed_text(),
            self.settings.events_secret.expose_secret(),
            &checksum,
        )?;

        // 3. Tenant routing on the reference prefix
        let transaction = event.transaction()?;
        let reference = PaymentReference::parse(&transaction.reference)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        if let Some(prefix) = reference.tenant_prefix() {
            match self.settings.route_for(prefix) {
                Route::Local => {}
                Route::Forward(target_url) => {
                    self.queue.submit(ReconciliationJob::Forward {
                        tenant_prefix: prefix.to_string(),
                        target_url: target_url.to_string(),
                        body: cmd.body,
                        checksum_header: cmd.checksum_header,
                    })?;
                    info!(reference = %reference, tenant = prefix, "Webhook forwarded to sibling");
                    return Ok(IngressOutcome::Forwarded);
                }
                Route::Unknown => return Err(WebhookError::UnknownTenant(prefix.to_string())),
            }
        }

        // 4. Dispatch by event type
        let kind = event.kind();
        let Some(action) = kind.action(&transaction.status) else {
            debug!(
                reference = %reference,
                event = %kind,
                status = %transaction.status,
                "Event carries no reconcilable outcome"
            );
            return Ok(IngressOutcome::Ok);
        };

        self.queue.submit(ReconciliationJob::Reconcile {
            reference: reference.clone(),
            transaction_id: transaction.id.clone(),
            action,
            event: kind.to_string(),
        })?;

        info!(
            reference = %reference,
            transaction_id = %transaction.id,
            event = %kind,
            action = %action,
            "Webhook accepted"
        );
        Ok(IngressOutcome::Ok)
    }
}

fn log_rejection(err: &WebhookError, source_ip: &str) {
    match err {
        WebhookError::Checksum(ChecksumError::Mismatch { expected, received }) => warn!(
            source_ip,
            expected = %expected,
            received = %received,
            "Unauthorized webhook: checksum mismatch"
        ),
        e if e.is_authentication_failure() => warn!(
            source_ip,
            error = %e,
            "Unauthorized webhook"
        ),
        WebhookError::StaleEvent { age_secs } => warn!(
            source_ip,
            age_secs,
            "Stale webhook rejected"
        ),
        e => warn!(source_ip, error = %e, "Webhook not processed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ManualClock;
    use crate::domain::foundation::Timestamp;
    use crate::domain::order::ReconciliationAction;
    use crate::domain::payment::signature::webhook_checksum;
    use serde_json::json;
    use std::sync::Mutex;

    const SECRET: &str = "test_events_secret";
    const NOW: i64 = 1_700_000_000;

    #[derive(Default)]
    struct RecordingQueue {
        jobs: Mutex<Vec<ReconciliationJob>>,
        full: bool,
    }

    impl ReconciliationQueue for RecordingQueue {
        fn submit(&self, job: ReconciliationJob) -> Result<(), WebhookError> {
            if self.full {
                return Err(WebhookError::QueueFull);
            }
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }
    }

    fn handler_with(queue: Arc<RecordingQueue>) -> IngestWebhookHandler {
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(NOW).unwrap()));
        IngestWebhookHandler::new(
            queue,
            clock,
            IngestSettings::new(
                SecretString::new(SECRET.to_string()),
                600,
                "SP",
                [("mx".to_string(), "https://mx.example.com/payments/webhook".to_string())],
            ),
        )
    }

    fn signed_event(event: &str, reference: &str, status: &str, timestamp: i64) -> serde_json::Value {
        let checksum = webhook_checksum(
            &["tx-1", status, "5000000"],
            &timestamp.to_string(),
            SECRET,
        );
        json!({
            "event": event,
            "data": {
                "transaction": {
                    "id": "tx-1",
                    "reference": reference,
                    "amount_in_cents": 5000000,
                    "currency": "COP",
                    "status": status
                }
            },
            "signature": {
                "properties": ["transaction.id", "transaction.status", "transaction.amount_in_cents"],
                "checksum": checksum
            },
            "timestamp": timestamp
        })
    }

    fn command(body: serde_json::Value) -> IngestWebhookCommand {
        IngestWebhookCommand {
            body: serde_json::to_vec(&body).unwrap(),
            checksum_header: None,
            source_ip: Some("203.0.113.9".to_string()),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Accepted
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn approved_update_is_queued() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());

        let outcome = handler.handle(command(signed_event("transaction.updated", "SP-1-A", "APPROVED", NOW)));

        assert_eq!(outcome, IngressOutcome::Ok);
        let jobs = queue.jobs.lock().unwrap();
        assert!(matches!(
            &jobs[0],
            ReconciliationJob::Reconcile { action: ReconciliationAction::Approve, transaction_id, .. }
                if transaction_id == "tx-1"
        ));
    }

    #[test]
    fn specific_and_generic_events_converge() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());

        handler.handle(command(signed_event("transaction.updated", "SP-1-A", "VOIDED", NOW)));
        handler.handle(command(signed_event("voided", "SP-1-A", "VOIDED", NOW)));

        let actions: Vec<_> = queue
            .jobs
            .lock()
            .unwrap()
            .iter()
            .map(|job| match job {
                ReconciliationJob::Reconcile { action, .. } => Some(*action),
                ReconciliationJob::Forward { .. } => None,
            })
            .collect();
        assert_eq!(actions, vec![Some(ReconciliationAction::Void); 2]);
    }

    #[test]
    fn header_checksum_is_accepted() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());
        let mut body = signed_event("transaction.updated", "SP-1-A", "APPROVED", NOW);
        let checksum = body["signature"]["checksum"].take();
        let mut cmd = command(body);
        cmd.checksum_header = checksum.as_str().map(|c| c.to_ascii_uppercase());

        assert_eq!(handler.handle(cmd), IngressOutcome::Ok);
    }

    #[test]
    fn pending_update_is_acknowledged_without_work() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());

        let outcome = handler.handle(command(signed_event("transaction.updated", "SP-1-A", "PENDING", NOW)));

        assert_eq!(outcome, IngressOutcome::Ok);
        assert!(queue.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn foreign_prefix_is_forwarded_untouched() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());
        let cmd = command(signed_event("transaction.updated", "MX-1-A", "APPROVED", NOW));
        let raw = cmd.body.clone();

        assert_eq!(handler.handle(cmd), IngressOutcome::Forwarded);
        let jobs = queue.jobs.lock().unwrap();
        match &jobs[0] {
            ReconciliationJob::Forward { target_url, body, .. } => {
                assert_eq!(target_url, "https://mx.example.com/payments/webhook");
                assert_eq!(body, &raw);
            }
            other => panic!("expected forward, got {:?}", other),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Rejected, still acknowledged
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn tampered_status_is_unauthorized() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());
        let mut body = signed_event("transaction.updated", "SP-1-A", "DECLINED", NOW);
        body["data"]["transaction"]["status"] = json!("APPROVED");

        assert_eq!(handler.handle(command(body)), IngressOutcome::ErrorLogged);
        assert!(queue.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn tampered_timestamp_is_unauthorized() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());
        let mut body = signed_event("transaction.updated", "SP-1-A", "APPROVED", NOW);
        body["timestamp"] = json!(NOW + 1);

        assert_eq!(handler.handle(command(body)), IngressOutcome::ErrorLogged);
        assert!(queue.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_checksum_is_unauthorized() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());
        let mut body = signed_event("transaction.updated", "SP-1-A", "APPROVED", NOW);
        body["signature"]["checksum"] = json!(null);

        assert_eq!(handler.handle(command(body)), IngressOutcome::ErrorLogged);
    }

    #[test]
    fn stale_event_is_rejected_even_when_signed() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());

        let outcome = handler.handle(command(signed_event("transaction.updated", "SP-1-A", "APPROVED", NOW - 601)));

        assert_eq!(outcome, IngressOutcome::ErrorLogged);
        assert!(queue.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());
        let mut body = signed_event("transaction.updated", "SP-1-A", "APPROVED", NOW);
        body.as_object_mut().unwrap().remove("timestamp");

        assert_eq!(handler.handle(command(body)), IngressOutcome::ErrorLogged);
    }

    #[test]
    fn unknown_prefix_is_logged() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = handler_with(queue.clone());

        let outcome = handler.handle(command(signed_event("transaction.updated", "PE-1-A", "APPROVED", NOW)));

        assert_eq!(outcome, IngressOutcome::ErrorLogged);
        assert!(queue.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn full_queue_is_logged() {
        let queue = Arc::new(RecordingQueue {
            full: true,
            ..Default::default()
        });
        let handler = handler_with(queue);

        let outcome = handler.handle(command(signed_event("transaction.updated", "SP-1-A", "APPROVED", NOW)));
        assert_eq!(outcome, IngressOutcome::ErrorLogged);
    }

    #[test]
    fn garbage_body_is_logged() {
        let handler = handler_with(Arc::new(RecordingQueue::default()));
        let outcome = handler.handle(IngestWebhookCommand {
            body: b"not json".to_vec(),
            checksum_header: None,
            source_ip: None,
        });
        assert_eq!(outcome, IngressOutcome::ErrorLogged);
    }
}
