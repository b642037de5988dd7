//! Bounded worker pool behind the webhook ingress edge.
//!
//! `ReconciliationPool` is the submitting half: a cloneable handle over a
//! bounded channel that never waits. `ReconciliationWorker` is the draining
//! half: it pulls jobs and runs up to `workers` of them at once.
//!
//! ## Shutdown
//!
//! On the shutdown signal the worker stops accepting, runs whatever is
//! already queued, and returns once every in-flight job has finished.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, error, info};

use crate::application::handlers::webhook::{
    ReconcileTransactionCommand, ReconcileTransactionHandler, ReconciliationReport,
};
use crate::domain::webhook::{ReconciliationJob, WebhookError};
use crate::ports::{ForwardError, ReconciliationQueue, WebhookForwarder};

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Jobs run concurrently.
    pub workers: usize,
    /// Jobs waiting before `submit` starts failing.
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            capacity: 256,
        }
    }
}

/// Completion notice for a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub label: String,
    pub outcome: JobOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Reconciled(ReconciliationReport),
    Forwarded,
    ForwardFailed(ForwardError),
}

/// Submitting half. Cheap to clone.
#[derive(Clone)]
pub struct ReconciliationPool {
    sender: mpsc::Sender<ReconciliationJob>,
}

impl ReconciliationQueue for ReconciliationPool {
    fn submit(&self, job: ReconciliationJob) -> Result<(), WebhookError> {
        self.sender.try_send(job).map_err(|e| {
            let label = match &e {
                mpsc::error::TrySendError::Full(job) | mpsc::error::TrySendError::Closed(job) => {
                    job.label()
                }
            };
            error!(job = %label, "Reconciliation queue rejected job");
            WebhookError::QueueFull
        })
    }
}

/// Draining half.
pub struct ReconciliationWorker {
    receiver: mpsc::Receiver<ReconciliationJob>,
    reconciler: Arc<ReconcileTransactionHandler>,
    forwarder: Arc<dyn WebhookForwarder>,
    permits: Arc<Semaphore>,
    workers: usize,
    reports: Option<mpsc::UnboundedSender<JobReport>>,
}

/// Create both halves of a pool.
pub fn reconciliation_pool(
    reconciler: Arc<ReconcileTransactionHandler>,
    forwarder: Arc<dyn WebhookForwarder>,
    config: PoolConfig,
) -> (ReconciliationPool, ReconciliationWorker) {
    let workers = config.workers.max(1);
    let (sender, receiver) = mpsc::channel(config.capacity.max(1));
    let worker = ReconciliationWorker {
        receiver,
        reconciler,
        forwarder,
        permits: Arc::new(Semaphore::new(workers)),
        workers,
        reports: None,
    };
    (ReconciliationPool { sender }, worker)
}

impl ReconciliationWorker {
    /// Send a [`JobReport`] for every finished job.
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<JobReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Drain jobs until shutdown is signalled or every pool handle is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(workers = self.workers, "Reconciliation workers started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }

                job = self.receiver.recv() => {
                    match job {
                        Some(job) => self.dispatch(job).await,
                        None => break,
                    }
                }
            }
        }

        self.receiver.close();
        while let Some(job) = self.receiver.recv().await {
            self.dispatch(job).await;
        }
        // Every permit back means every spawned job has finished
        if let Ok(all) = self.permits.acquire_many(self.workers as u32).await {
            drop(all);
        }
        info!("Reconciliation workers stopped");
    }

    async fn dispatch(&self, job: ReconciliationJob) {
        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!(job = %job.label(), "Worker semaphore closed; job dropped");
                return;
            }
        };

        let reconciler = self.reconciler.clone();
        let forwarder = self.forwarder.clone();
        let reports = self.reports.clone();
        tokio::spawn(async move {
            let label = job.label();
            let outcome = run_job(job, &reconciler, forwarder.as_ref()).await;
            debug!(job = %label, outcome = ?outcome, "Job finished");
            if let Some(reports) = reports {
                let _ = reports.send(JobReport { label, outcome });
            }
            drop(permit);
        });
    }
}

async fn run_job(
    job: ReconciliationJob,
    reconciler: &ReconcileTransactionHandler,
    forwarder: &dyn WebhookForwarder,
) -> JobOutcome {
    match job {
        ReconciliationJob::Reconcile {
            reference,
            transaction_id,
            action,
            event,
        } => {
            let report = reconciler
                .handle(ReconcileTransactionCommand {
                    reference,
                    transaction_id,
                    action,
                    event,
                })
                .await;
            JobOutcome::Reconciled(report)
        }
        ReconciliationJob::Forward {
            tenant_prefix,
            target_url,
            body,
            checksum_header,
        } => match forwarder
            .forward(&target_url, &body, checksum_header.as_deref())
            .await
        {
            Ok(()) => {
                info!(tenant = %tenant_prefix, target = %target_url, "Webhook relayed to sibling");
                JobOutcome::Forwarded
            }
            Err(e) => {
                error!(
                    tenant = %tenant_prefix,
                    target = %target_url,
                    error = %e,
                    "Webhook relay failed"
                );
                JobOutcome::ForwardFailed(e)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryCommissionRepository, InMemoryInventoryLedger, InMemoryOrderRepository,
        ManualClock,
    };
    use crate::application::handlers::webhook::LookupRetry;
    use crate::domain::foundation::Timestamp;
    use crate::domain::order::{Order, PaymentStatus, ReconciliationAction};
    use crate::domain::payment::{Currency, MinorUnits, PaymentReference};
    use crate::ports::{Clock, OrderRepository};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingForwarder {
        sent: Mutex<Vec<(String, Vec<u8>, Option<String>)>>,
        reject: bool,
    }

    #[async_trait]
    impl WebhookForwarder for RecordingForwarder {
        async fn forward(
            &self,
            target_url: &str,
            body: &[u8],
            checksum_header: Option<&str>,
        ) -> Result<(), ForwardError> {
            if self.reject {
                return Err(ForwardError::Rejected(502));
            }
            self.sent.lock().unwrap().push((
                target_url.to_string(),
                body.to_vec(),
                checksum_header.map(str::to_string),
            ));
            Ok(())
        }
    }

    struct Fixture {
        orders: Arc<InMemoryOrderRepository>,
        order: Order,
        reconciler: Arc<ReconcileTransactionHandler>,
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(1_700_000_000).unwrap()));
        let orders = Arc::new(InMemoryOrderRepository::new());
        let order = Order::new_pending(
            PaymentReference::parse("SP-1-A").unwrap(),
            "buyer@example.com",
            Currency::cop(),
            MinorUnits::new(100_000),
            vec![],
            None,
            clock.now(),
        );
        orders.insert(&order).await.unwrap();
        let reconciler = Arc::new(ReconcileTransactionHandler::new(
            orders.clone(),
            Arc::new(InMemoryInventoryLedger::new()),
            Arc::new(InMemoryCommissionRepository::new()),
            clock,
            LookupRetry {
                attempts: 1,
                delay: Duration::ZERO,
            },
        ));
        Fixture {
            orders,
            order,
            reconciler,
        }
    }

    fn approve() -> ReconciliationJob {
        ReconciliationJob::Reconcile {
            reference: PaymentReference::parse("SP-1-A").unwrap(),
            transaction_id: "tx-1".to_string(),
            action: ReconciliationAction::Approve,
            event: "transaction.updated".to_string(),
        }
    }

    #[tokio::test]
    async fn reconcile_job_runs_and_reports() {
        let f = fixture().await;
        let (pool, worker) = reconciliation_pool(
            f.reconciler.clone(),
            Arc::new(RecordingForwarder::default()),
            PoolConfig::default(),
        );
        let (report_tx, mut reports) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(worker.with_reports(report_tx).run(shutdown_rx));

        pool.submit(approve()).unwrap();

        let report = reports.recv().await.unwrap();
        assert_eq!(report.label, "approve:SP-1-A");
        assert!(matches!(
            report.outcome,
            JobOutcome::Reconciled(ReconciliationReport::Applied {
                current: PaymentStatus::Paid,
                ..
            })
        ));
        assert!(f.orders.get(f.order.id).await.unwrap().is_paid());
    }

    #[tokio::test]
    async fn forward_job_relays_body_and_header() {
        let f = fixture().await;
        let forwarder = Arc::new(RecordingForwarder::default());
        let (pool, worker) =
            reconciliation_pool(f.reconciler, forwarder.clone(), PoolConfig::default());
        let (report_tx, mut reports) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(worker.with_reports(report_tx).run(shutdown_rx));

        pool.submit(ReconciliationJob::Forward {
            tenant_prefix: "MX".to_string(),
            target_url: "https://mx.example.com/payments/webhook".to_string(),
            body: b"{\"event\":\"transaction.updated\"}".to_vec(),
            checksum_header: Some("abc123".to_string()),
        })
        .unwrap();

        assert_eq!(reports.recv().await.unwrap().outcome, JobOutcome::Forwarded);
        let sent = forwarder.sent.lock().unwrap();
        assert_eq!(sent[0].0, "https://mx.example.com/payments/webhook");
        assert_eq!(sent[0].2.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn failed_relay_is_reported() {
        let f = fixture().await;
        let forwarder = Arc::new(RecordingForwarder {
            reject: true,
            ..Default::default()
        });
        let (pool, worker) = reconciliation_pool(f.reconciler, forwarder, PoolConfig::default());
        let (report_tx, mut reports) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(worker.with_reports(report_tx).run(shutdown_rx));

        pool.submit(ReconciliationJob::Forward {
            tenant_prefix: "MX".to_string(),
            target_url: "https://mx.example.com/payments/webhook".to_string(),
            body: vec![],
            checksum_header: None,
        })
        .unwrap();

        assert_eq!(
            reports.recv().await.unwrap().outcome,
            JobOutcome::ForwardFailed(ForwardError::Rejected(502))
        );
    }

    #[tokio::test]
    async fn saturated_queue_rejects_without_waiting() {
        let f = fixture().await;
        let (pool, _worker) = reconciliation_pool(
            f.reconciler,
            Arc::new(RecordingForwarder::default()),
            PoolConfig {
                workers: 1,
                capacity: 1,
            },
        );

        pool.submit(approve()).unwrap();
        assert_eq!(pool.submit(approve()), Err(WebhookError::QueueFull));
    }

    #[tokio::test]
    async fn shutdown_drains_queued_jobs() {
        let f = fixture().await;
        let (pool, worker) = reconciliation_pool(
            f.reconciler,
            Arc::new(RecordingForwarder::default()),
            PoolConfig::default(),
        );
        pool.submit(approve()).unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), worker.run(shutdown_rx))
            .await
            .expect("worker should stop");

        assert!(f.orders.get(f.order.id).await.unwrap().is_paid());
    }
}
