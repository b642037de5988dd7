//! Port for submitting background reconciliation work.

use crate::domain::webhook::{ReconciliationJob, WebhookError};

/// Accepts jobs without waiting for them to run.
pub trait ReconciliationQueue: Send + Sync {
    /// Enqueue `job`.
    ///
    /// # Errors
    ///
    /// - `QueueFull` when the queue is saturated or shut down
    fn submit(&self, job: ReconciliationJob) -> Result<(), WebhookError>;
}
