//! Work dispatched from the webhook ingress edge.

use std::fmt;

use crate::domain::order::ReconciliationAction;
use crate::domain::payment::PaymentReference;

/// Status token returned to the gateway. The HTTP status is always 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressOutcome {
    Ok,
    Forwarded,
    ErrorLogged,
}

impl IngressOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngressOutcome::Ok => "OK",
            IngressOutcome::Forwarded => "FORWARDED",
            IngressOutcome::ErrorLogged => "ERROR_LOGGED",
        }
    }
}

impl fmt::Display for IngressOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Background job submitted to the reconciliation worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationJob {
    /// Apply `action` to the order identified by `reference`.
    Reconcile {
        reference: PaymentReference,
        transaction_id: String,
        action: ReconciliationAction,
        event: String,
    },

    /// Relay the raw notification to a sibling deployment.
    Forward {
        tenant_prefix: String,
        target_url: String,
        body: Vec<u8>,
        checksum_header: Option<String>,
    },
}

impl ReconciliationJob {
    /// Short label used in logs and job reports.
    pub fn label(&self) -> String {
        match self {
            ReconciliationJob::Reconcile {
                reference, action, ..
            } => format!("{}:{}", action, reference),
            ReconciliationJob::Forward { tenant_prefix, .. } => format!("forward:{}", tenant_prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_tokens() {
        assert_eq!(IngressOutcome::Ok.as_str(), "OK");
        assert_eq!(IngressOutcome::Forwarded.as_str(), "FORWARDED");
        assert_eq!(IngressOutcome::ErrorLogged.to_string(), "ERROR_LOGGED");
    }

    #[test]
    fn job_labels() {
        let job = ReconciliationJob::Reconcile {
            reference: PaymentReference::parse("SP-1-A").unwrap(),
            transaction_id: "tx".into(),
            action: ReconciliationAction::Void,
            event: "transaction.voided".into(),
        };
        assert_eq!(job.label(), "void:SP-1-A");

        let forward = ReconciliationJob::Forward {
            tenant_prefix: "MX".into(),
            target_url: "https://mx.example.com/payments/webhook".into(),
            body: vec![],
            checksum_header: None,
        };
        assert_eq!(forward.label(), "forward:MX");
    }
}
