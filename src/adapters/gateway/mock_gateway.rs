//! Mock payment gateway for testing.
//!
//! Supports:
//! - Pre-configured transactions and acceptance token
//! - Error injection, once or per method
//! - Call tracking
//! - Created-transaction capture

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::payment::{GatewayTransaction, TransactionStatus};
use crate::ports::{
    AcceptanceToken, CardDetails, CardToken, CreateTransactionRequest, FinancialInstitution,
    GatewayError, PaymentGateway,
};

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.add_transaction(approved_tx);
/// gateway.set_method_error("acceptance_token", GatewayError::network("down"));
/// ```
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    transactions: HashMap<String, GatewayTransaction>,
    acceptance_token: Option<AcceptanceToken>,
    banks: Vec<FinancialInstitution>,
    created: Vec<CreateTransactionRequest>,
    next_error: Option<GatewayError>,
    method_errors: HashMap<String, GatewayError>,
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a transaction to the gateway's "database".
    pub fn add_transaction(&self, transaction: GatewayTransaction) {
        self.state()
            .transactions
            .insert(transaction.id.clone(), transaction);
    }

    pub fn set_acceptance_token(&self, token: AcceptanceToken) {
        self.state().acceptance_token = Some(token);
    }

    pub fn set_banks(&self, banks: Vec<FinancialInstitution>) {
        self.state().banks = banks;
    }

    /// Fail the next call to any method.
    pub fn set_error(&self, error: GatewayError) {
        self.state().next_error = Some(error);
    }

    /// Fail every call to `method` until cleared.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Requests received by `create_transaction`.
    pub fn created_requests(&self) -> Vec<CreateTransactionRequest> {
        self.state().created.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        let mut state = self.state();
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn acceptance_token(&self) -> Result<AcceptanceToken, GatewayError> {
        self.record_call("acceptance_token", vec![]);
        self.check_error("acceptance_token")?;

        let state = self.state();
        Ok(state.acceptance_token.clone().unwrap_or_else(|| AcceptanceToken {
            token: "mock_acceptance_token".to_string(),
            permalink: "https://gateway.example.com/terms.pdf".to_string(),
        }))
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, GatewayError> {
        self.record_call("get_transaction", vec![transaction_id.to_string()]);
        self.check_error("get_transaction")?;

        self.state()
            .transactions
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found("transaction"))
    }

    async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<GatewayTransaction, GatewayError> {
        self.record_call(
            "create_transaction",
            vec![request.reference.clone(), request.amount_in_cents.to_string()],
        );
        self.check_error("create_transaction")
            .map_err(GatewayError::non_retryable)?;

        let transaction = GatewayTransaction {
            id: format!("mock-{}", uuid::Uuid::new_v4().simple()),
            reference: request.reference.clone(),
            amount_in_cents: request.amount_in_cents,
            currency: request.currency.clone(),
            status: TransactionStatus::Pending,
            status_message: None,
            payment_method_type: Some(request.payment_method.method().as_str().to_string()),
            customer_email: Some(request.customer_email.clone()),
        };

        let mut state = self.state();
        state.created.push(request);
        state
            .transactions
            .insert(transaction.id.clone(), transaction.clone());
        Ok(transaction)
    }

    async fn tokenize_card(&self, request: CardDetails) -> Result<CardToken, GatewayError> {
        let last_four = request
            .number
            .get(request.number.len().saturating_sub(4)..)
            .unwrap_or_default()
            .to_string();
        self.record_call("tokenize_card", vec![last_four.clone()]);
        self.check_error("tokenize_card")?;

        Ok(CardToken {
            id: format!("tok_mock_{}", uuid::Uuid::new_v4().simple()),
            brand: "VISA".to_string(),
            last_four,
            exp_month: request.exp_month,
            exp_year: request.exp_year,
        })
    }

    async fn list_pse_banks(&self) -> Result<Vec<FinancialInstitution>, GatewayError> {
        self.record_call("list_pse_banks", vec![]);
        self.check_error("list_pse_banks")?;
        Ok(self.state().banks.clone())
    }
}
