//! ConfirmTransactionHandler - server-side check of a client-reported payment.
//!
//! Each step is a hard gate, in this order:
//! 1. live prepared intent for the reference
//! 2. client amount equals the prepared amount
//! 3. client signature equals the re-derived signature
//! 4. intent claimed atomically; a concurrent confirmation gets not-found
//! 5. authoritative transaction fetched from the gateway
//! 6. gateway reference, amount and currency equal the prepared intent
//!
//! A failure in 5 or 6 puts the claimed intent back. Order state is never
//! touched here.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::payment::signature::verify_integrity_signature;
use crate::domain::payment::{
    Currency, GatewayTransaction, MinorUnits, NotFoundKind, PaymentError, PaymentReference,
    PreparedIntent, TransactionStatus,
};
use crate::ports::{IntentStore, PaymentGateway};

#[derive(Debug, Clone)]
pub struct ConfirmTransactionCommand {
    pub reference: PaymentReference,
    pub transaction_id: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub integrity_signature: String,
}

/// Verified outcome as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmTransactionResult {
    pub reference: PaymentReference,
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub status_message: Option<String>,
    pub amount_in_cents: i64,
    pub currency: String,
    pub payment_method_type: Option<String>,
}

pub struct ConfirmTransactionHandler {
    intents: Arc<dyn IntentStore>,
    gateway: Arc<dyn PaymentGateway>,
    integrity_secret: SecretString,
}

impl ConfirmTransactionHandler {
    pub fn new(
        intents: Arc<dyn IntentStore>,
        gateway: Arc<dyn PaymentGateway>,
        integrity_secret: SecretString,
    ) -> Self {
        Self {
            intents,
            gateway,
            integrity_secret,
        }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmTransactionCommand,
    ) -> Result<ConfirmTransactionResult, PaymentError> {
        if cmd.transaction_id.trim().is_empty() {
            return Err(PaymentError::Validation("transaction id is required".to_string()));
        }

        // 1. Anti-replay boundary for the preparation phase
        let intent = self
            .intents
            .get(&cmd.reference)
            .await?
            .ok_or_else(|| PaymentError::not_found(NotFoundKind::Intent, cmd.reference.as_str()))?;

        // 2. Amount, exact
        if cmd.amount_in_cents != intent.amount().value() {
            warn!(
                reference = %cmd.reference,
                transaction_id = %cmd.transaction_id,
                expected = intent.amount().value(),
                received = cmd.amount_in_cents,
                "Confirmation amount mismatch"
            );
            return Err(PaymentError::AmountMismatch {
                expected: intent.amount().value(),
                received: cmd.amount_in_cents,
            });
        }

        let currency = Currency::parse(&cmd.currency)
            .map_err(|_| PaymentError::data_mismatch("currency", intent.currency(), &cmd.currency))?;
        if &currency != intent.currency() {
            warn!(
                reference = %cmd.reference,
                expected = %intent.currency(),
                received = %currency,
                "Confirmation currency mismatch"
            );
            return Err(PaymentError::data_mismatch("currency", intent.currency(), currency));
        }

        // 3. Signature over the server's own values
        if !verify_integrity_signature(
            intent.reference().as_str(),
            intent.amount(),
            intent.currency(),
            self.integrity_secret.expose_secret(),
            &cmd.integrity_signature,
        ) {
            warn!(
                reference = %cmd.reference,
                transaction_id = %cmd.transaction_id,
                received = %cmd.integrity_signature,
                "Confirmation integrity signature mismatch"
            );
            return Err(PaymentError::InvalidSignature);
        }

        // 4. Single use
        let intent = self
            .intents
            .take(&cmd.reference)
            .await?
            .ok_or_else(|| PaymentError::not_found(NotFoundKind::Intent, cmd.reference.as_str()))?;

        // 5-6. Authoritative record, which must agree with what we quoted
        let transaction = match self.verified_transaction(&intent, &cmd).await {
            Ok(transaction) => transaction,
            Err(e) => {
                self.release(intent).await;
                return Err(e);
            }
        };

        info!(
            reference = %cmd.reference,
            transaction_id = %transaction.id,
            status = %transaction.status,
            "Transaction confirmed"
        );

        Ok(ConfirmTransactionResult {
            reference: cmd.reference,
            transaction_id: transaction.id,
            status: transaction.status,
            status_message: transaction.status_message,
            amount_in_cents: transaction.amount_in_cents,
            currency: transaction.currency,
            payment_method_type: transaction.payment_method_type,
        })
    }

    async fn verified_transaction(
        &self,
        intent: &PreparedIntent,
        cmd: &ConfirmTransactionCommand,
    ) -> Result<GatewayTransaction, PaymentError> {
        let transaction = self.gateway.get_transaction(&cmd.transaction_id).await?;
        cross_check(intent, &transaction.reference, transaction.amount_in_cents, &transaction.currency)
            .map_err(|e| {
                warn!(
                    reference = %cmd.reference,
                    transaction_id = %cmd.transaction_id,
                    error = %e,
                    "Gateway record disagrees with prepared intent"
                );
                e
            })?;
        Ok(transaction)
    }

    /// Put a claimed intent back so the client can retry.
    async fn release(&self, intent: PreparedIntent) {
        let reference = intent.reference().clone();
        if let Err(e) = self.intents.insert(intent).await {
            warn!(reference = %reference, error = %e, "Failed to restore prepared intent");
        }
    }
}

fn cross_check(
    intent: &PreparedIntent,
    reference: &str,
    amount_in_cents: i64,
    currency: &str,
) -> Result<(), PaymentError> {
    if reference != intent.reference().as_str() {
        return Err(PaymentError::data_mismatch("reference", intent.reference(), reference));
    }
    if MinorUnits::new(amount_in_cents) != intent.amount() {
        return Err(PaymentError::data_mismatch("amount", intent.amount(), amount_in_cents));
    }
    if !currency.eq_ignore_ascii_case(intent.currency().as_str()) {
        return Err(PaymentError::data_mismatch("currency", intent.currency(), currency));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryIntentStore, ManualClock, MockPaymentGateway};
    use crate::domain::foundation::Timestamp;
    use crate::domain::payment::signature::integrity_signature;
    use crate::ports::{
        AcceptanceToken, CardDetails, CardToken, Clock, CreateTransactionRequest,
        FinancialInstitution, GatewayError,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    const SECRET: &str = "test_integrity_secret";
    const REFERENCE: &str = "SP-LX3K9Q2A-9F3A1C0B7E2D4F11";

    struct Fixture {
        clock: Arc<ManualClock>,
        intents: Arc<InMemoryIntentStore>,
        gateway: Arc<MockPaymentGateway>,
        handler: ConfirmTransactionHandler,
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(1_700_000_000).unwrap()));
        let intents = Arc::new(InMemoryIntentStore::new(clock.clone()));
        let gateway = Arc::new(MockPaymentGateway::new());
        intents
            .insert(PreparedIntent::new(
                reference(),
                MinorUnits::new(5_000_000),
                Currency::cop(),
                "buyer@example.com",
                clock.now(),
                900,
            ))
            .await
            .unwrap();
        gateway.add_transaction(transaction(REFERENCE, 5_000_000, "COP"));

        let handler = ConfirmTransactionHandler::new(
            intents.clone(),
            gateway.clone(),
            SecretString::new(SECRET.to_string()),
        );
        Fixture {
            clock,
            intents,
            gateway,
            handler,
        }
    }

    fn reference() -> PaymentReference {
        PaymentReference::parse(REFERENCE).unwrap()
    }

    fn transaction(reference: &str, amount: i64, currency: &str) -> GatewayTransaction {
        GatewayTransaction {
            id: "tx-1".to_string(),
            reference: reference.to_string(),
            amount_in_cents: amount,
            currency: currency.to_string(),
            status: TransactionStatus::Approved,
            status_message: None,
            payment_method_type: Some("CARD".to_string()),
            customer_email: Some("buyer@example.com".to_string()),
        }
    }

    fn command(amount: i64) -> ConfirmTransactionCommand {
        ConfirmTransactionCommand {
            reference: reference(),
            transaction_id: "tx-1".to_string(),
            amount_in_cents: amount,
            currency: "COP".to_string(),
            integrity_signature: integrity_signature(
                REFERENCE,
                MinorUnits::new(5_000_000),
                &Currency::cop(),
                SECRET,
            ),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Success
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn confirms_and_consumes_intent() {
        let f = fixture().await;

        let result = f.handler.handle(command(5_000_000)).await.unwrap();

        assert_eq!(result.status, TransactionStatus::Approved);
        assert!(f.intents.get(&reference()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn uppercase_signature_accepted() {
        let f = fixture().await;
        let mut cmd = command(5_000_000);
        cmd.integrity_signature = cmd.integrity_signature.to_ascii_uppercase();

        assert!(f.handler.handle(cmd).await.is_ok());
    }

    // ══════════════════════════════════════════════════════════════
    // Gates
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn amount_off_by_one_is_rejected_and_intent_kept() {
        let f = fixture().await;

        let err = f.handler.handle(command(4_999_999)).await.unwrap_err();

        assert_eq!(
            err,
            PaymentError::AmountMismatch {
                expected: 5_000_000,
                received: 4_999_999
            }
        );
        assert!(f.intents.get(&reference()).await.unwrap().is_some());
        assert_eq!(f.gateway.call_count("get_transaction"), 0);
    }

    #[tokio::test]
    async fn forged_signature_rejected() {
        let f = fixture().await;
        let mut cmd = command(5_000_000);
        cmd.integrity_signature = "0".repeat(64);

        assert_eq!(f.handler.handle(cmd).await.unwrap_err(), PaymentError::InvalidSignature);
        assert_eq!(f.gateway.call_count("get_transaction"), 0);
    }

    #[tokio::test]
    async fn expired_intent_is_not_found_even_with_valid_signature() {
        let f = fixture().await;
        f.clock.advance_secs(16 * 60);

        let err = f.handler.handle(command(5_000_000)).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::NotFound {
                kind: NotFoundKind::Intent,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn currency_mismatch_is_data_mismatch() {
        let f = fixture().await;
        let mut cmd = command(5_000_000);
        cmd.currency = "USD".to_string();

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, PaymentError::DataMismatch { field: "currency", .. }));
    }

    #[tokio::test]
    async fn gateway_amount_disagreement_is_data_mismatch() {
        let f = fixture().await;
        f.gateway.add_transaction(transaction(REFERENCE, 4_000_000, "COP"));

        let err = f.handler.handle(command(5_000_000)).await.unwrap_err();

        assert!(matches!(err, PaymentError::DataMismatch { field: "amount", .. }));
        assert!(f.intents.get(&reference()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn gateway_reference_disagreement_is_data_mismatch() {
        let f = fixture().await;
        f.gateway.add_transaction(transaction("SP-OTHER-REF", 5_000_000, "COP"));

        let err = f.handler.handle(command(5_000_000)).await.unwrap_err();
        assert!(matches!(err, PaymentError::DataMismatch { field: "reference", .. }));
    }

    #[tokio::test]
    async fn unknown_gateway_transaction_is_not_found() {
        let f = fixture().await;
        let mut cmd = command(5_000_000);
        cmd.transaction_id = "tx-unknown".to_string();

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::NotFound {
                kind: NotFoundKind::Transaction,
                ..
            }
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Single use
    // ══════════════════════════════════════════════════════════════

    /// Holds every transaction lookup long enough for a second
    /// confirmation to interleave.
    struct SlowGateway(Arc<MockPaymentGateway>);

    #[async_trait]
    impl PaymentGateway for SlowGateway {
        async fn acceptance_token(&self) -> Result<AcceptanceToken, GatewayError> {
            self.0.acceptance_token().await
        }

        async fn get_transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, GatewayError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0.get_transaction(transaction_id).await
        }

        async fn create_transaction(
            &self,
            request: CreateTransactionRequest,
        ) -> Result<GatewayTransaction, GatewayError> {
            self.0.create_transaction(request).await
        }

        async fn tokenize_card(&self, request: CardDetails) -> Result<CardToken, GatewayError> {
            self.0.tokenize_card(request).await
        }

        async fn list_pse_banks(&self) -> Result<Vec<FinancialInstitution>, GatewayError> {
            self.0.list_pse_banks().await
        }
    }

    #[tokio::test]
    async fn concurrent_confirmations_consume_intent_once() {
        let f = fixture().await;
        let handler = ConfirmTransactionHandler::new(
            f.intents.clone(),
            Arc::new(SlowGateway(f.gateway.clone())),
            SecretString::new(SECRET.to_string()),
        );

        let (first, second) = tokio::join!(
            handler.handle(command(5_000_000)),
            handler.handle(command(5_000_000))
        );

        let (ok, err) = match (first, second) {
            (Ok(ok), Err(err)) | (Err(err), Ok(ok)) => (ok, err),
            (a, b) => panic!("expected exactly one success, got {:?} and {:?}", a, b),
        };
        assert_eq!(ok.status, TransactionStatus::Approved);
        assert!(matches!(
            err,
            PaymentError::NotFound {
                kind: NotFoundKind::Intent,
                ..
            }
        ));
        assert_eq!(f.gateway.call_count("get_transaction"), 1);
    }

    #[tokio::test]
    async fn replay_after_success_is_not_found() {
        let f = fixture().await;
        f.handler.handle(command(5_000_000)).await.unwrap();

        let err = f.handler.handle(command(5_000_000)).await.unwrap_err();

        assert!(matches!(
            err,
            PaymentError::NotFound {
                kind: NotFoundKind::Intent,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn gateway_failure_releases_intent_for_retry() {
        let f = fixture().await;
        f.gateway
            .set_method_error("get_transaction", GatewayError::network("read timeout"));

        assert!(f.handler.handle(command(5_000_000)).await.is_err());
        assert!(f.intents.get(&reference()).await.unwrap().is_some());

        f.gateway.clear_errors();
        assert!(f.handler.handle(command(5_000_000)).await.is_ok());
    }
}
