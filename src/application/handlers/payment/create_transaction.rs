//! CreateTransactionHandler - server-side charge for a prepared reference.
//!
//! The charged amount always comes from the prepared intent. A failed or
//! timed-out create is reported, never retried: the gateway may have charged.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::domain::payment::signature::integrity_signature;
use crate::domain::payment::{GatewayTransaction, NotFoundKind, PaymentError, PaymentReference};
use crate::ports::{CreateTransactionRequest, IntentStore, PaymentGateway, PaymentMethodData};

#[derive(Debug, Clone)]
pub struct CreateTransactionCommand {
    pub reference: PaymentReference,
    pub payment_method: PaymentMethodData,
}

pub struct CreateTransactionHandler {
    intents: Arc<dyn IntentStore>,
    gateway: Arc<dyn PaymentGateway>,
    integrity_secret: SecretString,
    redirect_url: String,
}

impl CreateTransactionHandler {
    pub fn new(
        intents: Arc<dyn IntentStore>,
        gateway: Arc<dyn PaymentGateway>,
        integrity_secret: SecretString,
        redirect_url: String,
    ) -> Self {
        Self {
            intents,
            gateway,
            integrity_secret,
            redirect_url,
        }
    }

    pub async fn handle(&self, cmd: CreateTransactionCommand) -> Result<GatewayTransaction, PaymentError> {
        let intent = self
            .intents
            .get(&cmd.reference)
            .await?
            .ok_or_else(|| PaymentError::not_found(NotFoundKind::Intent, cmd.reference.as_str()))?;

        let acceptance = self.gateway.acceptance_token().await?;
        let signature = integrity_signature(
            intent.reference().as_str(),
            intent.amount(),
            intent.currency(),
            self.integrity_secret.expose_secret(),
        );
        let method = cmd.payment_method.method();

        let request = CreateTransactionRequest {
            reference: intent.reference().to_string(),
            amount_in_cents: intent.amount().value(),
            currency: intent.currency().to_string(),
            signature,
            customer_email: intent.customer_email().to_string(),
            acceptance_token: acceptance.token,
            redirect_url: Some(self.redirect_url.clone()),
            payment_method: cmd.payment_method,
        };

        let transaction = self
            .gateway
            .create_transaction(request)
            .await
            .map_err(|e| {
                warn!(reference = %cmd.reference, error = %e, "Charge creation failed");
                PaymentError::from(e.non_retryable())
            })?;

        info!(
            reference = %cmd.reference,
            transaction_id = %transaction.id,
            method = method.as_str(),
            status = %transaction.status,
            "Gateway transaction created"
        );
        Ok(transaction)
    }
}
