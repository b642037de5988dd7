//! PrepareTransactionHandler - turns a cart into a signed payment intent.
//!
//! Order of operations matters: the order row is written before the gateway
//! is contacted, so a webhook that beats the HTTP response still finds it.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::foundation::Timestamp;
use crate::domain::order::{Order, OrderLine, ShippingAddress};
use crate::domain::payment::signature::integrity_signature;
use crate::domain::payment::{
    amount_from_lines, CartLine, Currency, MinorUnits, PaymentError, PaymentMethod,
    PaymentReference, PreparedIntent,
};
use crate::ports::{Clock, IntentStore, OrderRepository, PaymentGateway};

/// Checkout settings the handler needs. Built from `PaymentConfig` at startup.
#[derive(Debug, Clone)]
pub struct PrepareSettings {
    pub public_key: String,
    pub integrity_secret: SecretString,
    pub currency: Currency,
    pub redirect_url: String,
    /// Reference prefix owned by this deployment.
    pub tenant_prefix: String,
    pub intent_ttl_secs: i64,
}

/// Command to prepare a payment.
#[derive(Debug, Clone)]
pub struct PrepareTransactionCommand {
    pub lines: Vec<CartLine>,
    pub customer_email: String,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
}

/// What the checkout widget receives. Never contains a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    pub public_key: String,
    pub signature: String,
    pub reference: PaymentReference,
    pub amount_in_cents: i64,
    pub currency: Currency,
    pub acceptance_token: String,
    pub acceptance_permalink: String,
    pub redirect_url: String,
    pub expires_at: Timestamp,
    pub payment_method: Option<PaymentMethod>,
}

pub struct PrepareTransactionHandler {
    orders: Arc<dyn OrderRepository>,
    intents: Arc<dyn IntentStore>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    settings: PrepareSettings,
}

impl PrepareTransactionHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        intents: Arc<dyn IntentStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        settings: PrepareSettings,
    ) -> Self {
        Self {
            orders,
            intents,
            gateway,
            clock,
            settings,
        }
    }

    pub async fn handle(&self, cmd: PrepareTransactionCommand) -> Result<PaymentIntent, PaymentError> {
        validate_customer(&cmd)?;

        // 1. Canonical amount, line by line
        let amount = amount_from_lines(&cmd.lines)?;
        let now = self.clock.now();

        // 2. Fresh reference
        let reference = PaymentReference::generate(&self.settings.tenant_prefix, now)?;

        // 3. Order row before any gateway call
        let order = Order::new_pending(
            reference.clone(),
            cmd.customer_email.trim(),
            self.settings.currency.clone(),
            amount,
            cmd.lines.iter().map(order_line).collect(),
            cmd.shipping_address,
            now,
        );
        self.orders.insert(&order).await?;

        // 4. Consent token; no token, no payment
        let acceptance = self.gateway.acceptance_token().await.map_err(|e| {
            warn!(reference = %reference, error = %e, "Acceptance token unavailable");
            PaymentError::from(e)
        })?;

        // 5. Integrity signature
        let signature = integrity_signature(
            reference.as_str(),
            amount,
            &self.settings.currency,
            self.settings.integrity_secret.expose_secret(),
        );

        // 6. Intent for the confirmation cross-check
        let intent = PreparedIntent::new(
            reference.clone(),
            amount,
            self.settings.currency.clone(),
            cmd.customer_email.trim(),
            now,
            self.settings.intent_ttl_secs,
        );
        let expires_at = intent.expires_at();
        self.intents.insert(intent).await?;

        info!(
            reference = %reference,
            order_id = %order.id,
            amount_in_cents = amount.value(),
            "Payment intent prepared"
        );

        Ok(PaymentIntent {
            public_key: self.settings.public_key.clone(),
            signature,
            reference,
            amount_in_cents: amount.value(),
            currency: self.settings.currency.clone(),
            acceptance_token: acceptance.token,
            acceptance_permalink: acceptance.permalink,
            redirect_url: self.settings.redirect_url.clone(),
            expires_at,
            payment_method: cmd.payment_method,
        })
    }
}

fn validate_customer(cmd: &PrepareTransactionCommand) -> Result<(), PaymentError> {
    if cmd.lines.is_empty() {
        return Err(PaymentError::Validation("cart is empty".to_string()));
    }
    let email = cmd.customer_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(PaymentError::Validation(
            "a valid customer email is required".to_string(),
        ));
    }
    Ok(())
}

fn order_line(line: &CartLine) -> OrderLine {
    OrderLine {
        product_id: line.product_id,
        variant_id: line.variant_id,
        title: line.title.clone(),
        quantity: line.quantity,
        unit_price: MinorUnits::new((line.unit_price * 100.0).round() as i64),
    }
}
