//! Read-only gateway queries exposed to the storefront.

use std::sync::Arc;

use crate::domain::payment::{GatewayTransaction, PaymentError};
use crate::ports::{CardDetails, CardToken, FinancialInstitution, PaymentGateway};

/// Pass-through queries: transaction status, PSE banks, card tokenization.
pub struct GatewayQueryHandler {
    gateway: Arc<dyn PaymentGateway>,
}

impl GatewayQueryHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// The gateway's authoritative view of a transaction.
    pub async fn transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, PaymentError> {
        if transaction_id.trim().is_empty() {
            return Err(PaymentError::Validation("transaction id is required".to_string()));
        }
        Ok(self.gateway.get_transaction(transaction_id).await?)
    }

    pub async fn pse_banks(&self) -> Result<Vec<FinancialInstitution>, PaymentError> {
        Ok(self.gateway.list_pse_banks().await?)
    }

    pub async fn tokenize_card(&self, card: CardDetails) -> Result<CardToken, PaymentError> {
        if card.number.len() < 12 || !card.number.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::Validation("card number is malformed".to_string()));
        }
        Ok(self.gateway.tokenize_card(card).await?)
    }
}
