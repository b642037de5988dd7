//! Order aggregate.

use serde::{Deserialize, Serialize};

use super::{OrderStatus, PaymentStatus, PaymentTransition};
use crate::domain::foundation::{OrderId, ProductId, StateMachine, Timestamp, ValidationError, VariantId};
use crate::domain::payment::{Currency, MinorUnits, PaymentReference};

/// A purchased line, priced in minor units at the time of preparation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub title: String,
    pub quantity: u32,
    pub unit_price: MinorUnits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Durable order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Equal to the payment reference.
    pub order_number: PaymentReference,

    pub customer_email: String,

    pub currency: Currency,

    /// Charge amount in minor units.
    pub total: MinorUnits,

    pub status: OrderStatus,

    pub payment_status: PaymentStatus,

    /// Gateway transaction id of the last transition that applied.
    pub provider_transaction_id: Option<String>,

    pub items: Vec<OrderLine>,

    pub shipping_address: Option<ShippingAddress>,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

impl Order {
    /// Creates an order in `pending/pending`, ready to be reconciled.
    pub fn new_pending(
        order_number: PaymentReference,
        customer_email: impl Into<String>,
        currency: Currency,
        total: MinorUnits,
        items: Vec<OrderLine>,
        shipping_address: Option<ShippingAddress>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: OrderId::new(),
            order_number,
            customer_email: customer_email.into(),
            currency,
            total,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            provider_transaction_id: None,
            items,
            shipping_address,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies `transition` if the current payment status allows it.
    ///
    /// Returns the previous payment status when applied, `None` when the
    /// guard rejected it (duplicate or out-of-order delivery).
    pub fn apply(
        &mut self,
        transition: &PaymentTransition,
        now: Timestamp,
    ) -> Result<Option<PaymentStatus>, ValidationError> {
        if !transition.applies_from(self.payment_status) {
            return Ok(None);
        }

        let previous = self.payment_status;
        let payment_status = previous.transition_to(transition.target_payment)?;
        let status = match transition.target_order {
            Some(target) if target != self.status => self.status.transition_to(target)?,
            _ => self.status,
        };

        self.payment_status = payment_status;
        self.status = status;
        self.provider_transaction_id = Some(transition.provider_transaction_id.clone());
        self.updated_at = now;
        Ok(Some(previous))
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}
