//! In-memory order repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::order::{Order, PaymentStatus, PaymentTransition};
use crate::domain::payment::PaymentReference;
use crate::ports::{OrderRepository, StoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        if orders.values().any(|o| o.order_number == order.order_number) {
            return Err(StoreError::Duplicate(order.order_number.to_string()));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_by_order_number(
        &self,
        order_number: &PaymentReference,
    ) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.values().find(|o| &o.order_number == order_number).cloned())
    }

    async fn find_by_provider_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|o| o.provider_transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn transition_payment(
        &self,
        order_id: OrderId,
        transition: &PaymentTransition,
        now: Timestamp,
    ) -> Result<Option<PaymentStatus>, StoreError> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(&order_id) else {
            return Ok(None);
        };
        order
            .apply(transition, now)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}
