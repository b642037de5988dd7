//! In-memory inventory ledger.

use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ProductId, VariantId};
use crate::domain::order::OrderLine;
use crate::ports::{InventoryLedger, StoreError};

/// Stock on hand and units sold for one product or variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockLevel {
    pub stock: i64,
    pub sold: i64,
}

#[derive(Debug, Default)]
struct Ledger {
    products: HashMap<ProductId, StockLevel>,
    variants: HashMap<VariantId, StockLevel>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryLedger {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_product_stock(&self, id: ProductId, stock: i64) {
        self.ledger.write().await.products.insert(id, StockLevel { stock, sold: 0 });
    }

    pub async fn set_variant_stock(&self, id: VariantId, stock: i64) {
        self.ledger.write().await.variants.insert(id, StockLevel { stock, sold: 0 });
    }

    pub async fn product(&self, id: ProductId) -> StockLevel {
        self.ledger.read().await.products.get(&id).copied().unwrap_or_default()
    }

    pub async fn variant(&self, id: VariantId) -> StockLevel {
        self.ledger.read().await.variants.get(&id).copied().unwrap_or_default()
    }
}

fn take<K: Eq + Hash>(levels: &mut HashMap<K, StockLevel>, key: K, quantity: i64) {
    let level = levels.entry(key).or_default();
    level.stock -= quantity;
    level.sold += quantity;
}

fn give_back<K: Eq + Hash>(levels: &mut HashMap<K, StockLevel>, key: K, quantity: i64) {
    let level = levels.entry(key).or_default();
    level.stock += quantity;
    level.sold = (level.sold - quantity).max(0);
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn decrement(&self, lines: &[OrderLine]) -> Result<(), StoreError> {
        let mut ledger = self.ledger.write().await;
        for line in lines {
            let quantity = i64::from(line.quantity);
            take(&mut ledger.products, line.product_id, quantity);
            if let Some(variant) = line.variant_id {
                take(&mut ledger.variants, variant, quantity);
            }
        }
        Ok(())
    }

    async fn restore(&self, lines: &[OrderLine]) -> Result<(), StoreError> {
        let mut ledger = self.ledger.write().await;
        for line in lines {
            let quantity = i64::from(line.quantity);
            give_back(&mut ledger.products, line.product_id, quantity);
            if let Some(variant) = line.variant_id {
                give_back(&mut ledger.variants, variant, quantity);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::MinorUnits;

    fn line(product: ProductId, variant: Option<VariantId>, quantity: u32) -> OrderLine {
        OrderLine {
            product_id: product,
            variant_id: variant,
            title: "Mug".to_string(),
            quantity,
            unit_price: MinorUnits::new(20_000),
        }
    }

    #[tokio::test]
    async fn decrement_moves_product_and_variant() {
        let ledger = InMemoryInventoryLedger::new();
        let product = ProductId::new();
        let variant = VariantId::new();
        ledger.set_product_stock(product, 10).await;
        ledger.set_variant_stock(variant, 4).await;

        ledger.decrement(&[line(product, Some(variant), 3)]).await.unwrap();

        assert_eq!(ledger.product(product).await, StockLevel { stock: 7, sold: 3 });
        assert_eq!(ledger.variant(variant).await, StockLevel { stock: 1, sold: 3 });
    }

    #[tokio::test]
    async fn restore_reverses_decrement() {
        let ledger = InMemoryInventoryLedger::new();
        let product = ProductId::new();
        ledger.set_product_stock(product, 10).await;
        let lines = [line(product, None, 2)];

        ledger.decrement(&lines).await.unwrap();
        ledger.restore(&lines).await.unwrap();

        assert_eq!(ledger.product(product).await, StockLevel { stock: 10, sold: 0 });
    }

    #[tokio::test]
    async fn sold_count_floors_at_zero() {
        let ledger = InMemoryInventoryLedger::new();
        let product = ProductId::new();
        ledger.set_product_stock(product, 5).await;

        ledger.restore(&[line(product, None, 3)]).await.unwrap();

        assert_eq!(ledger.product(product).await, StockLevel { stock: 8, sold: 0 });
    }
}
