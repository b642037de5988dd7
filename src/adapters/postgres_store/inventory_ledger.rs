//! PostgreSQL implementation of InventoryLedger.
//!
//! All lines of one movement run in a single transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::order::OrderLine;
use crate::ports::{InventoryLedger, StoreError};

use super::db_error;

#[derive(Clone)]
pub struct PostgresInventoryLedger {
    pool: PgPool,
}

#[derive(Clone, Copy)]
enum Movement {
    Sell,
    Restock,
}

impl PostgresInventoryLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn apply(&self, lines: &[OrderLine], movement: Movement) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin inventory transaction", e))?;

        for line in lines {
            let quantity = i64::from(line.quantity);
            move_stock(&mut tx, "products", line.product_id.as_uuid(), quantity, movement).await?;
            if let Some(variant_id) = line.variant_id {
                move_stock(&mut tx, "product_variants", variant_id.as_uuid(), quantity, movement)
                    .await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| db_error("commit inventory transaction", e))
    }
}

async fn move_stock(
    tx: &mut Transaction<'_, Postgres>,
    table: &'static str,
    id: &uuid::Uuid,
    quantity: i64,
    movement: Movement,
) -> Result<(), StoreError> {
    let sql = match movement {
        Movement::Sell => format!(
            "UPDATE {} SET stock = stock - $2, sold = sold + $2 WHERE id = $1",
            table
        ),
        Movement::Restock => format!(
            "UPDATE {} SET stock = stock + $2, sold = GREATEST(sold - $2, 0) WHERE id = $1",
            table
        ),
    };
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(quantity)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("move stock", e))?;

    if result.rows_affected() == 0 {
        tracing::warn!(table, id = %id, "Stock row missing; movement skipped");
    }
    Ok(())
}

#[async_trait]
impl InventoryLedger for PostgresInventoryLedger {
    async fn decrement(&self, lines: &[OrderLine]) -> Result<(), StoreError> {
        self.apply(lines, Movement::Sell).await
    }

    async fn restore(&self, lines: &[OrderLine]) -> Result<(), StoreError> {
        self.apply(lines, Movement::Restock).await
    }
}
