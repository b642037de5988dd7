//! PostgreSQL implementation of OrderRepository.
//!
//! Line items and the shipping address are stored as JSONB on the order row.
//! `transition_payment` is a single conditional `UPDATE` that locks the row,
//! re-checks the payment status and reports the status it replaced.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::order::{Order, OrderLine, PaymentStatus, PaymentTransition, ShippingAddress};
use crate::domain::payment::{Currency, MinorUnits, PaymentReference};
use crate::ports::{OrderRepository, StoreError};

use super::{corrupt, db_error};

const ORDER_COLUMNS: &str = r#"
    id, order_number, customer_email, currency, total, status, payment_status,
    provider_transaction_id, items, shipping_address, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {} FROM orders WHERE {} = $1", ORDER_COLUMNS, column);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("fetch order", e))?;

        row.map(row_to_order).transpose()
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let items = serde_json::to_value(&order.items).map_err(|e| corrupt("order items", e))?;
        let shipping = order
            .shipping_address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| corrupt("shipping address", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_email, currency, total, status, payment_status,
                provider_transaction_id, items, shipping_address, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.order_number.as_str())
        .bind(&order.customer_email)
        .bind(order.currency.as_str())
        .bind(order.total.value())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.provider_transaction_id.as_deref())
        .bind(items)
        .bind(shipping)
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert order", e))?;

        Ok(())
    }

    async fn find_by_order_number(
        &self,
        order_number: &PaymentReference,
    ) -> Result<Option<Order>, StoreError> {
        self.find_one("order_number", order_number.as_str()).await
    }

    async fn find_by_provider_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Order>, StoreError> {
        self.find_one("provider_transaction_id", transaction_id).await
    }

    async fn transition_payment(
        &self,
        order_id: OrderId,
        transition: &PaymentTransition,
        now: Timestamp,
    ) -> Result<Option<PaymentStatus>, StoreError> {
        let allowed: Vec<String> = transition
            .allowed_from
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        // The sub-select takes the row lock; a concurrent delivery waits here
        // and then sees the committed status, which fails the ANY() guard.
        let row = sqlx::query(
            r#"
            UPDATE orders o SET
                payment_status = $2,
                status = COALESCE($3, o.status),
                provider_transaction_id = $4,
                updated_at = $5
            FROM (SELECT id, payment_status FROM orders WHERE id = $1 FOR UPDATE) prev
            WHERE o.id = prev.id
              AND o.payment_status = ANY($6)
            RETURNING prev.payment_status AS previous
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(transition.target_payment.as_str())
        .bind(transition.target_order.map(|s| s.as_str()))
        .bind(&transition.provider_transaction_id)
        .bind(now.as_datetime())
        .bind(&allowed)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("transition order payment", e))?;

        match row {
            Some(row) => {
                let previous: String = row.try_get("previous").map_err(|e| corrupt("previous", e))?;
                let previous = previous
                    .parse::<PaymentStatus>()
                    .map_err(|e| corrupt("payment_status", e))?;
                Ok(Some(previous))
            }
            None => Ok(None),
        }
    }
}

fn row_to_order(row: PgRow) -> Result<Order, StoreError> {
    let get_str = |column: &str| -> Result<String, StoreError> {
        row.try_get::<String, _>(column).map_err(|e| corrupt(column, e))
    };

    let order_number =
        PaymentReference::parse(&get_str("order_number")?).map_err(|e| corrupt("order_number", e))?;
    let currency = Currency::parse(&get_str("currency")?).map_err(|e| corrupt("currency", e))?;
    let status = get_str("status")?.parse().map_err(|e| corrupt("status", e))?;
    let payment_status = get_str("payment_status")?
        .parse()
        .map_err(|e| corrupt("payment_status", e))?;

    let items: serde_json::Value = row.try_get("items").map_err(|e| corrupt("items", e))?;
    let items: Vec<OrderLine> = serde_json::from_value(items).map_err(|e| corrupt("items", e))?;
    let shipping: Option<serde_json::Value> = row
        .try_get("shipping_address")
        .map_err(|e| corrupt("shipping_address", e))?;
    let shipping_address: Option<ShippingAddress> = shipping
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| corrupt("shipping_address", e))?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id").map_err(|e| corrupt("id", e))?),
        order_number,
        customer_email: get_str("customer_email")?,
        currency,
        total: MinorUnits::new(row.try_get("total").map_err(|e| corrupt("total", e))?),
        status,
        payment_status,
        provider_transaction_id: row
            .try_get("provider_transaction_id")
            .map_err(|e| corrupt("provider_transaction_id", e))?,
        items,
        shipping_address,
        created_at: Timestamp::from_datetime(
            row.try_get("created_at").map_err(|e| corrupt("created_at", e))?,
        ),
        updated_at: Timestamp::from_datetime(
            row.try_get("updated_at").map_err(|e| corrupt("updated_at", e))?,
        ),
    })
}
