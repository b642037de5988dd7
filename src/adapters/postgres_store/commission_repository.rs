//! PostgreSQL implementation of CommissionRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{CommissionId, CommissionRate, OrderId, TeamMemberId, Timestamp};
use crate::domain::order::{Commission, CommissionStatus, CommissionedStaff};
use crate::domain::payment::MinorUnits;
use crate::ports::{CommissionRepository, StoreError};

use super::{corrupt, db_error};

#[derive(Clone)]
pub struct PostgresCommissionRepository {
    pool: PgPool,
}

impl PostgresCommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn rate_from_db(bp: i32) -> Result<CommissionRate, StoreError> {
    let bp = u16::try_from(bp).map_err(|e| corrupt("commission_rate_bp", e))?;
    CommissionRate::from_basis_points(bp).map_err(|e| corrupt("commission_rate_bp", e))
}

#[async_trait]
impl CommissionRepository for PostgresCommissionRepository {
    async fn list_commissioned_staff(&self) -> Result<Vec<CommissionedStaff>, StoreError> {
        let rows: Vec<(uuid::Uuid, i32)> = sqlx::query_as(
            r#"
            SELECT id, commission_rate_bp
            FROM team_members
            WHERE active AND commission_rate_bp > 0
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list commissioned staff", e))?;

        rows.into_iter()
            .map(|(id, bp)| {
                Ok(CommissionedStaff {
                    team_member_id: TeamMemberId::from_uuid(id),
                    rate: rate_from_db(bp)?,
                })
            })
            .collect()
    }

    async fn insert_if_absent(&self, commission: &Commission) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO commissions (
                id, team_member_id, order_id, order_total, rate_bp, amount, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_id, team_member_id) DO NOTHING
            "#,
        )
        .bind(commission.id.as_uuid())
        .bind(commission.team_member_id.as_uuid())
        .bind(commission.order_id.as_uuid())
        .bind(commission.order_total.value())
        .bind(i32::from(commission.rate.basis_points()))
        .bind(commission.amount.value())
        .bind(commission.status.as_str())
        .bind(commission.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert commission", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn cancel_for_order(
        &self,
        order_id: OrderId,
        from: &[CommissionStatus],
    ) -> Result<u64, StoreError> {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let result = sqlx::query(
            r#"
            UPDATE commissions SET status = 'cancelled'
            WHERE order_id = $1 AND status = ANY($2)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(&from)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("cancel commissions", e))?;

        Ok(result.rows_affected())
    }

    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Commission>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, team_member_id, order_id, order_total, rate_bp, amount, status, created_at
            FROM commissions
            WHERE order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list commissions", e))?;

        rows.into_iter().map(row_to_commission).collect()
    }
}

fn row_to_commission(row: PgRow) -> Result<Commission, StoreError> {
    let status: String = row.try_get("status").map_err(|e| corrupt("status", e))?;
    Ok(Commission {
        id: CommissionId::from_uuid(row.try_get("id").map_err(|e| corrupt("id", e))?),
        team_member_id: TeamMemberId::from_uuid(
            row.try_get("team_member_id").map_err(|e| corrupt("team_member_id", e))?,
        ),
        order_id: OrderId::from_uuid(row.try_get("order_id").map_err(|e| corrupt("order_id", e))?),
        order_total: MinorUnits::new(
            row.try_get("order_total").map_err(|e| corrupt("order_total", e))?,
        ),
        rate: rate_from_db(row.try_get("rate_bp").map_err(|e| corrupt("rate_bp", e))?)?,
        amount: MinorUnits::new(row.try_get("amount").map_err(|e| corrupt("amount", e))?),
        status: status.parse().map_err(|e| corrupt("status", e))?,
        created_at: Timestamp::from_datetime(
            row.try_get("created_at").map_err(|e| corrupt("created_at", e))?,
        ),
    })
}
