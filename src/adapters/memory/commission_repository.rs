//! In-memory commission repository.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::OrderId;
use crate::domain::order::{Commission, CommissionStatus, CommissionedStaff};
use crate::ports::{CommissionRepository, StoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCommissionRepository {
    staff: Arc<RwLock<Vec<CommissionedStaff>>>,
    commissions: Arc<RwLock<Vec<Commission>>>,
}

impl InMemoryCommissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_staff(staff: Vec<CommissionedStaff>) -> Self {
        Self {
            staff: Arc::new(RwLock::new(staff)),
            commissions: Arc::default(),
        }
    }

    pub async fn all(&self) -> Vec<Commission> {
        self.commissions.read().await.clone()
    }
}

#[async_trait]
impl CommissionRepository for InMemoryCommissionRepository {
    async fn list_commissioned_staff(&self) -> Result<Vec<CommissionedStaff>, StoreError> {
        let staff = self.staff.read().await;
        Ok(staff.iter().filter(|s| s.rate.is_positive()).copied().collect())
    }

    async fn insert_if_absent(&self, commission: &Commission) -> Result<bool, StoreError> {
        let mut commissions = self.commissions.write().await;
        let exists = commissions.iter().any(|c| {
            c.order_id == commission.order_id && c.team_member_id == commission.team_member_id
        });
        if exists {
            return Ok(false);
        }
        commissions.push(commission.clone());
        Ok(true)
    }

    async fn cancel_for_order(
        &self,
        order_id: OrderId,
        from: &[CommissionStatus],
    ) -> Result<u64, StoreError> {
        let mut commissions = self.commissions.write().await;
        let cancelled = commissions
            .iter_mut()
            .filter(|c| c.order_id == order_id)
            .map(|c| c.cancel_if(from))
            .filter(|changed| *changed)
            .count();
        Ok(cancelled as u64)
    }

    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Commission>, StoreError> {
        let commissions = self.commissions.read().await;
        Ok(commissions.iter().filter(|c| c.order_id == order_id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CommissionId, CommissionRate, TeamMemberId, Timestamp};
    use crate::domain::payment::MinorUnits;

    fn commission(order_id: OrderId, member: TeamMemberId, status: CommissionStatus) -> Commission {
        Commission {
            id: CommissionId::new(),
            team_member_id: member,
            order_id,
            order_total: MinorUnits::new(100_000),
            rate: CommissionRate::from_basis_points(500).unwrap(),
            amount: MinorUnits::new(5_000),
            status,
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn lists_only_positive_rates() {
        let paid = CommissionedStaff {
            team_member_id: TeamMemberId::new(),
            rate: CommissionRate::from_basis_points(1_000).unwrap(),
        };
        let unpaid = CommissionedStaff {
            team_member_id: TeamMemberId::new(),
            rate: CommissionRate::ZERO,
        };
        let repo = InMemoryCommissionRepository::with_staff(vec![paid, unpaid]);

        assert_eq!(repo.list_commissioned_staff().await.unwrap(), vec![paid]);
    }

    #[tokio::test]
    async fn insert_is_unique_per_order_and_member() {
        let repo = InMemoryCommissionRepository::new();
        let order = OrderId::new();
        let member = TeamMemberId::new();

        assert!(repo.insert_if_absent(&commission(order, member, CommissionStatus::Pending)).await.unwrap());
        assert!(!repo.insert_if_absent(&commission(order, member, CommissionStatus::Pending)).await.unwrap());
        assert_eq!(repo.list_for_order(order).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_only_touches_listed_statuses() {
        let repo = InMemoryCommissionRepository::new();
        let order = OrderId::new();
        repo.insert_if_absent(&commission(order, TeamMemberId::new(), CommissionStatus::Pending)).await.unwrap();
        repo.insert_if_absent(&commission(order, TeamMemberId::new(), CommissionStatus::Approved)).await.unwrap();

        let cancelled = repo.cancel_for_order(order, &[CommissionStatus::Pending]).await.unwrap();

        assert_eq!(cancelled, 1);
        let statuses: Vec<_> = repo.list_for_order(order).await.unwrap().iter().map(|c| c.status).collect();
        assert!(statuses.contains(&CommissionStatus::Cancelled));
        assert!(statuses.contains(&CommissionStatus::Approved));
        assert_eq!(statuses.len(), 2);
    }
}
