//! In-memory order repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::orders::{NewAuditEntry, Order};
use crate::ports::{AuditLog, CommitOutcome, OrderRepository};

use super::MemoryAuditLog;

/// Order store backed by a guarded map.
///
/// Shares the audit ledger so `commit_transition` can write both sides under
/// the map's write lock, mirroring the transactional coupling of the
/// Postgres adapter.
pub struct MemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
    audit: Arc<MemoryAuditLog>,
}

impl MemoryOrderRepository {
    pub fn new(audit: Arc<MemoryAuditLog>) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            audit,
        }
    }

    /// Every stored order, for assertions in tests.
    pub async fn all(&self) -> Vec<Order> {
        self.orders.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Order {} already exists", order.id),
            ));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_by_provider_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.provider_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn commit_transition(
        &self,
        order: &Order,
        expected_version: i64,
        entry: NewAuditEntry,
    ) -> Result<CommitOutcome, DomainError> {
        // The write lock is held across the audit append so no other commit
        // can interleave between the two writes.
        let mut orders = self.orders.write().await;

        let stored = orders.get(&order.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", order.id),
            )
        })?;

        if stored.version != expected_version {
            return Ok(CommitOutcome::VersionConflict);
        }

        orders.insert(order.id, order.clone());
        self.audit.append(entry).await?;
        Ok(CommitOutcome::Committed)
    }
}
