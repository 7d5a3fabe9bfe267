//! GetOrderHistoryHandler - Read-side audit history.
//!
//! Used for reconciliation, dispute resolution, and replay-based state
//! reconstruction.

use std::sync::Arc;

use crate::domain::foundation::OrderId;
use crate::domain::orders::{AuditEntry, OrderError};
use crate::ports::AuditLog;

/// Query for the audit history of one order.
#[derive(Debug, Clone)]
pub struct GetOrderHistoryQuery {
    pub order_id: OrderId,
}

/// Handler returning an order's audit history, oldest first.
pub struct GetOrderHistoryHandler {
    audit: Arc<dyn AuditLog>,
}

impl GetOrderHistoryHandler {
    pub fn new(audit: Arc<dyn AuditLog>) -> Self {
        Self { audit }
    }

    pub async fn handle(&self, query: GetOrderHistoryQuery) -> Result<Vec<AuditEntry>, OrderError> {
        Ok(self.audit.history(&query.order_id).await?)
    }
}
