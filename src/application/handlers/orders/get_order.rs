//! GetOrderHandler - Read-side order lookup.

use std::sync::Arc;

use crate::domain::foundation::OrderId;
use crate::domain::orders::{Order, OrderError};
use crate::ports::OrderRepository;

/// Query for one order.
#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub order_id: OrderId,
}

/// Handler returning an order by id.
pub struct GetOrderHandler {
    orders: Arc<dyn OrderRepository>,
}

impl GetOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, query: GetOrderQuery) -> Result<Order, OrderError> {
        self.orders
            .find_by_id(&query.order_id)
            .await?
            .ok_or(OrderError::NotFound(query.order_id))
    }
}
