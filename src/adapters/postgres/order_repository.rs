//! PostgreSQL implementation of OrderRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, OrderId, Timestamp};
use crate::domain::orders::{LineItem, NewAuditEntry, Order, OrderStatus};
use crate::ports::{CommitOutcome, OrderRepository};

/// Order store backed by the `orders` table.
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    status: String,
    provider_reference: Option<String>,
    amount_minor: i64,
    currency: String,
    items: serde_json::Value,
    checkout_attempts: i32,
    last_payment_failure_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            DomainError::database(format!("unknown order status '{}'", row.status))
        })?;
        let items: Vec<LineItem> = serde_json::from_value(row.items)
            .map_err(|e| DomainError::database(format!("corrupt line items: {}", e)))?;
        let checkout_attempts = u32::try_from(row.checkout_attempts)
            .map_err(|_| DomainError::database("negative checkout_attempts"))?;

        Ok(Order {
            id: OrderId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            status,
            provider_reference: row.provider_reference,
            amount_minor: row.amount_minor,
            currency: row.currency,
            items,
            checkout_attempts,
            last_payment_failure_at: row.last_payment_failure_at.map(Timestamp::from_datetime),
            version: row.version,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, customer_id, status, provider_reference, amount_minor, currency,
           items, checkout_attempts, last_payment_failure_at, version,
           created_at, updated_at
    FROM orders
"#;

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let items = serde_json::to_value(&order.items)
            .map_err(|e| DomainError::database(format!("failed to serialize items: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_id, status, provider_reference, amount_minor, currency,
                items, checkout_attempts, last_payment_failure_at, version,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.provider_reference)
        .bind(order.amount_minor)
        .bind(&order.currency)
        .bind(items)
        .bind(order.checkout_attempts as i32)
        .bind(order.last_payment_failure_at.map(|t| *t.as_datetime()))
        .bind(order.version)
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return DomainError::new(
                        ErrorCode::ValidationFailed,
                        format!("Order {} already exists", order.id),
                    );
                }
            }
            DomainError::database(format!("Failed to insert order: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_ORDER))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to load order: {}", e)))?;

        row.map(Order::try_from).transpose()
    }

    async fn find_by_provider_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{} WHERE provider_reference = $1", SELECT_ORDER))
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to load order: {}", e)))?;

        row.map(Order::try_from).transpose()
    }

    async fn commit_transition(
        &self,
        order: &Order,
        expected_version: i64,
        entry: NewAuditEntry,
    ) -> Result<CommitOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to open transaction: {}", e)))?;

        // The version predicate makes this the serialization point for
        // concurrent mutations of the same order.
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                provider_reference = $3,
                checkout_attempts = $4,
                last_payment_failure_at = $5,
                version = $6,
                updated_at = $7
            WHERE id = $1 AND version = $8
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.provider_reference)
        .bind(order.checkout_attempts as i32)
        .bind(order.last_payment_failure_at.map(|t| *t.as_datetime()))
        .bind(order.version)
        .bind(order.updated_at.as_datetime())
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update order: {}", e)))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DomainError::database(format!("Failed to roll back: {}", e)))?;
            return Ok(CommitOutcome::VersionConflict);
        }

        // Audit entry in the same transaction: both commit or neither does.
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                order_id, from_state, to_state, triggering_event_id, actor,
                outcome, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.order_id.map(|id| *id.as_uuid()))
        .bind(entry.from_state.map(|s| s.as_str()))
        .bind(entry.to_state.map(|s| s.as_str()))
        .bind(&entry.triggering_event_id)
        .bind(entry.actor.as_str())
        .bind(entry.outcome.as_str())
        .bind(Timestamp::now().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append audit entry: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transition: {}", e)))?;

        Ok(CommitOutcome::Committed)
    }
}
