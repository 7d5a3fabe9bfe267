//! PostgreSQL implementation of WebhookEventRepository.
//!
//! Admission is `INSERT ... ON CONFLICT DO NOTHING` against the primary key
//! of `webhook_admissions`; the insert either lands (first seen) or affects
//! zero rows (already seen). That makes the database the single source of
//! truth for dedup state, surviving process restarts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{Admission, DeliveryOutcome, WebhookDeliveryRecord, WebhookEventRepository};

/// Webhook event store backed by `webhook_admissions` and
/// `webhook_deliveries`.
pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a delivery record.
#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    event_id: Option<String>,
    event_type: Option<String>,
    received_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    outcome: String,
}

impl TryFrom<DeliveryRow> for WebhookDeliveryRecord {
    type Error = DomainError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        let outcome = DeliveryOutcome::parse(&row.outcome).ok_or_else(|| {
            DomainError::database(format!("unknown delivery outcome '{}'", row.outcome))
        })?;

        Ok(WebhookDeliveryRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            received_at: Timestamp::from_datetime(row.received_at),
            processed_at: row.processed_at.map(Timestamp::from_datetime),
            outcome,
        })
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn admit(&self, event_id: &str) -> Result<Admission, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_admissions (event_id, admitted_at)
            VALUES ($1, $2)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to admit event: {}", e)))?;

        if result.rows_affected() == 1 {
            Ok(Admission::FirstSeen)
        } else {
            Ok(Admission::AlreadySeen)
        }
    }

    async fn release(&self, event_id: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM webhook_admissions WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to release admission: {}", e)))?;
        Ok(())
    }

    async fn record_delivery(&self, record: WebhookDeliveryRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_deliveries (
                event_id, event_type, received_at, processed_at, outcome
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(record.received_at.as_datetime())
        .bind(record.processed_at.map(|t| *t.as_datetime()))
        .bind(record.outcome.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to journal delivery: {}", e)))?;
        Ok(())
    }

    async fn deliveries_for(
        &self,
        event_id: &str,
    ) -> Result<Vec<WebhookDeliveryRecord>, DomainError> {
        let rows: Vec<DeliveryRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, received_at, processed_at, outcome
            FROM webhook_deliveries
            WHERE event_id = $1
            ORDER BY id
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load deliveries: {}", e)))?;

        rows.into_iter().map(WebhookDeliveryRecord::try_from).collect()
    }
}
