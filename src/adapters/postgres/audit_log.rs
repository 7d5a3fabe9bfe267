//! PostgreSQL implementation of AuditLog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, OrderId, Timestamp};
use crate::domain::orders::{AuditEntry, AuditOutcome, NewAuditEntry, OrderStatus, TransitionActor};
use crate::ports::AuditLog;

/// Audit ledger backed by the append-only `audit_log` table.
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an audit entry.
#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    seq: i64,
    order_id: Option<Uuid>,
    from_state: Option<String>,
    to_state: Option<String>,
    triggering_event_id: Option<String>,
    actor: String,
    outcome: String,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = DomainError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let parse_status = |s: &str| {
            OrderStatus::parse(s)
                .ok_or_else(|| DomainError::database(format!("unknown order status '{}'", s)))
        };

        Ok(AuditEntry {
            seq: row.seq,
            order_id: row.order_id.map(OrderId::from_uuid),
            from_state: row.from_state.as_deref().map(parse_status).transpose()?,
            to_state: row.to_state.as_deref().map(parse_status).transpose()?,
            triggering_event_id: row.triggering_event_id,
            actor: TransitionActor::parse(&row.actor).ok_or_else(|| {
                DomainError::database(format!("unknown actor '{}'", row.actor))
            })?,
            outcome: AuditOutcome::parse(&row.outcome).ok_or_else(|| {
                DomainError::database(format!("unknown audit outcome '{}'", row.outcome))
            })?,
            recorded_at: Timestamp::from_datetime(row.recorded_at),
        })
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DomainError> {
        let recorded_at = Timestamp::now();

        let row: AuditRow = sqlx::query_as(
            r#"
            INSERT INTO audit_log (
                order_id, from_state, to_state, triggering_event_id, actor,
                outcome, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING seq, order_id, from_state, to_state, triggering_event_id,
                      actor, outcome, recorded_at
            "#,
        )
        .bind(entry.order_id.map(|id| *id.as_uuid()))
        .bind(entry.from_state.map(|s| s.as_str()))
        .bind(entry.to_state.map(|s| s.as_str()))
        .bind(&entry.triggering_event_id)
        .bind(entry.actor.as_str())
        .bind(entry.outcome.as_str())
        .bind(recorded_at.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append audit entry: {}", e)))?;

        AuditEntry::try_from(row)
    }

    async fn history(&self, order_id: &OrderId) -> Result<Vec<AuditEntry>, DomainError> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT seq, order_id, from_state, to_state, triggering_event_id,
                   actor, outcome, recorded_at
            FROM audit_log
            WHERE order_id = $1
            ORDER BY recorded_at, seq
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load history: {}", e)))?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}
