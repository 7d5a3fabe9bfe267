//! PostgreSQL adapters.
//!
//! The store provides the two primitives the core depends on: atomic
//! conditional writes (`UPDATE ... WHERE version = $n` inside a transaction
//! with the audit insert) and a uniqueness constraint on webhook event ids.

mod audit_log;
mod order_repository;
mod webhook_event_repository;

pub use audit_log::PostgresAuditLog;
pub use order_repository::PostgresOrderRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Creates a PostgreSQL connection pool from configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(config.url.expose_secret())
        .await
}

/// Runs the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
