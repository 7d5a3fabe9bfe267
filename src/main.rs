//! Orderflow server binary.
//!
//! Wires the Postgres adapters, the payment provider client, and the
//! notification dispatcher into the axum application and serves it with
//! graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use orderflow::adapters::http::orders::{api_router, OrdersAppState};
use orderflow::adapters::notifications::{
    HttpNotificationDispatcher, NoopDispatcher, NotificationsGatewayConfig,
};
use orderflow::adapters::postgres::{
    create_pool, run_migrations, PostgresAuditLog, PostgresOrderRepository,
    PostgresWebhookEventRepository,
};
use orderflow::adapters::provider::{HttpPaymentProvider, PaymentProviderConfig};
use orderflow::config::AppConfig;
use orderflow::domain::payments::WebhookVerifier;
use orderflow::ports::NotificationDispatcher;

#[tokio::main]
async fn main() {
    let config = AppConfig::load().expect("Failed to load configuration");
    config.validate().expect("Invalid configuration");

    // Tracing: RUST_LOG wins, the configured filter is the fallback.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    run_migrations(&pool).await.expect("Failed to run migrations");
    tracing::info!("Migrations applied");

    // Wire adapters into the application state.
    let audit = Arc::new(PostgresAuditLog::new(pool.clone()));
    let orders = Arc::new(PostgresOrderRepository::new(pool.clone()));
    let webhook_events = Arc::new(PostgresWebhookEventRepository::new(pool.clone()));

    let payment_provider = HttpPaymentProvider::new(PaymentProviderConfig::new(
        config.payment.api_key.clone(),
        config.payment.api_base_url.clone(),
        Duration::from_secs(config.payment.request_timeout_secs),
    ))
    .expect("Failed to build payment provider client");

    let notifier: Arc<dyn NotificationDispatcher> = match &config.notifications.gateway_url {
        Some(url) => Arc::new(HttpNotificationDispatcher::new(NotificationsGatewayConfig {
            gateway_url: url.clone(),
            request_timeout: Duration::from_secs(config.notifications.request_timeout_secs),
        })),
        None => Arc::new(NoopDispatcher),
    };

    let verifier = WebhookVerifier::with_tolerance(
        config.payment.webhook_secret.clone(),
        config.payment.signature_tolerance_secs,
    );

    let state = OrdersAppState {
        orders,
        webhook_events,
        audit,
        payment_provider: Arc::new(payment_provider),
        notifier,
        verifier: Arc::new(verifier),
        retry_policy: config.payment.retry_policy(),
    };

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let cors_origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if !cors_origins.is_empty() {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr = config.server.socket_addr();
    tracing::info!("orderflow listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Liveness health check. Does not touch dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check. Verifies database connectivity.
async fn readiness(State(state): State<OrdersAppState>) -> StatusCode {
    use orderflow::domain::foundation::OrderId;

    match state.orders.find_by_id(&OrderId::new()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
