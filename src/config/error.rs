//! Configuration error types.

use thiserror::Error;

/// Errors while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors from semantic validation of loaded configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(&'static str),

    #[error("Server port must not be 0")]
    InvalidPort,

    #[error("Request timeout must be between 1 and 300 seconds")]
    InvalidTimeout,

    #[error("Database URL must be a postgres:// connection string")]
    InvalidDatabaseUrl,

    #[error("Webhook signing secret must be at least 16 characters")]
    WeakWebhookSecret,

    #[error("Signature tolerance must be between 1 and 3600 seconds")]
    InvalidTolerance,

    #[error("Checkout retry policy must allow at least one attempt")]
    InvalidRetryPolicy,

    #[error("Notification gateway URL must be an http(s) URL")]
    InvalidGatewayUrl,
}
