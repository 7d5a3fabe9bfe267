//! Payment provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::orders::CheckoutRetryPolicy;

use super::error::ValidationError;

/// Payment provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Provider API key
    pub api_key: SecretString,

    /// Webhook signing secret shared with the provider
    pub webhook_secret: SecretString,

    /// Base URL for the provider API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout for provider API calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Replay tolerance for signed webhook timestamps, in seconds
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,

    /// Maximum checkout attempts per order, counting the first
    #[serde(default = "default_max_checkout_attempts")]
    pub max_checkout_attempts: u32,

    /// How long after a payment failure a checkout retry stays open, hours
    #[serde(default = "default_retry_window_hours")]
    pub checkout_retry_window_hours: i64,
}

impl PaymentConfig {
    /// The checkout retry policy expressed by this configuration.
    pub fn retry_policy(&self) -> CheckoutRetryPolicy {
        CheckoutRetryPolicy::new(self.max_checkout_attempts, self.checkout_retry_window_hours)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired(
                "ORDERFLOW__PAYMENT__API_KEY",
            ));
        }
        if self.webhook_secret.expose_secret().len() < 16 {
            return Err(ValidationError::WeakWebhookSecret);
        }
        if !(1..=3600).contains(&self.signature_tolerance_secs) {
            return Err(ValidationError::InvalidTolerance);
        }
        if self.max_checkout_attempts == 0 {
            return Err(ValidationError::InvalidRetryPolicy);
        }
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.provider.example".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_signature_tolerance() -> i64 {
    300
}

fn default_max_checkout_attempts() -> u32 {
    3
}

fn default_retry_window_hours() -> i64 {
    24
}
