//! HTTP payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the provider's REST API.
//! The only call the core makes is checkout session creation; it is bounded
//! by an explicit request timeout so a slow provider cannot pin request
//! handlers.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{
    CheckoutSession, CreateSessionRequest, PaymentError, PaymentErrorCode, PaymentProvider,
};

/// Configuration for the provider HTTP client.
#[derive(Clone)]
pub struct PaymentProviderConfig {
    /// Secret API key.
    pub api_key: SecretString,

    /// Base URL of the provider API.
    pub api_base_url: String,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl PaymentProviderConfig {
    pub fn new(api_key: SecretString, api_base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            api_key,
            api_base_url: api_base_url.into(),
            request_timeout,
        }
    }
}

impl std::fmt::Debug for PaymentProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentProviderConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Payment provider reached over HTTPS.
pub struct HttpPaymentProvider {
    config: PaymentProviderConfig,
    http_client: reqwest::Client,
}

impl HttpPaymentProvider {
    /// Creates the adapter with a timeout-bounded client.
    pub fn new(config: PaymentProviderConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::provider(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

/// Wire shape of a created session.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
    #[serde(default)]
    expires_at: i64,
}

/// Wire shape of a provider error body.
#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    #[serde(default)]
    error: String,
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let body = serde_json::json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "line_items": request.line_items,
            "success_url": request.success_url,
            "cancel_url": request.cancel_url,
            // The order id rides along in the session metadata so webhook
            // events can be routed back to the order.
            "metadata": { "order_id": request.order_id.to_string() },
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    PaymentError::network(e.to_string())
                } else {
                    PaymentError::provider(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let session: SessionResponse = response
                .json()
                .await
                .map_err(|e| PaymentError::provider(format!("malformed session response: {}", e)))?;
            return Ok(CheckoutSession {
                id: session.id,
                url: session.url,
                expires_at: session.expires_at,
            });
        }

        let error_body = response
            .json::<ProviderErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_default();

        tracing::warn!(
            status = %status,
            error = %error_body,
            "Checkout session creation rejected by provider"
        );

        let err = match status.as_u16() {
            401 | 403 => PaymentError::authentication(error_body),
            429 => PaymentError::new(PaymentErrorCode::RateLimitExceeded, error_body),
            400..=499 => PaymentError::new(PaymentErrorCode::InvalidRequest, error_body),
            _ => PaymentError::provider(format!("provider answered {}: {}", status, error_body)),
        };
        Err(err)
    }
}
