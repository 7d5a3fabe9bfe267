//! HTTP notification dispatcher.
//!
//! Posts committed transitions to the notification gateway (the subsystem
//! that fans out to customer and admin push channels). Strictly
//! fire-and-forget: the call is bounded by a timeout and every failure ends
//! here, in the log.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::OrderId;
use crate::domain::orders::OrderStatus;
use crate::ports::NotificationDispatcher;

/// Configuration for the notification gateway client.
#[derive(Debug, Clone)]
pub struct NotificationsGatewayConfig {
    /// Endpoint receiving transition announcements.
    pub gateway_url: String,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// Dispatcher reaching the gateway over HTTP.
pub struct HttpNotificationDispatcher {
    config: NotificationsGatewayConfig,
    http_client: reqwest::Client,
}

impl HttpNotificationDispatcher {
    pub fn new(config: NotificationsGatewayConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn order_transitioned(&self, order_id: OrderId, new_state: OrderStatus) {
        let body = serde_json::json!({
            "order_id": order_id.to_string(),
            "new_state": new_state.as_str(),
        });

        match self
            .http_client
            .post(&self.config.gateway_url)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(order_id = %order_id, new_state = %new_state, "Notification dispatched");
            }
            Ok(response) => {
                tracing::warn!(
                    order_id = %order_id,
                    new_state = %new_state,
                    status = %response.status(),
                    "Notification gateway rejected dispatch"
                );
            }
            Err(e) => {
                tracing::warn!(
                    order_id = %order_id,
                    new_state = %new_state,
                    error = %e,
                    "Notification dispatch failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_failure_does_not_panic_or_propagate() {
        let dispatcher = HttpNotificationDispatcher::new(NotificationsGatewayConfig {
            // Reserved TEST-NET address, nothing listens there.
            gateway_url: "http://192.0.2.1:9/notify".to_string(),
            request_timeout: Duration::from_millis(100),
        });

        // Returns unit regardless of the gateway being down.
        dispatcher
            .order_transitioned(OrderId::new(), OrderStatus::Paid)
            .await;
    }
}
