//! Mock payment provider for tests and local development.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::ports::{CheckoutSession, CreateSessionRequest, PaymentError, PaymentProvider};

/// Provider fake that hands out deterministic sessions, or fails on demand.
pub struct MockPaymentProvider {
    counter: AtomicU64,
    fail: bool,
}

impl MockPaymentProvider {
    /// Provider that always succeeds.
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
            fail: false,
        }
    }

    /// Provider that refuses every call, for testing the unavailable path.
    pub fn failing() -> Self {
        Self {
            counter: AtomicU64::new(1),
            fail: true,
        }
    }
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if self.fail {
            return Err(PaymentError::network("simulated provider outage"));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(CheckoutSession {
            id: format!("cs_mock_{}", n),
            url: format!(
                "https://checkout.provider.example/pay/cs_mock_{}?order={}",
                n, request.order_id
            ),
            expires_at: chrono::Utc::now().timestamp() + 3600,
        })
    }
}
