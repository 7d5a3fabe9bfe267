//! Checkout retry policy.
//!
//! How often and for how long a failed checkout may be retried is an
//! operational decision, so both knobs come from configuration rather than
//! constants.

use crate::domain::foundation::Timestamp;
use crate::domain::orders::{Order, OrderError, OrderStatus};

/// Eligibility rules for `payment_failed -> awaiting_payment` retries.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutRetryPolicy {
    /// Maximum checkout attempts, counting the initial one.
    pub max_attempts: u32,

    /// How long after the last payment failure a retry stays eligible.
    pub window_hours: i64,
}

impl CheckoutRetryPolicy {
    pub fn new(max_attempts: u32, window_hours: i64) -> Self {
        Self {
            max_attempts,
            window_hours,
        }
    }

    /// Checks whether the order may retry checkout right now.
    pub fn check_eligible(&self, order: &Order, now: Timestamp) -> Result<(), OrderError> {
        if order.status != OrderStatus::PaymentFailed {
            return Err(OrderError::RetryNotEligible(format!(
                "order is {}, not payment_failed",
                order.status
            )));
        }
        if order.checkout_attempts >= self.max_attempts {
            return Err(OrderError::RetryNotEligible(format!(
                "attempt limit of {} reached",
                self.max_attempts
            )));
        }
        if let Some(failed_at) = order.last_payment_failure_at {
            if now.is_after(&failed_at.plus_hours(self.window_hours)) {
                return Err(OrderError::RetryNotEligible(format!(
                    "retry window of {} hours expired",
                    self.window_hours
                )));
            }
        }
        Ok(())
    }
}

impl Default for CheckoutRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CustomerId, OrderId};
    use crate::domain::orders::LineItem;

    fn failed_order() -> Order {
        let mut order = Order::create(
            OrderId::new(),
            CustomerId::new(),
            vec![LineItem::new("prod-a", 1, 1000).unwrap()],
            "USD",
            Timestamp::now(),
        )
        .unwrap();
        let now = Timestamp::now();
        order.transition(OrderStatus::AwaitingPayment, now).unwrap();
        order.transition(OrderStatus::PaymentFailed, now).unwrap();
        order
    }

    #[test]
    fn fresh_failure_is_eligible() {
        let order = failed_order();
        let policy = CheckoutRetryPolicy::default();
        assert!(policy.check_eligible(&order, Timestamp::now()).is_ok());
    }

    #[test]
    fn non_failed_orders_are_not_eligible() {
        let mut order = failed_order();
        order
            .transition(OrderStatus::AwaitingPayment, Timestamp::now())
            .unwrap();

        let policy = CheckoutRetryPolicy::default();
        let result = policy.check_eligible(&order, Timestamp::now());
        assert!(matches!(result, Err(OrderError::RetryNotEligible(_))));
    }

    #[test]
    fn attempt_limit_is_enforced() {
        let mut order = failed_order();
        order.checkout_attempts = 3;

        let policy = CheckoutRetryPolicy::default();
        let result = policy.check_eligible(&order, Timestamp::now());
        assert!(matches!(result, Err(OrderError::RetryNotEligible(_))));
    }

    #[test]
    fn retry_window_expires() {
        let mut order = failed_order();
        order.last_payment_failure_at = Some(Timestamp::now().minus_hours(25));

        let policy = CheckoutRetryPolicy::default();
        let result = policy.check_eligible(&order, Timestamp::now());
        assert!(matches!(result, Err(OrderError::RetryNotEligible(_))));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let mut order = failed_order();
        order.last_payment_failure_at = Some(Timestamp::now().minus_hours(23));

        let policy = CheckoutRetryPolicy::default();
        assert!(policy.check_eligible(&order, Timestamp::now()).is_ok());
    }
}
