//! Payment provider adapters.

mod http_payment_provider;
mod mock_payment_provider;

pub use http_payment_provider::{HttpPaymentProvider, PaymentProviderConfig};
pub use mock_payment_provider::MockPaymentProvider;
