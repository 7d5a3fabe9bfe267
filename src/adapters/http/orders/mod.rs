//! HTTP surface for orders, checkout, and the webhook receiver.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::OrdersAppState;
pub use routes::api_router;
