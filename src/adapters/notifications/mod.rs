//! Notification dispatcher adapters.
//!
//! The dispatcher is an injected capability rather than a process-wide
//! singleton, so tests substitute the recording fake and deployments without
//! a push gateway run the no-op.

mod http_dispatcher;
mod noop;
mod recording;

pub use http_dispatcher::{HttpNotificationDispatcher, NotificationsGatewayConfig};
pub use noop::NoopDispatcher;
pub use recording::RecordingDispatcher;
