//! HTTP adapters - Axum bindings for the application handlers.
//!
//! The core speaks in explicit request/response value structures; nothing in
//! the domain depends on the transport.

pub mod orders;
