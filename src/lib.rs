//! Orderflow - Payment reconciliation core
//!
//! Implements the payment backbone of the Orderflow commerce backend:
//! checkout session creation, verified and idempotent processing of
//! payment-provider webhook events, and an audited order state machine.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
