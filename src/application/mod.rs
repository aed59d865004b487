//! Application layer orchestrating payments.
//!
//! `PaymentSession` models one payment dialog as an explicit state machine and
//! `ReconciliationEngine` drives it against the billing service port.

pub mod engine;
pub mod session;
