//! Billing exporter library entry.
//!
//! Wires the config loader, billing client, collectors, gauge registry and
//! ops router together. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod client;
pub mod collector;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
