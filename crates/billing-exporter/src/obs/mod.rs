//! In-process metrics.
//!
//! Gauges are stored as atomics, written by the collectors and rendered by
//! the `/metrics` handler.

pub mod metrics;
