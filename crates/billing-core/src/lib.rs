//! billing-core: account scopes, billing endpoints, usage records and the
//! shared error type.
//!
//! This crate knows the shape of the GitHub billing API (URLs and JSON
//! bodies) but carries no HTTP client or runtime, so the exporter and its
//! tests can feed it bodies from anywhere.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. Every malformed
//! body surfaces as a `BillingError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod scope;
pub mod usage;

pub use error::{BillingError, ErrorKind, Result};
pub use scope::{endpoint, AccountScope, Facet};
