//! Shared error type across billing-exporter crates.

use thiserror::Error;

use crate::scope::Facet;

/// Stable error kinds, used in the fatal log line and asserted in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Config file unreadable, invalid, or missing a credential.
    Config,
    /// Could not talk to the billing API at all.
    Transport,
    /// Billing API answered with a non-2xx status.
    Status,
    /// Response body was not the expected JSON shape.
    Decode,
    /// Anything else (bind failures, task panics).
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "CONFIG",
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Status => "STATUS",
            ErrorKind::Decode => "DECODE",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("config: {0}")]
    Config(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("decode {facet} usage: {reason}")]
    Decode { facet: Facet, reason: String },
    #[error("internal: {0}")]
    Internal(String),
}

impl BillingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::Config(_) => ErrorKind::Config,
            BillingError::Transport(_) => ErrorKind::Transport,
            BillingError::Status { .. } => ErrorKind::Status,
            BillingError::Decode { .. } => ErrorKind::Decode,
            BillingError::Internal(_) => ErrorKind::Internal,
        }
    }
}
