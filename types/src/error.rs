//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for creditline types.
///
/// The richer taxonomy (configuration, redirect, transport, submission)
/// lives with the crates that produce those errors; this covers failures
/// the shared types themselves can raise.
#[derive(Debug, Error)]
pub enum CreditError {
    #[error("invalid chain address: {0}")]
    InvalidAddress(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}
