//! Gateway error taxonomy.
//!
//! Fetch-stage errors are fully recoverable (the cycle is skipped);
//! submission-stage errors abort the remainder of the stage that
//! raised them. Cancellation outcomes are reported per symbol by the
//! lifecycle and never surface through this type as cycle failures.

use thiserror::Error;

/// Errors raised at the exchange boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
