//! Lifecycle error types.
//!
//! Submission and fill-fetch failures abort the cycle in whatever
//! state it had reached; orders already accepted by the venue are not
//! rolled back. Stop-cancellation failures are deliberately absent
//! here: they are per-symbol outcomes reported in the cycle report.

use crate::state::CycleState;
use carry_core::Symbol;
use carry_gateway::GatewayError;
use thiserror::Error;

/// Errors that abort a lifecycle run.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{stage} batch submission failed in state {state}: {source}")]
    Submission {
        stage: &'static str,
        state: CycleState,
        source: GatewayError,
    },

    #[error("fill fetch failed for {symbol}: {source}")]
    FillFetch {
        symbol: Symbol,
        source: GatewayError,
    },

    #[error("no funding rate recorded for filled symbol {0}")]
    MissingRate(Symbol),
}

/// Result type alias for lifecycle operations.
pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;
