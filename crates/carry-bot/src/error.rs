//! Application-level errors.

use thiserror::Error;

/// Errors raised during bootstrap and the run loop.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Gateway(#[from] carry_gateway::GatewayError),

    #[error(transparent)]
    Lifecycle(#[from] carry_lifecycle::LifecycleError),

    #[error(transparent)]
    Telemetry(#[from] carry_telemetry::TelemetryError),
}

/// Result type alias for application operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
