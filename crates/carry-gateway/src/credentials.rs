//! API credentials loaded from the environment.

use crate::error::{GatewayError, GatewayResult};

/// Key pair for a signed venue API.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Load a key pair from the named environment variables.
    pub fn from_env(key_var: &str, secret_var: &str) -> GatewayResult<Self> {
        let api_key = std::env::var(key_var)
            .map_err(|_| GatewayError::MissingCredentials(key_var.to_string()))?;
        let api_secret = std::env::var(secret_var)
            .map_err(|_| GatewayError::MissingCredentials(secret_var.to_string()))?;
        Ok(Self {
            api_key,
            api_secret,
        })
    }
}
