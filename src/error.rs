use thiserror::Error;

/// Failure reported by a model gateway for a single request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("HTTP error: {status} - {message}")]
    Http {
        status: u16,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Empty response from model {0}")]
    EmptyResponse(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Only rate-limit failures are worth backing off for
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GatewayError::RateLimited(_))
    }
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM call failed: {operation} after {attempts} attempt(s) - {source}")]
    LlmCall {
        operation: String,
        attempts: u32,
        #[source]
        source: GatewayError,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl OrchestratorError {
    pub fn validation(message: impl Into<String>) -> Self {
        OrchestratorError::Validation { message: message.into(), source: None }
    }

    /// Validation failure caused by malformed or mis-shaped JSON
    pub fn invalid_json(message: impl Into<String>, source: serde_json::Error) -> Self {
        OrchestratorError::Validation { message: message.into(), source: Some(source) }
    }

    /// Whether the error falls outside the known failure kinds
    pub fn is_unexpected(&self) -> bool {
        matches!(self, OrchestratorError::Unexpected(_))
    }
}

pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;
