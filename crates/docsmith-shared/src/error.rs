//! Error types for Docsmith
//!
//! Parsing and scoring never fail: their failures are values carried inside
//! `CodeAnalysis` and `ScoreBreakdown`. The errors below cover the plumbing
//! around them (files, configuration, templates and LLM providers).

use crate::types::ProviderId;
use thiserror::Error;

/// Main error type for Docsmith operations
#[derive(Debug, Error)]
pub enum DocsmithError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("LLM provider error: {provider} - {message}")]
    LlmProvider { provider: ProviderId, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Timeout occurred: {operation}")]
    Timeout { operation: String },

    #[error("Rate limit exceeded for provider: {provider}")]
    RateLimit { provider: ProviderId },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type alias for Docsmith operations
pub type Result<T> = std::result::Result<T, DocsmithError>;

/// LLM-specific errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Provider not available: {provider}")]
    ProviderNotAvailable { provider: ProviderId },

    #[error("API key missing for provider: {provider}")]
    ApiKeyMissing { provider: ProviderId },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Response parsing error: {message}")]
    ResponseParsing { message: String },

    #[error("Network timeout: {provider}")]
    NetworkTimeout { provider: ProviderId },

    #[error("Rate limited by {provider}, retry after {retry_after_secs}s")]
    RateLimited {
        provider: ProviderId,
        retry_after_secs: u64,
    },

    #[error("Server error from {provider}: {status_code} - {message}")]
    ServerError {
        provider: ProviderId,
        status_code: u16,
        message: String,
    },
}

impl LlmError {
    /// Provider the error originated from, when known
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            LlmError::ProviderNotAvailable { provider }
            | LlmError::ApiKeyMissing { provider }
            | LlmError::NetworkTimeout { provider }
            | LlmError::RateLimited { provider, .. }
            | LlmError::ServerError { provider, .. } => Some(*provider),
            LlmError::ModelNotFound { .. } | LlmError::ResponseParsing { .. } => None,
        }
    }

    /// Whether retrying the same request can succeed
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::NetworkTimeout { .. } | LlmError::RateLimited { .. } => true,
            LlmError::ServerError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {message}")]
    InvalidFormat { message: String },

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Conversion implementations for easier error handling
impl From<LlmError> for DocsmithError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::RateLimited { provider, .. } => DocsmithError::RateLimit { provider },
            LlmError::NetworkTimeout { provider } => DocsmithError::Timeout {
                operation: format!("{} request", provider),
            },
            other => DocsmithError::LlmProvider {
                provider: other.provider().unwrap_or_default(),
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for DocsmithError {
    fn from(error: ConfigError) -> Self {
        DocsmithError::Config {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_conversion() {
        let err: DocsmithError = LlmError::ApiKeyMissing {
            provider: ProviderId::OpenAi,
        }
        .into();
        assert!(matches!(
            err,
            DocsmithError::LlmProvider {
                provider: ProviderId::OpenAi,
                ..
            }
        ));

        let err: DocsmithError = LlmError::RateLimited {
            provider: ProviderId::Ollama,
            retry_after_secs: 3,
        }
        .into();
        assert!(matches!(err, DocsmithError::RateLimit { .. }));
    }

    #[test]
    fn test_transient_errors() {
        let server = LlmError::ServerError {
            provider: ProviderId::Ollama,
            status_code: 503,
            message: "busy".to_string(),
        };
        assert!(server.is_transient());

        let client = LlmError::ServerError {
            provider: ProviderId::Ollama,
            status_code: 400,
            message: "bad request".to_string(),
        };
        assert!(!client.is_transient());
        assert!(!LlmError::ModelNotFound { model: "x".into() }.is_transient());
    }

    #[test]
    fn test_config_error_display() {
        let err: DocsmithError = ConfigError::InvalidValue {
            key: "scoring.pass_percent".to_string(),
            value: "0".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid configuration value for scoring.pass_percent: 0"
        );
    }
}
