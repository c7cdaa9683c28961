//! LLM Providers
//!
//! This module provides the text-generation side of Docsmith:
//! - Abstract LLM provider interface
//! - Ollama (local) and OpenAI-compatible implementations
//! - Retries with linear backoff for transient failures
//! - A client-side request budget

pub mod providers;
pub mod rate_limit;

// Re-export main types
pub use providers::{BoxedProvider, OllamaProvider, OpenAiProvider, ProviderFactory};
pub use rate_limit::RateLimiter;

use async_trait::async_trait;
use docsmith_shared::{DocsmithError, LlmConfig, LlmError, ProviderId, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Abstract trait for all LLM providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider identifier
    fn id(&self) -> ProviderId;

    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Model requests are sent to
    fn model(&self) -> String;

    /// Perform a health check
    async fn health_check(&self) -> Result<HealthStatus>;

    /// Generate a complete response
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}

/// Health status of a provider
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded { reason: String },
    Unhealthy { error: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy { .. })
    }
}

/// Options for a generation request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: Option<usize>,

    /// Temperature for randomness (0.0 - 2.0)
    pub temperature: Option<f32>,

    /// Top-p sampling parameter
    pub top_p: Option<f32>,

    /// Stop sequences
    pub stop: Option<Vec<String>>,

    /// System instruction, for providers with a chat format
    pub system: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(4096),
            temperature: Some(0.1),
            top_p: Some(0.9),
            stop: None,
            system: None,
        }
    }
}

impl From<&LlmConfig> for GenerationOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
            ..Self::default()
        }
    }
}

/// Retry policy shared by the HTTP providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,

    /// Delay before retry `n` is `n * base_delay`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of attempts
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, LlmError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < attempts => {
                    let delay = self.base_delay * attempt;
                    warn!(
                        "Request failed: {}, retrying in {:?} (attempt {}/{})",
                        e, delay, attempt, attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(DocsmithError::from(e)),
            }
        }
    }
}

/// Map a transport failure onto the provider error model
pub(crate) fn transport_error(provider: ProviderId, error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::NetworkTimeout { provider }
    } else if error.is_connect() {
        LlmError::ProviderNotAvailable { provider }
    } else {
        LlmError::ServerError {
            provider,
            status_code: error.status().map(|s| s.as_u16()).unwrap_or(0),
            message: error.to_string(),
        }
    }
}

/// Map a non-success HTTP status onto the provider error model
pub(crate) async fn status_error(provider: ProviderId, response: reqwest::Response) -> LlmError {
    let status = response.status();
    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1);
    let message = response.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited {
            provider,
            retry_after_secs,
        }
    } else if status == reqwest::StatusCode::UNAUTHORIZED {
        LlmError::ApiKeyMissing { provider }
    } else {
        LlmError::ServerError {
            provider,
            status_code: status.as_u16(),
            message,
        }
    }
}
