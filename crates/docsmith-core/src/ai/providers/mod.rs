//! LLM Provider Implementations
//!
//! Each provider implements the `LlmProvider` trait so the documentation
//! pipeline never depends on a concrete backend.

pub mod ollama;
pub mod openai;

// Re-export provider implementations
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::ai::{LlmProvider, RetryPolicy};
use docsmith_shared::{LlmConfig, ProviderId, Result};
use secrecy::SecretString;
use std::time::Duration;
use tracing::debug;

/// Type alias for boxed provider
pub type BoxedProvider = Box<dyn LlmProvider>;

/// Provider factory for creating providers from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the configured provider, reading API keys from the environment
    pub fn create(config: &LlmConfig) -> Result<BoxedProvider> {
        let api_key = match config.provider {
            ProviderId::OpenAi => Some(OpenAiProvider::api_key_from_env()?),
            ProviderId::Ollama => None,
        };
        Self::create_with_key(config, api_key)
    }

    /// Create the configured provider with an explicit API key
    pub fn create_with_key(
        config: &LlmConfig,
        api_key: Option<SecretString>,
    ) -> Result<BoxedProvider> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let retry = RetryPolicy::new(config.max_retries);

        debug!(provider = %config.provider, model = %config.model, "Creating provider");
        match config.provider {
            ProviderId::Ollama => {
                let endpoint = config.endpoint.as_deref().unwrap_or(ollama::DEFAULT_ENDPOINT);
                let provider = OllamaProvider::new(endpoint, &config.model, timeout, retry)?;
                Ok(Box::new(provider))
            }
            ProviderId::OpenAi => {
                let api_key = match api_key {
                    Some(key) => key,
                    None => OpenAiProvider::api_key_from_env()?,
                };
                let provider = OpenAiProvider::new(
                    api_key,
                    &config.model,
                    config.endpoint.as_deref(),
                    timeout,
                    retry,
                )?;
                Ok(Box::new(provider))
            }
        }
    }
}
