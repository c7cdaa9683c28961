//! OpenAI Provider Implementation
//!
//! Talks to any OpenAI-compatible chat completions API.

use crate::ai::{
    GenerationOptions, HealthStatus, LlmProvider, RetryPolicy, status_error, transport_error,
};
use async_trait::async_trait;
use docsmith_shared::{DocsmithError, LlmError, ProviderId, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    client: Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(
        api_key: SecretString,
        model: &str,
        endpoint: Option<&str>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(LlmError::ApiKeyMissing {
                provider: ProviderId::OpenAi,
            }
            .into());
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocsmithError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            endpoint: endpoint
                .unwrap_or(DEFAULT_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            retry,
        })
    }

    /// Read the API key from `OPENAI_API_KEY`
    pub fn api_key_from_env() -> Result<SecretString> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| {
                LlmError::ApiKeyMissing {
                    provider: ProviderId::OpenAi,
                }
                .into()
            })
    }

    async fn generate_once(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stop: options.stop.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(self.id(), e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotFound {
                model: self.model.clone(),
            });
        }
        if !response.status().is_success() {
            return Err(status_error(self.id(), response).await);
        }

        let body: ChatResponse = response.json().await.map_err(|e| LlmError::ResponseParsing {
            message: format!("failed to parse chat response: {}", e),
        })?;

        debug!(tokens = ?body.usage.as_ref().map(|u| u.total_tokens), "Chat completion finished");
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ResponseParsing {
                message: "response has no message content".to_string(),
            })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(format!("{}/v1/models", self.endpoint))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await;

        let status = match response {
            Ok(response) if response.status().is_success() => HealthStatus::Healthy,
            Ok(response) if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                HealthStatus::Degraded {
                    reason: "rate limited".to_string(),
                }
            }
            Ok(response) => HealthStatus::Unhealthy {
                error: status_error(self.id(), response).await.to_string(),
            },
            Err(e) => HealthStatus::Unhealthy {
                error: transport_error(self.id(), e).to_string(),
            },
        };
        Ok(status)
    }

    #[instrument(skip(self, prompt, options), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        self.retry.run(|| self.generate_once(prompt, options)).await
    }
}
