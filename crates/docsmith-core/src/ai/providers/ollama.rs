//! Ollama Provider Implementation
//!
//! Provides integration with Ollama for local LLM inference.
//! This is the default provider: nothing leaves the machine.

use crate::ai::{
    GenerationOptions, HealthStatus, LlmProvider, RetryPolicy, status_error, transport_error,
};
use async_trait::async_trait;
use docsmith_shared::{DocsmithError, LlmError, ProviderId, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama provider for local LLM inference
pub struct OllamaProvider {
    client: Client,
    endpoint: String,
    model: String,
    retry: RetryPolicy,
}

/// Request payload for Ollama API
#[derive(Serialize, Debug)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    options: OllamaOptions,
}

/// Options specific to Ollama
#[derive(Serialize, Debug)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    // max_tokens equivalent
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// Response from Ollama API
#[derive(Deserialize, Debug)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Information about available models
#[derive(Deserialize, Debug)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize, Debug)]
struct ModelInfo {
    name: String,
}

impl OllamaProvider {
    /// Create with custom configuration
    pub fn new(endpoint: &str, model: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocsmithError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get list of available models
    async fn available_models(&self) -> std::result::Result<Vec<String>, LlmError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .await
            .map_err(|e| transport_error(self.id(), e))?;

        if !response.status().is_success() {
            return Err(status_error(self.id(), response).await);
        }

        let models: ModelsResponse = response.json().await.map_err(|e| LlmError::ResponseParsing {
            message: format!("failed to parse models response: {}", e),
        })?;

        Ok(models.models.into_iter().map(|m| m.name).collect())
    }

    /// Convert generation options to Ollama format
    fn convert_options(options: &GenerationOptions) -> OllamaOptions {
        OllamaOptions {
            temperature: options.temperature,
            top_p: options.top_p,
            num_predict: options.max_tokens.map(|t| t as i64),
            stop: options.stop.clone(),
        }
    }

    async fn generate_once(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, LlmError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            system: options.system.as_deref(),
            options: Self::convert_options(options),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
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

        let body: OllamaResponse = response.json().await.map_err(|e| LlmError::ResponseParsing {
            message: format!("failed to parse generate response: {}", e),
        })?;

        debug!(tokens = ?body.eval_count, "Ollama generation finished");
        Ok(body.response)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn name(&self) -> &'static str {
        "Ollama"
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<HealthStatus> {
        let status = match self.available_models().await {
            Ok(models) if models.iter().any(|m| m == &self.model) => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Degraded {
                reason: format!("model {} is not pulled", self.model),
            },
            Err(e) => HealthStatus::Unhealthy {
                error: e.to_string(),
            },
        };
        Ok(status)
    }

    #[instrument(skip(self, prompt, options), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        self.retry.run(|| self.generate_once(prompt, options)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, attempts: u32) -> OllamaProvider {
        OllamaProvider::new(
            &server.uri(),
            "codellama:7b",
            Duration::from_secs(5),
            RetryPolicy::new(attempts).with_base_delay(Duration::ZERO),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "codellama:7b",
                "stream": false,
                "options": { "num_predict": 4096 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "# Widget\n",
                "done": true,
                "eval_count": 12
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider(&server, 3)
            .generate("document this", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "# Widget\n");
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let result = provider(&server, 3)
            .generate("prompt", &GenerationOptions::default())
            .await;
        assert!(matches!(result, Err(DocsmithError::LlmProvider { .. })));
    }

    #[tokio::test]
    async fn test_missing_model_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let error = provider(&server, 3)
            .generate("prompt", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("codellama:7b"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "llama3:8b" }]
            })))
            .mount(&server)
            .await;

        let status = provider(&server, 1).health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Degraded { .. }));
        assert!(status.is_available());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unhealthy() {
        let provider = OllamaProvider::new(
            "http://127.0.0.1:9",
            "codellama:7b",
            Duration::from_secs(1),
            RetryPolicy::new(1),
        )
        .unwrap();

        let status = provider.health_check().await.unwrap();
        assert!(!status.is_available());
    }
}
