//! OpenAiBackend implementation.

use async_trait::async_trait;
use digest_core::{BackendError, PromptPart, SummaryBackend};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::OpenAiConfig;

/// A summarization backend that calls an OpenAI-compatible chat completions API.
///
/// Each [`SummaryBackend::complete`] call performs exactly one HTTP request.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, BackendError> {
        if config.api_key.is_empty() {
            return Err(BackendError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!("OpenAiBackend initialized for {}", config.api_url);

        Ok(Self { client, config })
    }

    /// Create a backend from environment variables.
    ///
    /// See [`OpenAiConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn build_request(&self, model: &str, parts: Vec<PromptPart>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: model.to_string(),
            messages: parts.into_iter().map(Into::into).collect(),
            store: false,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl SummaryBackend for OpenAiBackend {
    async fn complete(&self, model: &str, parts: Vec<PromptPart>) -> Result<String, BackendError> {
        let request = self.build_request(model, parts);

        debug!(
            "Sending {} parts to {} (model={})",
            request.messages.len(),
            self.config.api_url,
            model
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            let message = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => api_error.error.message,
                Err(_) => error_text,
            };

            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        match completion.first_text() {
            Some(text) => Ok(text.to_string()),
            None => {
                warn!("No content in completion response");
                Err(BackendError::EmptyResponse)
            }
        }
    }

    fn name(&self) -> &str {
        "OpenAiBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let result = OpenAiBackend::new(OpenAiConfig::default());
        assert!(matches!(result, Err(BackendError::Configuration(_))));
    }

    #[test]
    fn test_build_request_preserves_part_order() {
        let backend = OpenAiBackend::new(
            OpenAiConfig::builder().api_key("test-key").max_tokens(256).build(),
        )
        .unwrap();

        let request = backend.build_request(
            "gpt-4o-mini",
            vec![
                PromptPart::user("phrase"),
                PromptPart::user("transcript"),
                PromptPart::user("Processed:"),
            ],
        );

        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["phrase", "transcript", "Processed:"]);
        assert!(!request.store);
        assert_eq!(request.max_tokens, Some(256));
    }

    #[test]
    fn test_backend_name() {
        let backend = OpenAiBackend::new(OpenAiConfig::builder().api_key("k").build()).unwrap();
        assert_eq!(backend.name(), "OpenAiBackend");
    }
}
