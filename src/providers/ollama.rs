use crate::config::ProviderConfig;
use crate::error::{ConfigurationError, GenerationError};
use crate::generation::GenerationConfig;
use crate::model::{RecipeResponse, RenderedPrompt};
use crate::providers::{error_message, http_client, non_empty, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "mistral";

/// A local Ollama server. Needs no credential.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaProvider {
    /// Create a new Ollama provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ConfigurationError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(OllamaProvider {
            client: http_client(timeout)?,
            base_url,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String, model: String) -> Self {
        OllamaProvider {
            client: Client::new(),
            base_url,
            model,
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        params: &GenerationConfig,
    ) -> Result<RecipeResponse, GenerationError> {
        // Ollama uses OpenAI-compatible API
        let response = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "user", "content": prompt.as_str()}
                ],
                "temperature": params.temperature,
                "top_p": params.top_p,
                "max_tokens": params.max_new_tokens,
                // The compatible endpoint has no multiplicative repetition penalty;
                // frequency_penalty is its additive counterpart, 0.0 meaning none
                "frequency_penalty": params.repetition_penalty - 1.0
            }))
            .send()
            .await
            .map_err(|e| GenerationError::from_transport(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::from_transport(e, self.timeout))?;
        debug!("Ollama response ({}): {}", status, body);

        if !status.is_success() {
            return Err(GenerationError::from_status(
                status.as_u16(),
                error_message(&body),
            ));
        }

        let response_body: Value = serde_json::from_str(&body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let content = response_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                GenerationError::MalformedResponse(format!(
                    "Failed to extract content from Ollama response: {}",
                    body
                ))
            })?;

        non_empty(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn prompt() -> RenderedPrompt {
        RenderedPrompt::new("Write a recipe that uses only these ingredients: rice.".to_string())
    }

    #[tokio::test]
    async fn test_ollama_generate() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({"model": "llama3", "max_tokens": 256})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "choices": [{
                        "message": {
                            "content": "Recipe Name: Fried Rice"
                        }
                    }]
                }"#,
            )
            .create_async()
            .await;

        let provider = OllamaProvider::with_base_url(server.url(), "llama3".to_string());
        let params = GenerationConfig {
            max_new_tokens: 256,
            ..Default::default()
        };

        let result = provider.generate(&prompt(), &params).await.unwrap();
        assert_eq!(result.as_str(), "Recipe Name: Fried Rice");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_repetition_penalty_is_forwarded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "temperature": 0.5,
                "frequency_penalty": 0.5
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "Recipe Name: Congee"}}]}"#)
            .create_async()
            .await;

        let provider = OllamaProvider::with_base_url(server.url(), "mistral".to_string());
        let params = GenerationConfig {
            temperature: 0.5,
            repetition_penalty: 1.5,
            ..Default::default()
        };

        let result = provider.generate(&prompt(), &params).await.unwrap();
        assert_eq!(result.as_str(), "Recipe Name: Congee");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ollama_missing_model() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(404)
            .with_body(r#"{"error": {"message": "model \"llama9\" not found"}}"#)
            .create_async()
            .await;

        let provider = OllamaProvider::with_base_url(server.url(), "llama9".to_string());
        let result = provider
            .generate(&prompt(), &GenerationConfig::default())
            .await;
        assert!(matches!(result, Err(GenerationError::Unavailable(msg)) if msg.contains("llama9")));
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig {
            enabled: true,
            ..Default::default()
        };

        let provider = OllamaProvider::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert_eq!(provider.model(), "mistral");
        assert_eq!(provider.provider_name(), "ollama");
    }
}
