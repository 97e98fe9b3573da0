use crate::config::ProviderConfig;
use crate::error::{ConfigurationError, GenerationError};
use crate::generation::{GenerationConfig, DEFAULT_MODEL};
use crate::model::{RecipeResponse, RenderedPrompt};
use crate::providers::{error_message, http_client, non_empty, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Environment variables checked for the API token, in order
pub const HUGGINGFACE_TOKEN_VARS: [&str; 2] = ["HUGGINGFACE_API_TOKEN", "HUGGINGFACEHUB_API_TOKEN"];

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

pub struct HuggingFaceProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

fn token_from_env() -> Option<String> {
    HUGGINGFACE_TOKEN_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|token| !token.trim().is_empty())
}

impl HuggingFaceProvider {
    /// Create a new Hugging Face provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ConfigurationError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(token_from_env)
            .ok_or(ConfigurationError::MissingCredential(HUGGINGFACE_TOKEN_VARS[0]))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(HuggingFaceProvider {
            client: http_client(timeout)?,
            api_key,
            base_url,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        HuggingFaceProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            timeout: Duration::from_secs(30),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}

/// The generated text, from either the list or the single-object response shape
fn generated_text(body: &Value) -> Option<&str> {
    body[0]["generated_text"]
        .as_str()
        .or_else(|| body["generated_text"].as_str())
}

#[async_trait]
impl LlmProvider for HuggingFaceProvider {
    fn provider_name(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        params: &GenerationConfig,
    ) -> Result<RecipeResponse, GenerationError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&json!({
                "inputs": prompt.as_str(),
                "parameters": {
                    "temperature": params.temperature,
                    "max_new_tokens": params.max_new_tokens,
                    "top_p": params.top_p,
                    "repetition_penalty": params.repetition_penalty,
                    "return_full_text": false
                },
                "options": {"wait_for_model": true}
            }))
            .send()
            .await
            .map_err(|e| GenerationError::from_transport(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::from_transport(e, self.timeout))?;
        debug!("Hugging Face response ({}): {}", status, body);

        if !status.is_success() {
            return Err(GenerationError::from_status(
                status.as_u16(),
                error_message(&body),
            ));
        }

        let response_body: Value = serde_json::from_str(&body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        if let Some(error) = response_body.get("error") {
            return Err(GenerationError::Unavailable(
                error.as_str().unwrap_or("unknown error").to_string(),
            ));
        }

        let text = generated_text(&response_body).ok_or_else(|| {
            GenerationError::MalformedResponse(format!("no generated_text in response: {}", body))
        })?;

        // Some deployments ignore return_full_text and echo the prompt
        let text = text.strip_prefix(prompt.as_str()).unwrap_or(text);

        non_empty(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecipeForm;
    use crate::prompt::PromptTemplate;
    use crate::validation::Validator;
    use mockito::{Matcher, Server};

    const MODEL_PATH: &str = "/models/mistralai/Mistral-7B-Instruct-v0.2";

    fn prompt() -> RenderedPrompt {
        let request = Validator::default()
            .validate(&RecipeForm::new("eggs, bread, butter", "15"))
            .unwrap();
        PromptTemplate::default().render(&request)
    }

    fn provider(server: &Server) -> HuggingFaceProvider {
        HuggingFaceProvider::with_base_url(
            "hf_test_token".to_string(),
            server.url(),
            DEFAULT_MODEL.to_string(),
        )
    }

    #[tokio::test]
    async fn test_generate() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", MODEL_PATH)
            .match_header("authorization", "Bearer hf_test_token")
            .match_body(Matcher::PartialJson(json!({
                "parameters": {"max_new_tokens": 512, "return_full_text": false}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"generated_text": "Recipe Name: French Toast\nTotal Time: 12 minutes"}]"#)
            .create_async()
            .await;

        let result = provider(&server)
            .generate(&prompt(), &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(
            result.as_str(),
            "Recipe Name: French Toast\nTotal Time: 12 minutes"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_echoed_prompt_is_stripped() {
        let prompt = prompt();
        let mut server = Server::new_async().await;
        let body = json!([{ "generated_text": format!("{}Recipe Name: Eggy Bread", prompt.as_str()) }]);
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let result = provider(&server)
            .generate(&prompt, &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(result.as_str(), "Recipe Name: Eggy Bread");
    }

    #[tokio::test]
    async fn test_single_object_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(r#"{"generated_text": "Recipe Name: Toast"}"#)
            .create_async()
            .await;

        let result = provider(&server)
            .generate(&prompt(), &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(result.as_str(), "Recipe Name: Toast");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(401)
            .with_body(r#"{"error": "Invalid credentials in Authorization header"}"#)
            .create_async()
            .await;

        let result = provider(&server)
            .generate(&prompt(), &GenerationConfig::default())
            .await;
        assert_eq!(
            result,
            Err(GenerationError::Authentication(
                "Invalid credentials in Authorization header".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_model_loading() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(503)
            .with_body(r#"{"error": "Model is currently loading", "estimated_time": 20.0}"#)
            .create_async()
            .await;

        let result = provider(&server)
            .generate(&prompt(), &GenerationConfig::default())
            .await;
        assert!(matches!(result, Err(GenerationError::Unavailable(msg)) if msg.contains("loading")));
    }

    #[tokio::test]
    async fn test_empty_generation() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(r#"[{"generated_text": "   "}]"#)
            .create_async()
            .await;

        let result = provider(&server)
            .generate(&prompt(), &GenerationConfig::default())
            .await;
        assert_eq!(result, Err(GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let result = provider(&server)
            .generate(&prompt(), &GenerationConfig::default())
            .await;
        assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));

        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(r#"[{"summary_text": "wrong task"}]"#)
            .create_async()
            .await;

        let result = provider(&server)
            .generate(&prompt(), &GenerationConfig::default())
            .await;
        assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        // Accept connections but never answer
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let _hold = tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });

        let config = ProviderConfig {
            enabled: true,
            api_key: Some("hf_test_token".to_string()),
            base_url: Some(format!("http://{}", address)),
            ..Default::default()
        };
        let timeout = Duration::from_millis(200);
        let provider = HuggingFaceProvider::new(&config, timeout).unwrap();

        let result = provider
            .generate(&prompt(), &GenerationConfig::default())
            .await;
        assert_eq!(result, Err(GenerationError::Timeout(timeout)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let address = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let provider = HuggingFaceProvider::with_base_url(
            "hf_test_token".to_string(),
            format!("http://{}", address),
            DEFAULT_MODEL.to_string(),
        );

        let result = provider
            .generate(&prompt(), &GenerationConfig::default())
            .await;
        assert!(matches!(result, Err(GenerationError::Network(_))));
    }

    #[test]
    fn test_config_key_takes_precedence() {
        let config = ProviderConfig {
            enabled: true,
            model: Some("facebook/opt-1.3b".to_string()),
            api_key: Some("hf_from_config".to_string()),
            ..Default::default()
        };
        let provider = HuggingFaceProvider::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.api_key, "hf_from_config");
        assert_eq!(provider.model(), "facebook/opt-1.3b");
        assert_eq!(
            provider.endpoint(),
            "https://api-inference.huggingface.co/models/facebook/opt-1.3b"
        );
    }

    #[test]
    fn test_missing_token_is_configuration_error() {
        for var in HUGGINGFACE_TOKEN_VARS {
            std::env::remove_var(var);
        }
        let config = ProviderConfig {
            enabled: true,
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let result = HuggingFaceProvider::new(&config, Duration::from_secs(5));
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingCredential("HUGGINGFACE_API_TOKEN"))
        ));
    }

    #[tokio::test]
    async fn test_provider_name() {
        let provider = HuggingFaceProvider::with_base_url(
            "hf_test_token".to_string(),
            DEFAULT_BASE_URL.to_string(),
            DEFAULT_MODEL.to_string(),
        );
        assert_eq!(provider.provider_name(), "huggingface");
    }
}
