mod factory;
mod fallback;
mod huggingface;
mod ollama;

pub use factory::ProviderFactory;
pub use fallback::FallbackProvider;
pub use huggingface::{HuggingFaceProvider, HUGGINGFACE_TOKEN_VARS};
pub use ollama::OllamaProvider;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{ConfigurationError, GenerationError};
use crate::generation::GenerationConfig;
use crate::model::{RecipeResponse, RenderedPrompt};

/// Unified trait for all text-generation endpoints
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "huggingface", "ollama")
    fn provider_name(&self) -> &str;

    /// The model this provider sends prompts to
    fn model(&self) -> &str;

    /// Send a rendered prompt and return the model's text
    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        params: &GenerationConfig,
    ) -> Result<RecipeResponse, GenerationError>;
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, ConfigurationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("recipe-suggest/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigurationError::HttpClient(e.to_string()))
}

/// Reject blank generations; every other text is accepted as-is
fn non_empty(text: String) -> Result<RecipeResponse, GenerationError> {
    if text.trim().is_empty() {
        Err(GenerationError::EmptyResponse)
    } else {
        Ok(RecipeResponse::new(text))
    }
}

/// Pull a readable message out of an error body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json["error"]["message"]
            .as_str()
            .or_else(|| json["error"].as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.trim().to_string(),
    }
}
