use std::sync::Arc;
use std::time::Duration;

use crate::advisor::RecipeAdvisor;
use crate::config::ProviderConfig;
use crate::error::ConfigurationError;
use crate::generation::GenerationConfig;
use crate::prompt::{PromptTemplate, TemplatePreset};
use crate::providers::{LlmProvider, ProviderFactory};
use crate::validation::{TimePolicy, Validator};

/// Built-in inference providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    /// Hosted Hugging Face inference API (needs HUGGINGFACE_API_TOKEN)
    #[default]
    HuggingFace,
    /// A local Ollama server
    Ollama,
}

impl ProviderKind {
    /// Convert to provider name string used by the factory
    fn as_str(&self) -> &str {
        match self {
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Ollama => "ollama",
        }
    }
}

/// Builder for configuring a [`RecipeAdvisor`] in code instead of config.toml
#[derive(Default)]
pub struct RecipeAdvisorBuilder {
    provider: Option<ProviderKind>,
    client: Option<Arc<dyn LlmProvider>>,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    template: Option<PromptTemplate>,
    generation: Option<GenerationConfig>,
    time_policy: Option<TimePolicy>,
    timeout: Option<Duration>,
    deadline: Option<Duration>,
}

impl RecipeAdvisorBuilder {
    /// Choose one of the built-in providers
    ///
    /// # Example
    /// ```
    /// use recipe_suggest::{ProviderKind, RecipeAdvisor};
    ///
    /// let builder = RecipeAdvisor::builder().provider(ProviderKind::Ollama);
    /// ```
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use an already constructed provider. Overrides [`provider`](Self::provider),
    /// `api_key`, `model` and `base_url`.
    pub fn client(mut self, client: Arc<dyn LlmProvider>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the API token instead of reading it from the environment
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model, e.g. `"mistralai/Mixtral-8x7B-Instruct-v0.1"`
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Point the provider at a different endpoint
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use a built-in template
    ///
    /// # Example
    /// ```
    /// use recipe_suggest::{RecipeAdvisor, TemplatePreset};
    ///
    /// let builder = RecipeAdvisor::builder().preset(TemplatePreset::Breakfast);
    /// ```
    pub fn preset(mut self, preset: TemplatePreset) -> Self {
        self.template = Some(PromptTemplate::preset(preset));
        self
    }

    /// Use a compiled template
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Replace the model's preset generation parameters
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Bounds for the time field
    pub fn time_policy(mut self, policy: TimePolicy) -> Self {
        self.time_policy = Some(policy);
        self
    }

    /// Set a timeout for each HTTP request
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set an upper bound for a whole generation
    pub fn deadline(mut self, duration: Duration) -> Self {
        self.deadline = Some(duration);
        self
    }

    /// Build the advisor
    ///
    /// # Errors
    /// Returns `ConfigurationError` if:
    /// - The provider needs a token and none was given or found in the environment
    /// - The HTTP client cannot be created
    /// - The time policy contradicts itself
    pub fn build(self) -> Result<RecipeAdvisor, ConfigurationError> {
        let time_policy = self.time_policy.unwrap_or_default();
        time_policy.check()?;
        let timeout = self.timeout.unwrap_or(Duration::from_secs(30));

        let (provider, preset_params): (Arc<dyn LlmProvider>, GenerationConfig) = match self.client
        {
            Some(client) => {
                let params = GenerationConfig::for_model(client.model());
                (client, params)
            }
            None => {
                let kind = self.provider.unwrap_or_default();
                let config = ProviderConfig {
                    enabled: true,
                    model: self.model,
                    api_key: self.api_key,
                    base_url: self.base_url,
                    ..Default::default()
                };
                let (provider, params) =
                    ProviderFactory::create_with_params(kind.as_str(), &config, timeout)?;
                (Arc::from(provider), params)
            }
        };

        Ok(RecipeAdvisor::new(
            provider,
            self.template.unwrap_or_default(),
            self.generation.unwrap_or(preset_params),
            Validator::new(time_policy),
            self.deadline.unwrap_or(Duration::from_secs(120)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::model::{RecipeForm, RecipeResponse, RenderedPrompt};
    use async_trait::async_trait;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn provider_name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "tiiuae/falcon-7b-instruct"
        }

        async fn generate(
            &self,
            prompt: &RenderedPrompt,
            _params: &GenerationConfig,
        ) -> Result<RecipeResponse, GenerationError> {
            Ok(RecipeResponse::new(prompt.as_str()))
        }
    }

    #[test]
    fn test_build_with_client() {
        let advisor = RecipeAdvisor::builder()
            .client(Arc::new(EchoProvider))
            .preset(TemplatePreset::Quick)
            .time_policy(TimePolicy::recommended())
            .build()
            .unwrap();

        assert_eq!(advisor.provider_name(), "echo");
        assert_eq!(advisor.template().name(), "quick");
        // Parameters follow the client's model preset
        assert_eq!(advisor.generation().max_new_tokens, 256);
        assert_eq!(advisor.time_policy(), &TimePolicy::recommended());
    }

    #[test]
    fn test_build_huggingface_with_key() {
        let advisor = RecipeAdvisor::builder()
            .api_key("hf_test_key")
            .model("mistralai/Mixtral-8x7B-Instruct-v0.1")
            .build()
            .unwrap();

        assert_eq!(advisor.provider_name(), "huggingface");
        assert_eq!(advisor.model(), "mistralai/Mixtral-8x7B-Instruct-v0.1");
    }

    #[test]
    fn test_build_ollama_needs_no_key() {
        let advisor = RecipeAdvisor::builder()
            .provider(ProviderKind::Ollama)
            .model("llama3")
            .build()
            .unwrap();
        assert_eq!(advisor.provider_name(), "ollama");
    }

    #[test]
    fn test_generation_override() {
        let generation = GenerationConfig {
            temperature: 0.1,
            ..Default::default()
        };
        let advisor = RecipeAdvisor::builder()
            .client(Arc::new(EchoProvider))
            .generation(generation)
            .build()
            .unwrap();
        assert_eq!(advisor.generation(), &generation);
    }

    #[test]
    fn test_contradictory_time_policy_is_rejected() {
        let result = RecipeAdvisor::builder()
            .client(Arc::new(EchoProvider))
            .time_policy(TimePolicy {
                min: 5,
                max: Some(60),
                default: 90,
                clamp: false,
            })
            .build();
        assert!(matches!(
            result.err(),
            Some(ConfigurationError::InvalidTimePolicy(_))
        ));
    }

    #[tokio::test]
    async fn test_built_advisor_submits() {
        let advisor = RecipeAdvisor::builder()
            .client(Arc::new(EchoProvider))
            .build()
            .unwrap();

        let presentation = advisor
            .submit(&RecipeForm::new("oats, banana", "10"))
            .await;
        assert!(presentation.is_success());
        assert!(presentation.to_string().contains("oats, banana"));
    }
}
