use crate::config::{AppConfig, ProviderConfig};
use crate::error::ConfigurationError;
use crate::generation::GenerationConfig;
use crate::providers::{HuggingFaceProvider, LlmProvider, OllamaProvider};
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LlmProvider>, ConfigurationError> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(ConfigurationError::ProviderDisabled(
                provider_name.to_string(),
            ));
        }

        match provider_name {
            "huggingface" => Ok(Box::new(HuggingFaceProvider::new(config, timeout)?)),
            "ollama" => Ok(Box::new(OllamaProvider::new(config, timeout)?)),
            _ => Err(ConfigurationError::UnknownProvider(
                provider_name.to_string(),
            )),
        }
    }

    /// Create a provider together with the generation parameters for its model
    pub fn create_with_params(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<(Box<dyn LlmProvider>, GenerationConfig), ConfigurationError> {
        let provider = Self::create(provider_name, config, timeout)?;
        let params = config.generation(provider.model());
        Ok((provider, params))
    }

    /// Get the default provider from configuration
    pub fn get_default_provider(
        config: &AppConfig,
    ) -> Result<(Box<dyn LlmProvider>, GenerationConfig), ConfigurationError> {
        let provider_name = &config.default_provider;
        let provider_config = config
            .providers
            .get(provider_name)
            .ok_or_else(|| ConfigurationError::ProviderNotConfigured(provider_name.clone()))?;

        Self::create_with_params(
            provider_name,
            provider_config,
            Duration::from_secs(config.timeout),
        )
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["huggingface", "ollama"]
    }
}
