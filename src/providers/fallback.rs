use crate::config::AppConfig;
use crate::error::{ConfigurationError, GenerationError};
use crate::generation::GenerationConfig;
use crate::model::{RecipeResponse, RenderedPrompt};
use crate::providers::{LlmProvider, ProviderFactory};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

struct Member {
    provider: Box<dyn LlmProvider>,
    /// Parameters for this member's own model; the caller's are used when absent
    params: Option<GenerationConfig>,
}

/// Tries providers in order, retrying each before moving to the next
pub struct FallbackProvider {
    members: Vec<Member>,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl FallbackProvider {
    /// Build the chain in `fallback.order`. Providers that are disabled or
    /// missing from `providers` are skipped; a missing credential is fatal.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigurationError> {
        let timeout = Duration::from_secs(config.timeout);

        let mut members = Vec::new();

        // Create providers in fallback order
        for provider_name in &config.fallback.order {
            if let Some(provider_config) = config.providers.get(provider_name) {
                if provider_config.enabled {
                    match ProviderFactory::create_with_params(
                        provider_name,
                        provider_config,
                        timeout,
                    ) {
                        Ok((provider, params)) => {
                            info!("Added '{}' to fallback chain", provider_name);
                            members.push(Member {
                                provider,
                                params: Some(params),
                            });
                        }
                        Err(e @ ConfigurationError::MissingCredential(_)) => return Err(e),
                        Err(e) => {
                            warn!("Failed to initialize provider '{}': {}", provider_name, e);
                        }
                    }
                }
            } else {
                warn!(
                    "Provider '{}' in fallback order not found in configuration",
                    provider_name
                );
            }
        }

        if members.is_empty() {
            return Err(ConfigurationError::NoProviders);
        }

        Ok(FallbackProvider {
            members,
            retry_attempts: config.fallback.retry_attempts.max(1),
            retry_delay_ms: config.fallback.retry_delay_ms,
        })
    }

    /// Chain already-built providers, each using the caller's parameters
    pub fn from_providers(
        providers: Vec<Box<dyn LlmProvider>>,
        retry_attempts: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, ConfigurationError> {
        if providers.is_empty() {
            return Err(ConfigurationError::NoProviders);
        }

        Ok(FallbackProvider {
            members: providers
                .into_iter()
                .map(|provider| Member {
                    provider,
                    params: None,
                })
                .collect(),
            retry_attempts: retry_attempts.max(1),
            retry_delay_ms,
        })
    }

    /// Try a provider, backing off a little longer after each failed attempt
    async fn try_provider_with_retry(
        &self,
        member: &Member,
        prompt: &RenderedPrompt,
        params: &GenerationConfig,
    ) -> Result<RecipeResponse, GenerationError> {
        let provider = member.provider.as_ref();
        let params = member.params.as_ref().unwrap_or(params);
        let mut attempt = 1;

        loop {
            debug!(
                "Attempting generation with {} (attempt {}/{})",
                provider.provider_name(),
                attempt,
                self.retry_attempts
            );

            let error = match provider.generate(prompt, params).await {
                Ok(response) => {
                    info!(
                        "Generated recipe using {} ({})",
                        provider.provider_name(),
                        provider.model()
                    );
                    return Ok(response);
                }
                Err(e) => e,
            };

            warn!(
                "Provider {} failed (attempt {}/{}): {}",
                provider.provider_name(),
                attempt,
                self.retry_attempts,
                error
            );

            if !error.is_retryable() || attempt >= self.retry_attempts {
                return Err(error);
            }

            let delay =
                Duration::from_millis(self.retry_delay_ms.saturating_mul(u64::from(attempt)));
            debug!("Waiting {:?} before retry", delay);
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    fn provider_name(&self) -> &str {
        "fallback"
    }

    fn model(&self) -> &str {
        self.members
            .first()
            .map(|member| member.provider.model())
            .unwrap_or_default()
    }

    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        params: &GenerationConfig,
    ) -> Result<RecipeResponse, GenerationError> {
        let mut last_error = GenerationError::Unavailable("no providers configured".to_string());

        for member in &self.members {
            match self.try_provider_with_retry(member, prompt, params).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(
                        "Giving up on {}: {}",
                        member.provider.provider_name(),
                        e
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
