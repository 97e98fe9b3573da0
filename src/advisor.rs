//! The per-submission flow: validate, render, generate, present.

use log::{debug, info, warn};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::builder::RecipeAdvisorBuilder;
use crate::config::AppConfig;
use crate::error::{ConfigurationError, GenerationError, ValidationError};
use crate::generation::GenerationConfig;
use crate::model::{RecipeForm, RecipeResponse, RenderedPrompt};
use crate::presenter::{present, Presentation};
use crate::prompt::PromptTemplate;
use crate::providers::{FallbackProvider, LlmProvider, ProviderFactory};
use crate::validation::{TimePolicy, Validator};

/// Where a submission currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Idle,
    Validating,
    Invalid,
    Rendering,
    Calling,
    Presenting,
    PresentingError,
}

impl SubmissionStage {
    /// Stages reachable from this one
    pub fn successors(&self) -> &'static [SubmissionStage] {
        use SubmissionStage::*;
        match self {
            Idle => &[Validating],
            Validating => &[Invalid, Rendering],
            Invalid => &[Idle],
            Rendering => &[Calling],
            Calling => &[Presenting, PresentingError],
            Presenting | PresentingError => &[Idle],
        }
    }
}

struct Submission {
    stage: SubmissionStage,
}

impl Submission {
    fn start() -> Self {
        Submission {
            stage: SubmissionStage::Idle,
        }
    }

    fn enter(&mut self, next: SubmissionStage) {
        debug_assert!(
            self.stage.successors().contains(&next),
            "{:?} cannot follow {:?}",
            next,
            self.stage
        );
        debug!("submission: {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

/// Everything needed to answer a form submission. Immutable once built.
pub struct RecipeAdvisor {
    provider: Arc<dyn LlmProvider>,
    template: PromptTemplate,
    generation: GenerationConfig,
    validator: Validator,
    deadline: Duration,
}

impl RecipeAdvisor {
    pub fn builder() -> RecipeAdvisorBuilder {
        RecipeAdvisorBuilder::default()
    }

    pub fn new(
        provider: Arc<dyn LlmProvider>,
        template: PromptTemplate,
        generation: GenerationConfig,
        validator: Validator,
        deadline: Duration,
    ) -> Self {
        RecipeAdvisor {
            provider,
            template,
            generation,
            validator,
            deadline,
        }
    }

    /// Build from loaded configuration. Fails on a missing credential,
    /// an unknown provider or template, or a malformed custom template.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigurationError> {
        config.time.check()?;
        let template = config.template.load()?;

        let (provider, generation): (Arc<dyn LlmProvider>, GenerationConfig) =
            if config.fallback.enabled {
                // Each member carries its own model's parameters
                (
                    Arc::new(FallbackProvider::new(config)?),
                    GenerationConfig::default(),
                )
            } else {
                let (provider, params) = ProviderFactory::get_default_provider(config)?;
                (Arc::from(provider), params)
            };

        info!(
            "Using {} ({}) with the '{}' template",
            provider.provider_name(),
            provider.model(),
            template.name()
        );

        Ok(RecipeAdvisor::new(
            provider,
            template,
            generation,
            Validator::new(config.time),
            Duration::from_secs(config.deadline),
        ))
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn time_policy(&self) -> &TimePolicy {
        self.validator.time_policy()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Validate and render without calling the endpoint
    pub fn prepare(&self, form: &RecipeForm) -> Result<RenderedPrompt, ValidationError> {
        let request = self.validator.validate(form)?;
        Ok(self.template.render(&request))
    }

    /// Send a prompt, giving up once the deadline passes
    pub async fn generate(
        &self,
        prompt: &RenderedPrompt,
    ) -> Result<RecipeResponse, GenerationError> {
        match tokio::time::timeout(
            self.deadline,
            self.provider.generate(prompt, &self.generation),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.deadline)),
        }
    }

    /// Run one submission end to end. Never fails: every outcome becomes a
    /// [`Presentation`].
    pub async fn submit(&self, form: &RecipeForm) -> Presentation {
        let mut submission = Submission::start();

        submission.enter(SubmissionStage::Validating);
        let request = match self.validator.validate(form) {
            Ok(request) => request,
            Err(e) => {
                submission.enter(SubmissionStage::Invalid);
                info!("Rejected submission: {}", e);
                let presentation = Presentation::warning(&e);
                submission.enter(SubmissionStage::Idle);
                return presentation;
            }
        };

        submission.enter(SubmissionStage::Rendering);
        let prompt = self.template.render(&request);
        debug!(
            "Rendered {} prompt for {} ingredient(s), {} minutes, preference {}",
            self.template.name(),
            request.ingredient_list().len(),
            request.time_minutes(),
            request.preference()
        );

        submission.enter(SubmissionStage::Calling);
        let result = self.generate(&prompt).await;

        match &result {
            Ok(_) => submission.enter(SubmissionStage::Presenting),
            Err(e) => {
                warn!("Generation failed: {}", e);
                submission.enter(SubmissionStage::PresentingError);
            }
        }
        let presentation = present(result, self.provider.model());
        submission.enter(SubmissionStage::Idle);
        presentation
    }
}

static SHARED: OnceLock<Arc<RecipeAdvisor>> = OnceLock::new();

/// The process-wide advisor, built from `config.toml` and the environment
/// on first use.
pub fn shared() -> Result<Arc<RecipeAdvisor>, ConfigurationError> {
    if let Some(advisor) = SHARED.get() {
        return Ok(advisor.clone());
    }
    let config = AppConfig::load()?;
    init_shared(&config)
}

/// Build the process-wide advisor from `config` unless one already exists.
pub fn init_shared(config: &AppConfig) -> Result<Arc<RecipeAdvisor>, ConfigurationError> {
    if let Some(advisor) = SHARED.get() {
        return Ok(advisor.clone());
    }
    let advisor = Arc::new(RecipeAdvisor::from_config(config)?);
    // A concurrent initializer may have won; keep whichever landed first
    Ok(SHARED.get_or_init(|| advisor).clone())
}
