pub mod advisor;
pub mod builder;
pub mod config;
pub mod error;
pub mod generation;
pub mod model;
pub mod presenter;
pub mod prompt;
pub mod providers;
pub mod validation;
pub mod web;

// Re-export main types
pub use advisor::{RecipeAdvisor, SubmissionStage};
pub use builder::{ProviderKind, RecipeAdvisorBuilder};
pub use config::AppConfig;
pub use error::{ConfigurationError, GenerationError, SuggestError, ValidationError};
pub use generation::{GenerationConfig, ModelPreset};
pub use model::{DietaryPreference, RecipeForm, RecipeRequest, RecipeResponse, RenderedPrompt};
pub use presenter::Presentation;
pub use prompt::{PromptTemplate, TemplatePreset};
pub use providers::LlmProvider;
pub use validation::{TimePolicy, Validator};

/// Render the prompt for a form without contacting any endpoint.
///
/// # Example
/// ```
/// use recipe_suggest::{suggest_prompt, RecipeForm, TemplatePreset};
///
/// let prompt = suggest_prompt(&RecipeForm::new("eggs, bread, butter", "15"), TemplatePreset::Nutritionist)
///     .unwrap();
/// assert!(prompt.as_str().contains("eggs, bread, butter"));
/// ```
pub fn suggest_prompt(
    form: &RecipeForm,
    preset: TemplatePreset,
) -> Result<RenderedPrompt, ValidationError> {
    let request = Validator::default().validate(form)?;
    Ok(PromptTemplate::preset(preset).render(&request))
}

/// Validate, render and generate in one call, surfacing every failure as an error.
///
/// # Example
/// ```no_run
/// use recipe_suggest::{suggest_recipe, RecipeAdvisor, RecipeForm};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let advisor = RecipeAdvisor::builder().build()?;
/// let recipe = suggest_recipe(&advisor, &RecipeForm::new("rice, beans", "20")).await?;
/// println!("{}", recipe.as_str());
/// # Ok(())
/// # }
/// ```
pub async fn suggest_recipe(
    advisor: &RecipeAdvisor,
    form: &RecipeForm,
) -> Result<RecipeResponse, SuggestError> {
    let prompt = advisor.prepare(form)?;
    Ok(advisor.generate(&prompt).await?)
}
