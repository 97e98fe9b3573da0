use html_escape::encode_text;
use serde::Serialize;
use std::fmt;

use crate::error::{GenerationError, ValidationError};
use crate::model::RecipeResponse;

/// What the user sees after a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Presentation {
    /// The model's text, untouched
    Recipe { text: String, model: String },
    /// The input was not usable; nothing was sent
    Warning { message: String },
    /// The endpoint failed
    Failure { message: String, detail: String },
}

impl Presentation {
    pub fn success(response: RecipeResponse, model: &str) -> Self {
        Presentation::Recipe {
            text: response.into_inner(),
            model: model.to_string(),
        }
    }

    pub fn warning(error: &ValidationError) -> Self {
        Presentation::Warning {
            message: error.to_string(),
        }
    }

    pub fn failure(error: &GenerationError) -> Self {
        Presentation::Failure {
            message: friendly_message(error).to_string(),
            detail: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Presentation::Recipe { .. })
    }

    /// HTML fragment for the result area of the page
    pub fn to_html(&self) -> String {
        match self {
            Presentation::Recipe { text, model } => format!(
                "<div class=\"success\">Here is your recipe (generated by {}):</div>\n<pre class=\"recipe\">{}</pre>",
                encode_text(model),
                encode_text(text)
            ),
            Presentation::Warning { message } => {
                format!("<div class=\"warning\">{}</div>", encode_text(message))
            }
            Presentation::Failure { message, detail } => format!(
                "<div class=\"error\">{}</div>\n<details><summary>Technical details</summary><code>{}</code></details>",
                encode_text(message),
                encode_text(detail)
            ),
        }
    }
}

/// Turn the outcome of a generation call into something presentable
pub fn present(result: Result<RecipeResponse, GenerationError>, model: &str) -> Presentation {
    match result {
        Ok(response) => Presentation::success(response, model),
        Err(error) => Presentation::failure(&error),
    }
}

fn friendly_message(error: &GenerationError) -> &'static str {
    match error {
        GenerationError::Authentication(_) => {
            "The recipe service rejected our credentials. Please check the API token."
        }
        GenerationError::Network(_) => {
            "We could not reach the recipe service. Please check your connection and try again."
        }
        GenerationError::Timeout(_) => {
            "The recipe service took too long to answer. Please try again in a moment."
        }
        GenerationError::Unavailable(_) => {
            "The recipe model is busy or still loading. Please try again shortly."
        }
        GenerationError::Rejected { .. } => "The recipe service could not handle this request.",
        GenerationError::EmptyResponse => {
            "The recipe model did not come up with anything. Try different ingredients or more time."
        }
        GenerationError::MalformedResponse(_) => {
            "The recipe service sent back something we could not read."
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presentation::Recipe { text, .. } => write!(f, "Here is your recipe:\n\n{}", text),
            Presentation::Warning { message } => write!(f, "Warning: {}", message),
            Presentation::Failure { message, detail } => {
                write!(f, "Error: {}\nDetails: {}", message, detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_success_keeps_text_verbatim() {
        let text = "Recipe Name: Toast & Jam <deluxe>\n\n1. Toast (2 min)\n";
        let presentation = present(Ok(RecipeResponse::new(text)), "mistral");

        assert!(presentation.is_success());
        assert!(presentation.to_string().contains(text));
        match &presentation {
            Presentation::Recipe { text: shown, .. } => assert_eq!(shown, text),
            other => panic!("expected a recipe, got {:?}", other),
        }
    }

    #[test]
    fn test_html_escapes_model_text() {
        let presentation = present(Ok(RecipeResponse::new("<script>alert(1)</script>")), "m");
        let html = presentation.to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_failure_has_message_and_detail() {
        let presentation = present(
            Err(GenerationError::Timeout(Duration::from_secs(30))),
            "mistral",
        );

        assert!(!presentation.is_success());
        match &presentation {
            Presentation::Failure { message, detail } => {
                assert!(message.contains("took too long"));
                assert!(detail.contains("30s"));
            }
            other => panic!("expected a failure, got {:?}", other),
        }
        assert!(presentation.to_string().starts_with("Error:"));
    }

    #[test]
    fn test_every_error_kind_has_a_message() {
        let errors = [
            GenerationError::Authentication("x".into()),
            GenerationError::Network("x".into()),
            GenerationError::Timeout(Duration::from_secs(1)),
            GenerationError::Unavailable("x".into()),
            GenerationError::Rejected {
                status: 400,
                message: "x".into(),
            },
            GenerationError::EmptyResponse,
            GenerationError::MalformedResponse("x".into()),
        ];
        for error in errors {
            let presentation = Presentation::failure(&error);
            assert!(matches!(presentation, Presentation::Failure { ref message, .. } if !message.is_empty()));
        }
    }

    #[test]
    fn test_warning() {
        let presentation = Presentation::warning(&ValidationError::MissingIngredients);
        assert_eq!(
            presentation.to_string(),
            "Warning: Please list at least one ingredient you have"
        );
        assert!(presentation.to_html().contains("class=\"warning\""));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(Presentation::warning(&ValidationError::NonPositiveTime))
            .unwrap();
        assert_eq!(json["kind"], "warning");
    }
}
