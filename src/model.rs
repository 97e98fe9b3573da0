use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Dietary preference the recipe has to respect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DietaryPreference {
    #[default]
    None,
    Vegan,
    GlutenFree,
    Vegetarian,
    Paleo,
    Keto,
}

impl DietaryPreference {
    /// Every option, in the order the form lists them
    pub const ALL: [DietaryPreference; 6] = [
        DietaryPreference::None,
        DietaryPreference::Vegan,
        DietaryPreference::GlutenFree,
        DietaryPreference::Vegetarian,
        DietaryPreference::Paleo,
        DietaryPreference::Keto,
    ];

    /// Label shown in the form
    pub fn label(&self) -> &'static str {
        match self {
            DietaryPreference::None => "None",
            DietaryPreference::Vegan => "Vegan",
            DietaryPreference::GlutenFree => "Gluten-Free",
            DietaryPreference::Vegetarian => "Vegetarian",
            DietaryPreference::Paleo => "Paleo",
            DietaryPreference::Keto => "Keto",
        }
    }

    /// Lowercase adjective used inside prompts ("gluten-free")
    pub fn adjective(&self) -> Option<&'static str> {
        match self {
            DietaryPreference::None => None,
            DietaryPreference::Vegan => Some("vegan"),
            DietaryPreference::GlutenFree => Some("gluten-free"),
            DietaryPreference::Vegetarian => Some("vegetarian"),
            DietaryPreference::Paleo => Some("paleo"),
            DietaryPreference::Keto => Some("keto"),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DietaryPreference::None)
    }
}

impl fmt::Display for DietaryPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DietaryPreference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "" | "none" => Ok(DietaryPreference::None),
            "vegan" => Ok(DietaryPreference::Vegan),
            "glutenfree" => Ok(DietaryPreference::GlutenFree),
            "vegetarian" => Ok(DietaryPreference::Vegetarian),
            "paleo" => Ok(DietaryPreference::Paleo),
            "keto" => Ok(DietaryPreference::Keto),
            _ => Err(ValidationError::UnknownPreference(s.trim().to_string())),
        }
    }
}

/// Raw values as they arrive from the form, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeForm {
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub preference: Option<String>,
}

impl RecipeForm {
    pub fn new(ingredients: impl Into<String>, time: impl Into<String>) -> Self {
        RecipeForm {
            ingredients: Some(ingredients.into()),
            time: Some(time.into()),
            preference: None,
        }
    }

    pub fn with_preference(mut self, preference: impl Into<String>) -> Self {
        self.preference = Some(preference.into());
        self
    }
}

/// A validated submission. Only the validator builds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeRequest {
    pub(crate) ingredients: String,
    pub(crate) time_minutes: u32,
    pub(crate) preference: DietaryPreference,
}

impl RecipeRequest {
    /// Normalized, comma-separated ingredients
    pub fn ingredients(&self) -> &str {
        &self.ingredients
    }

    /// The individual ingredients, in the order given
    pub fn ingredient_list(&self) -> Vec<&str> {
        self.ingredients.split(", ").collect()
    }

    pub fn time_minutes(&self) -> u32 {
        self.time_minutes
    }

    pub fn preference(&self) -> DietaryPreference {
        self.preference
    }
}

/// A prompt with every placeholder filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt(String);

impl RenderedPrompt {
    pub(crate) fn new(text: String) -> Self {
        RenderedPrompt(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The model's text, exactly as returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeResponse(String);

impl RecipeResponse {
    pub fn new(text: impl Into<String>) -> Self {
        RecipeResponse(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
