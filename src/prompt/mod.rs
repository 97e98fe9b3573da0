//! Prompt templates and rendering.
//!
//! Templates are plain text with `{ingredients}`, `{time}` and an optional
//! `{dietary}` slot. `{{` and `}}` stand for literal braces. Rendering is a
//! single pass over the compiled template, so text that arrives through a
//! slot is never scanned for placeholders again.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigurationError;
use crate::model::{DietaryPreference, RecipeRequest, RenderedPrompt};

/// The detailed nutritionist prompt, used unless configured otherwise.
pub const NUTRITIONIST_PROMPT: &str = include_str!("templates/nutritionist.txt");

/// The short breakfast-recommendation prompt.
pub const BREAKFAST_PROMPT: &str = include_str!("templates/breakfast.txt");

/// A compact prompt for small models with short context windows.
pub const QUICK_PROMPT: &str = include_str!("templates/quick.txt");

/// Built-in templates selectable by name in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplatePreset {
    #[default]
    Nutritionist,
    Breakfast,
    Quick,
}

impl TemplatePreset {
    pub const ALL: [TemplatePreset; 3] = [
        TemplatePreset::Nutritionist,
        TemplatePreset::Breakfast,
        TemplatePreset::Quick,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplatePreset::Nutritionist => "nutritionist",
            TemplatePreset::Breakfast => "breakfast",
            TemplatePreset::Quick => "quick",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            TemplatePreset::Nutritionist => NUTRITIONIST_PROMPT,
            TemplatePreset::Breakfast => BREAKFAST_PROMPT,
            TemplatePreset::Quick => QUICK_PROMPT,
        }
    }
}

impl fmt::Display for TemplatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemplatePreset {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplatePreset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigurationError::UnknownTemplate(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Ingredients,
    Time,
    Dietary,
}

impl Slot {
    fn from_name(name: &str) -> Option<Slot> {
        match name {
            "ingredients" => Some(Slot::Ingredients),
            "time" => Some(Slot::Time),
            "dietary" => Some(Slot::Dietary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(Slot),
}

fn is_brace(c: char) -> bool {
    c == '{' || c == '}'
}

/// Split a template into text and slots. Never fails: anything that is not
/// a known slot or an escaped brace is kept as text.
fn compile(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut rest = source;

    while let Some(pos) = rest.find(is_brace) {
        text.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            text.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            text.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            let slot = tail
                .find('}')
                .and_then(|end| Slot::from_name(&tail[1..end]).map(|slot| (slot, end)));
            if let Some((slot, end)) = slot {
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Slot(slot));
                rest = &tail[end + 1..];
                continue;
            }
        }

        text.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    segments
}

/// Strict check for user-supplied templates
fn validate(source: &str) -> Result<(), ConfigurationError> {
    let mut has_ingredients = false;
    let mut has_time = false;
    let mut rest = source;

    while let Some(pos) = rest.find(is_brace) {
        let tail = &rest[pos..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            return Err(ConfigurationError::InvalidTemplate(
                "unmatched '}' (write '}}' for a literal brace)".to_string(),
            ));
        }

        let end = tail.find('}').ok_or_else(|| {
            ConfigurationError::InvalidTemplate(
                "unclosed '{' (write '{{' for a literal brace)".to_string(),
            )
        })?;
        let name = &tail[1..end];
        match Slot::from_name(name) {
            Some(Slot::Ingredients) => has_ingredients = true,
            Some(Slot::Time) => has_time = true,
            Some(Slot::Dietary) => {}
            None => {
                return Err(ConfigurationError::InvalidTemplate(format!(
                    "unknown placeholder {{{}}}",
                    name
                )))
            }
        }
        rest = &tail[end + 1..];
    }

    if !has_ingredients {
        return Err(ConfigurationError::InvalidTemplate(
            "missing {ingredients} placeholder".to_string(),
        ));
    }
    if !has_time {
        return Err(ConfigurationError::InvalidTemplate(
            "missing {time} placeholder".to_string(),
        ));
    }
    Ok(())
}

/// The sentence added when a dietary preference is chosen
pub fn dietary_constraint(preference: DietaryPreference) -> Option<String> {
    preference.adjective().map(|adjective| {
        format!(
            "The recipe must be {adjective}: every ingredient and step must conform to a {adjective} diet."
        )
    })
}

/// A compiled prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn preset(preset: TemplatePreset) -> Self {
        PromptTemplate {
            name: preset.name().to_string(),
            segments: compile(preset.source()),
        }
    }

    /// Compile a custom template, rejecting unknown or missing placeholders
    pub fn from_source(
        name: impl Into<String>,
        source: &str,
    ) -> Result<Self, ConfigurationError> {
        validate(source)?;
        Ok(PromptTemplate {
            name: name.into(),
            segments: compile(source),
        })
    }

    /// Load and compile a custom template from a text file
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let source = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        Self::from_source(name, &source)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn has_dietary_slot(&self) -> bool {
        self.segments.contains(&Segment::Slot(Slot::Dietary))
    }

    /// Fill the template with a validated request
    pub fn render(&self, request: &RecipeRequest) -> RenderedPrompt {
        let constraint = dietary_constraint(request.preference());
        let mut prompt = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => prompt.push_str(text),
                Segment::Slot(Slot::Ingredients) => prompt.push_str(request.ingredients()),
                Segment::Slot(Slot::Time) => prompt.push_str(&request.time_minutes().to_string()),
                Segment::Slot(Slot::Dietary) => {
                    if let Some(sentence) = &constraint {
                        prompt.push(' ');
                        prompt.push_str(sentence);
                    }
                }
            }
        }

        if !self.has_dietary_slot() {
            if let Some(sentence) = &constraint {
                if !prompt.ends_with('\n') {
                    prompt.push('\n');
                }
                prompt.push('\n');
                prompt.push_str(sentence);
                prompt.push('\n');
            }
        }

        RenderedPrompt::new(prompt)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        PromptTemplate::preset(TemplatePreset::default())
    }
}
