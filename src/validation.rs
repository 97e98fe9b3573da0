use serde::Deserialize;

use crate::error::{ConfigurationError, ValidationError};
use crate::model::{DietaryPreference, RecipeForm, RecipeRequest};

/// Bounds applied to the "time available" field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimePolicy {
    /// Smallest accepted value in minutes
    #[serde(default = "default_min")]
    pub min: u32,
    /// Largest accepted value in minutes, unbounded when absent
    #[serde(default)]
    pub max: Option<u32>,
    /// Used when the field is left blank
    #[serde(default = "default_minutes")]
    pub default: u32,
    /// Clamp out-of-range values instead of rejecting them
    #[serde(default)]
    pub clamp: bool,
}

fn default_min() -> u32 {
    1
}

fn default_minutes() -> u32 {
    15
}

impl Default for TimePolicy {
    fn default() -> Self {
        TimePolicy {
            min: default_min(),
            max: None,
            default: default_minutes(),
            clamp: false,
        }
    }
}

impl TimePolicy {
    /// The 5 to 60 minute window, clamping anything outside it
    pub fn recommended() -> Self {
        TimePolicy {
            min: 5,
            max: Some(60),
            default: default_minutes(),
            clamp: true,
        }
    }

    /// Reject settings that could hand a zero or out-of-range default to the prompt
    pub fn check(&self) -> Result<(), ConfigurationError> {
        if self.default == 0 {
            return Err(ConfigurationError::InvalidTimePolicy(
                "default must be greater than zero".to_string(),
            ));
        }
        if let Some(max) = self.max {
            if max < self.min.max(1) {
                return Err(ConfigurationError::InvalidTimePolicy(format!(
                    "max ({}) is below min ({})",
                    max, self.min
                )));
            }
        }
        if !self.clamp && self.apply(self.default).is_err() {
            return Err(ConfigurationError::InvalidTimePolicy(format!(
                "default ({}) is outside the allowed range",
                self.default
            )));
        }
        Ok(())
    }

    fn apply(&self, minutes: u32) -> Result<u32, ValidationError> {
        let min = self.min.max(1);
        let max = self.max.unwrap_or(u32::MAX).max(min);
        if (min..=max).contains(&minutes) {
            return Ok(minutes);
        }
        if self.clamp {
            Ok(minutes.clamp(min, max))
        } else {
            Err(ValidationError::TimeOutOfRange { min, max })
        }
    }
}

/// Turns raw form values into a [`RecipeRequest`]
#[derive(Debug, Clone, Default)]
pub struct Validator {
    time_policy: TimePolicy,
}

impl Validator {
    pub fn new(time_policy: TimePolicy) -> Self {
        Validator { time_policy }
    }

    pub fn time_policy(&self) -> &TimePolicy {
        &self.time_policy
    }

    pub fn validate(&self, form: &RecipeForm) -> Result<RecipeRequest, ValidationError> {
        let ingredients = normalize_ingredients(form.ingredients.as_deref().unwrap_or_default())
            .ok_or(ValidationError::MissingIngredients)?;

        let time_minutes = match form.time.as_deref().map(str::trim) {
            None | Some("") => match self.time_policy.default {
                0 => return Err(ValidationError::NonPositiveTime),
                default => self.time_policy.apply(default)?,
            },
            Some(raw) => self.time_policy.apply(parse_minutes(raw)?)?,
        };

        let preference = match form.preference.as_deref() {
            Some(raw) => raw.parse::<DietaryPreference>()?,
            None => DietaryPreference::None,
        };

        Ok(RecipeRequest {
            ingredients,
            time_minutes,
            preference,
        })
    }
}

/// Split on commas, squeeze whitespace inside each item, and rejoin.
/// Returns `None` when nothing is left.
pub fn normalize_ingredients(raw: &str) -> Option<String> {
    let items: Vec<String> = raw
        .split(',')
        .map(|item| item.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}

fn parse_minutes(raw: &str) -> Result<u32, ValidationError> {
    // Number inputs may post "15.0"; accept it when it is a whole number.
    let value: f64 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidTime(raw.to_string()))?;

    if !value.is_finite() || value.fract() != 0.0 {
        return Err(ValidationError::InvalidTime(raw.to_string()));
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveTime);
    }
    if value > f64::from(u32::MAX) {
        return Err(ValidationError::InvalidTime(raw.to_string()));
    }

    Ok(value as u32)
}
