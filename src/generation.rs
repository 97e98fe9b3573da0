use serde::{Deserialize, Serialize};

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";

/// Sampling parameters sent with every generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            temperature: 0.7,
            max_new_tokens: 512,
            top_p: 0.95,
            repetition_penalty: 1.1,
        }
    }
}

impl GenerationConfig {
    /// Parameters tuned for a known model, or the defaults for anything else
    pub fn for_model(model: &str) -> Self {
        match ModelPreset::find(model) {
            Some(preset) => preset.generation,
            None => GenerationConfig::default(),
        }
    }

    /// Apply per-field overrides from configuration
    pub fn with_overrides(
        mut self,
        temperature: Option<f32>,
        max_new_tokens: Option<u32>,
        top_p: Option<f32>,
        repetition_penalty: Option<f32>,
    ) -> Self {
        if let Some(value) = temperature {
            self.temperature = value;
        }
        if let Some(value) = max_new_tokens {
            self.max_new_tokens = value;
        }
        if let Some(value) = top_p {
            self.top_p = value;
        }
        if let Some(value) = repetition_penalty {
            self.repetition_penalty = value;
        }
        self
    }
}

/// A hosted model together with the parameters that work well for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPreset {
    pub model: &'static str,
    pub generation: GenerationConfig,
}

const LARGE_INSTRUCT: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    max_new_tokens: 512,
    top_p: 0.95,
    repetition_penalty: 1.1,
};

const SMALL_BASE: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    max_new_tokens: 256,
    top_p: 0.9,
    repetition_penalty: 1.2,
};

pub const MODEL_PRESETS: [ModelPreset; 4] = [
    ModelPreset {
        model: DEFAULT_MODEL,
        generation: LARGE_INSTRUCT,
    },
    ModelPreset {
        model: "mistralai/Mixtral-8x7B-Instruct-v0.1",
        generation: LARGE_INSTRUCT,
    },
    ModelPreset {
        model: "tiiuae/falcon-7b-instruct",
        generation: SMALL_BASE,
    },
    ModelPreset {
        model: "facebook/opt-1.3b",
        generation: SMALL_BASE,
    },
];

impl ModelPreset {
    pub fn find(model: &str) -> Option<ModelPreset> {
        MODEL_PRESETS
            .iter()
            .find(|preset| preset.model.eq_ignore_ascii_case(model.trim()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = GenerationConfig::default();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_new_tokens, 512);
        assert_eq!(config.top_p, 0.95);
    }

    #[test]
    fn test_known_model_presets() {
        assert_eq!(
            GenerationConfig::for_model("tiiuae/falcon-7b-instruct").max_new_tokens,
            256
        );
        assert_eq!(GenerationConfig::for_model("facebook/opt-1.3b").top_p, 0.9);
        assert_eq!(
            GenerationConfig::for_model("mistralai/Mixtral-8x7B-Instruct-v0.1"),
            GenerationConfig::default()
        );
    }

    #[test]
    fn test_unknown_model_uses_defaults() {
        assert_eq!(
            GenerationConfig::for_model("someone/llama-custom"),
            GenerationConfig::default()
        );
    }

    #[test]
    fn test_overrides() {
        let config = GenerationConfig::for_model(DEFAULT_MODEL).with_overrides(
            Some(0.2),
            None,
            Some(0.8),
            None,
        );
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_new_tokens, 512);
        assert_eq!(config.top_p, 0.8);
        assert_eq!(config.repetition_penalty, 1.1);
    }
}
