use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ConfigurationError;
use crate::generation::GenerationConfig;
use crate::prompt::{PromptTemplate, TemplatePreset};
use crate::validation::TimePolicy;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Provider used when fallback is disabled
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderConfig>,
    /// Fallback configuration for automatic provider switching
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Which prompt template to render
    #[serde(default)]
    pub template: TemplateConfig,
    /// Bounds for the time field
    #[serde(default)]
    pub time: TimePolicy,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Upper bound in seconds for a whole generation, retries included
    #[serde(default = "default_deadline")]
    pub deadline: u64,
    /// Where the web form is served
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            default_provider: default_provider(),
            providers: default_providers(),
            fallback: FallbackConfig::default(),
            template: TemplateConfig::default(),
            time: TimePolicy::default(),
            timeout: default_timeout(),
            deadline: default_deadline(),
            server: ServerConfig::default(),
        }
    }
}

/// Configuration for a specific inference provider
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model identifier (e.g., "mistralai/Mistral-7B-Instruct-v0.2")
    pub model: Option<String>,
    /// API token (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for a custom or self-hosted endpoint
    pub base_url: Option<String>,

    // Overrides on top of the model's preset
    pub temperature: Option<f32>,
    pub max_new_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
}

impl ProviderConfig {
    /// Generation parameters for `model`, with this provider's overrides applied
    pub fn generation(&self, model: &str) -> GenerationConfig {
        GenerationConfig::for_model(model).with_overrides(
            self.temperature,
            self.max_new_tokens,
            self.top_p,
            self.repetition_penalty,
        )
    }
}

/// Configuration for provider fallback and retry behavior
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Whether fallback is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Order of providers to try (first to last)
    #[serde(default)]
    pub order: Vec<String>,
    /// Number of attempts per provider before moving on
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Delay before the first retry in milliseconds, growing with each attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            order: Vec::new(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Prompt template selection
#[derive(Debug, Deserialize, Clone)]
pub struct TemplateConfig {
    /// Name of a built-in template
    #[serde(default = "default_template")]
    pub preset: String,
    /// A custom template file; takes precedence over `preset`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            preset: default_template(),
            path: None,
        }
    }
}

impl TemplateConfig {
    pub fn load(&self) -> Result<PromptTemplate, ConfigurationError> {
        match &self.path {
            Some(path) => PromptTemplate::from_file(path),
            None => Ok(PromptTemplate::preset(self.preset.parse()?)),
        }
    }
}

/// Listening address for the web form
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Default value functions
fn default_provider() -> String {
    "huggingface".to_string()
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    HashMap::from([(
        default_provider(),
        ProviderConfig {
            enabled: true,
            ..Default::default()
        },
    )])
}

fn default_enabled() -> bool {
    true
}

fn default_template() -> String {
    TemplatePreset::default().name().to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_deadline() -> u64 {
    120
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE__PROVIDERS__HUGGINGFACE__MODEL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`AppConfig::load`] for the precedence rules.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE__SERVER__PORT
        .add_source(
            Environment::with_prefix("RECIPE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
