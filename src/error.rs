use std::time::Duration;
use thiserror::Error;

/// Problems with the values a user submitted through the form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No ingredients were given, or only separators and whitespace
    #[error("Please list at least one ingredient you have")]
    MissingIngredients,

    /// The time field could not be read as a whole number of minutes
    #[error("Time available must be a whole number of minutes, got '{0}'")]
    InvalidTime(String),

    /// The time field was zero or negative
    #[error("Time available must be greater than zero")]
    NonPositiveTime,

    /// The time is positive but outside the configured bounds
    #[error("Time available must be between {min} and {max} minutes")]
    TimeOutOfRange { min: u32, max: u32 },

    /// The dietary preference is not one of the supported options
    #[error("Unknown dietary preference: {0}")]
    UnknownPreference(String),
}

/// Fatal setup problems, raised before any form is served
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// No API token was found for a provider that requires one
    #[error("{0} is not set; export it or set the provider's api_key in config.toml")]
    MissingCredential(&'static str),

    /// The configured provider name is not known
    #[error(
        "Unknown provider: {0} (available: {})",
        crate::providers::ProviderFactory::available_providers().join(", ")
    )]
    UnknownProvider(String),

    /// The provider exists in configuration but is switched off
    #[error("Provider '{0}' is not enabled in configuration")]
    ProviderDisabled(String),

    /// The default provider has no configuration entry
    #[error("Provider '{0}' not found in configuration")]
    ProviderNotConfigured(String),

    /// None of the providers in the fallback order could be created
    #[error("No providers available in fallback configuration")]
    NoProviders,

    /// The configured template preset is not known
    #[error("Unknown prompt template preset: {0}")]
    UnknownTemplate(String),

    /// A custom prompt template is malformed
    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),

    /// The `[time]` bounds contradict each other
    #[error("Invalid time settings: {0}")]
    InvalidTimePolicy(String),

    /// A custom prompt template file could not be read
    #[error("Failed to read prompt template: {0}")]
    TemplateIo(#[from] std::io::Error),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Loading config.toml or the environment failed
    #[error("Configuration error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Failures reported by an inference endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The endpoint refused the credential (401/403)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The endpoint could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// No answer arrived within the allowed time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The model is loading, missing, or rate limited
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    /// The endpoint rejected the request for another reason
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The endpoint answered, but with no text
    #[error("The model returned an empty response")]
    EmptyResponse,

    /// The response body could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    /// Whether trying the same endpoint again could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Network(_) | GenerationError::Timeout(_) | GenerationError::Unavailable(_)
        )
    }

    /// Classify a transport error from reqwest
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout(timeout)
        } else if err.is_decode() {
            GenerationError::MalformedResponse(err.to_string())
        } else {
            GenerationError::Network(err.to_string())
        }
    }

    /// Classify a non-success HTTP status
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => GenerationError::Authentication(message),
            404 | 429 | 500..=599 => GenerationError::Unavailable(message),
            _ => GenerationError::Rejected { status, message },
        }
    }
}

/// Umbrella error for library callers that drive the pieces themselves
#[derive(Error, Debug)]
pub enum SuggestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
