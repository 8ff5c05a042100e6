//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and application
//! types once validated.

mod generation;
mod limits;
mod logging;
mod providers;
mod server;

pub use generation::FileGenerationConfig;
pub use limits::FileLimitsConfig;
pub use logging::FileLoggingConfig;
pub use providers::{FileEndpointConfig, FileProvidersConfig};
pub use server::FileServerConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("limits.{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("server.port cannot be 0")]
    ZeroPort,

    #[error("generation.temperature must be within [0, 2], got {0}")]
    TemperatureOutOfRange(f32),

    #[error("generation.max_output_tokens cannot be 0")]
    ZeroMaxOutputTokens,

    #[error("providers.{0}.base_url cannot be empty")]
    EmptyBaseUrl(&'static str),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// HTTP listener
    pub server: FileServerConfig,
    /// Upstream time limits
    pub limits: FileLimitsConfig,
    /// Vendor endpoints and key sources
    pub providers: FileProvidersConfig,
    /// Sampling parameters sent to every vendor
    pub generation: FileGenerationConfig,
    /// Conversation transcript and log file locations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.limits.request_timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroTimeout("request_timeout_secs"));
        }
        if self.limits.stream_timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroTimeout("stream_timeout_secs"));
        }
        if self.server.port == 0 {
            return Err(ConfigValidationError::ZeroPort);
        }
        let temperature = self.generation.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigValidationError::TemperatureOutOfRange(temperature));
        }
        if self.generation.max_output_tokens == 0 {
            return Err(ConfigValidationError::ZeroMaxOutputTokens);
        }
        for (name, endpoint) in [
            ("openai", &self.providers.openai),
            ("gemini", &self.providers.gemini),
            ("deepseek", &self.providers.deepseek),
        ] {
            if endpoint.base_url.trim().is_empty() {
                return Err(ConfigValidationError::EmptyBaseUrl(name));
            }
        }
        Ok(())
    }
}
