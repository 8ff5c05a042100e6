//! Provider configuration from TOML (`[providers]` section)

use chatrelay_domain::{EndpointConfig, ProviderConfig};
use serde::{Deserialize, Serialize};

/// One vendor endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEndpointConfig {
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Direct API key (not recommended; use the env var instead).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
}

impl From<&EndpointConfig> for FileEndpointConfig {
    fn from(endpoint: &EndpointConfig) -> Self {
        Self {
            api_key_env: endpoint.api_key_env.clone(),
            api_key: endpoint.api_key.clone(),
            base_url: endpoint.base_url.clone(),
        }
    }
}

impl From<&FileEndpointConfig> for EndpointConfig {
    fn from(file: &FileEndpointConfig) -> Self {
        let mut endpoint = EndpointConfig::new(file.api_key_env.clone(), file.base_url.clone());
        endpoint.api_key = file.api_key.clone();
        endpoint
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileEndpointConfig,
    pub gemini: FileEndpointConfig,
    pub deepseek: FileEndpointConfig,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        let defaults = ProviderConfig::with_defaults();
        Self {
            openai: (&defaults.openai).into(),
            gemini: (&defaults.gemini).into(),
            deepseek: (&defaults.deepseek).into(),
        }
    }
}

impl FileProvidersConfig {
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            openai: (&self.openai).into(),
            gemini: (&self.gemini).into(),
            deepseek: (&self.deepseek).into(),
        }
    }
}
