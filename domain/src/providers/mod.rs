//! Provider configuration types (provider-neutral, serde-free).
//!
//! These types define the shape of provider settings without depending
//! on any serialization format. Credential resolution takes the variable
//! lookup as a parameter so that this crate never touches the process
//! environment itself.

use crate::core::model::ProviderKind;
use std::collections::HashMap;

/// Top-level provider configuration.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub openai: EndpointConfig,
    pub gemini: EndpointConfig,
    pub deepseek: EndpointConfig,
}

impl ProviderConfig {
    /// Built-in endpoints for every known provider.
    pub fn with_defaults() -> Self {
        Self {
            openai: EndpointConfig::new("OPENAI_API_KEY", "https://api.openai.com/v1"),
            gemini: EndpointConfig::new(
                "GEMINI_API_KEY",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            deepseek: EndpointConfig::new("DEEPSEEK_API_KEY", "https://api.deepseek.com/v1"),
        }
    }

    pub fn endpoint(&self, kind: ProviderKind) -> &EndpointConfig {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Google => &self.gemini,
            ProviderKind::DeepSeek => &self.deepseek,
        }
    }

    /// Resolve every provider's key once, producing the read-only map the
    /// registry and adapters are built from.
    pub fn resolve<F>(&self, lookup: F) -> ProviderCredentials
    where
        F: Fn(&str) -> Option<String>,
    {
        let entries = ProviderKind::ALL
            .into_iter()
            .map(|kind| {
                let endpoint = self.endpoint(kind);
                let credential = ProviderCredential {
                    api_key: endpoint.resolve_api_key(&lookup).unwrap_or_default(),
                    base_url: endpoint.base_url.trim_end_matches('/').to_string(),
                };
                (kind, credential)
            })
            .collect();
        ProviderCredentials { entries }
    }
}

/// Where to reach one provider and how to find its key.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Direct API key (takes precedence over `api_key_env`).
    pub api_key: Option<String>,
    /// Base URL of the vendor API.
    pub base_url: String,
}

impl EndpointConfig {
    pub fn new(api_key_env: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key_env: api_key_env.into(),
            api_key: None,
            base_url: base_url.into(),
        }
    }

    /// The configured key, if any. Blank values count as missing.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(&self.api_key_env))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

/// Resolved credentials for one provider.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderCredential {
    pub api_key: String,
    pub base_url: String,
}

impl ProviderCredential {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("api_key", &if self.is_configured() { "<set>" } else { "<empty>" })
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Read-only map of provider → credential, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    entries: HashMap<ProviderKind, ProviderCredential>,
}

impl ProviderCredentials {
    pub fn from_entries(entries: impl IntoIterator<Item = (ProviderKind, ProviderCredential)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderCredential> {
        self.entries.get(&kind)
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.get(kind).is_some_and(ProviderCredential::is_configured)
    }
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2000,
        }
    }
}
