//! Model catalogue.
//!
//! [`ModelRegistry`] is the static, read-only list of routable models. It is
//! built once at process start from [`builtin_models`] and the resolved
//! [`ProviderCredentials`](crate::providers::ProviderCredentials); a model is
//! `available` exactly when its provider has a non-empty key. Rotating a key
//! requires a restart for the flag to change.

use crate::core::model::{ModelDescriptor, ProviderKind};
use crate::providers::ProviderCredentials;

/// The static catalogue, before availability is applied.
pub fn builtin_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("gpt-4", ProviderKind::OpenAi, "GPT-4", 8192)
            .with_description("Most capable general-purpose model"),
        ModelDescriptor::new("gpt-4-turbo", ProviderKind::OpenAi, "GPT-4 Turbo", 128_000)
            .with_description("Faster GPT-4 with a long context window"),
        ModelDescriptor::new("gpt-3.5-turbo", ProviderKind::OpenAi, "GPT-3.5 Turbo", 16_384)
            .with_description("Quick conversational model"),
        ModelDescriptor::new("gemini-pro", ProviderKind::Google, "Gemini Pro", 32_768)
            .with_description("Google's conversational model")
            .without_streaming(),
        ModelDescriptor::new("deepseek-chat", ProviderKind::DeepSeek, "DeepSeek Chat", 32_768)
            .with_description("Conversational model tuned for Chinese"),
    ]
}

/// Read-only lookup of model descriptors by id.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Build the registry from the built-in catalogue.
    pub fn from_credentials(credentials: &ProviderCredentials) -> Self {
        Self::with_models(builtin_models(), credentials)
    }

    /// Build from an explicit catalogue, applying availability from credentials.
    pub fn with_models(models: Vec<ModelDescriptor>, credentials: &ProviderCredentials) -> Self {
        let models = models
            .into_iter()
            .map(|m| {
                let available = credentials.is_configured(m.provider);
                m.with_availability(available)
            })
            .collect();
        Self { models }
    }

    /// All descriptors, in catalogue order.
    pub fn list_models(&self) -> Vec<ModelDescriptor> {
        self.models.clone()
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// Providers that at least one available model routes to.
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = Vec::new();
        for model in self.models.iter().filter(|m| m.available) {
            if !kinds.contains(&model.provider) {
                kinds.push(model.provider);
            }
        }
        kinds
    }
}
