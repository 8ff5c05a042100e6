//! Vendor adapters implementing [`ProviderAdapter`].
//!
//! One adapter per configured vendor is constructed at startup and shared
//! by every request. Vendors without a usable key get no adapter; the model
//! registry already marks their models unavailable.

pub mod google_generative;
pub mod http;
pub mod openai_compatible;

pub use google_generative::GoogleGenerativeAdapter;
pub use openai_compatible::OpenAiCompatibleAdapter;

use chatrelay_application::ProviderAdapter;
use chatrelay_domain::{GenerationParams, ProviderCredentials, ProviderKind};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Build adapters for every vendor that has credentials.
pub fn build_adapters(
    client: &Client,
    credentials: &ProviderCredentials,
    params: GenerationParams,
) -> Vec<Arc<dyn ProviderAdapter>> {
    let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
    for kind in ProviderKind::ALL {
        let Some(credential) = credentials.get(kind).filter(|c| c.is_configured()) else {
            info!(provider = %kind, "No API key; models for this provider are unavailable");
            continue;
        };
        let adapter: Arc<dyn ProviderAdapter> = match kind {
            ProviderKind::OpenAi | ProviderKind::DeepSeek => Arc::new(
                OpenAiCompatibleAdapter::new(kind, client.clone(), credential.clone(), params),
            ),
            ProviderKind::Google => Arc::new(GoogleGenerativeAdapter::new(
                client.clone(),
                credential.clone(),
                params,
            )),
        };
        adapters.push(adapter);
    }
    adapters
}
