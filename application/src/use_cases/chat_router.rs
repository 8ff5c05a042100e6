//! Chat routing use case.
//!
//! [`ChatRouter`] resolves a model id through the [`ModelRegistry`], picks
//! the one adapter registered for the descriptor's provider, and delegates.
//! There is no fallback between vendors and no retrying: each model id maps
//! to exactly one adapter, and every failure comes back as a [`ChatError`].

use crate::config::GatewayLimits;
use crate::ports::provider::{ChatError, FragmentStream, ProviderAdapter, ProviderError};
use chatrelay_domain::{
    ChatMessage, ChatResponse, ModelDescriptor, ModelRegistry, ProviderKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ChatRouter {
    registry: Arc<ModelRegistry>,
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
    limits: GatewayLimits,
}

impl ChatRouter {
    /// Build a router over the given adapters.
    ///
    /// If two adapters report the same [`ProviderKind`], the later one wins.
    pub fn new(registry: Arc<ModelRegistry>, adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        let adapters = adapters.into_iter().map(|a| (a.kind(), a)).collect();
        Self {
            registry,
            adapters,
            limits: GatewayLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: GatewayLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> GatewayLimits {
        self.limits
    }

    /// The static catalogue, for the model picker.
    pub fn list_models(&self) -> Vec<ModelDescriptor> {
        self.registry.list_models()
    }

    pub fn descriptor(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.registry.get(model_id)
    }

    /// Pure lookup: descriptor and adapter for `model_id`, or why not.
    fn resolve(
        &self,
        model_id: &str,
    ) -> Result<(&ModelDescriptor, &Arc<dyn ProviderAdapter>), ChatError> {
        let descriptor = self
            .registry
            .get(model_id)
            .ok_or_else(|| ChatError::UnknownModel(model_id.to_string()))?;

        if !descriptor.available {
            return Err(ChatError::ModelUnavailable(model_id.to_string()));
        }

        // Credentials present but nobody registered an adapter for the vendor.
        let adapter = self
            .adapters
            .get(&descriptor.provider)
            .ok_or_else(|| ChatError::ModelUnavailable(model_id.to_string()))?;

        Ok((descriptor, adapter))
    }

    /// Validate that `model_id` can serve a streaming exchange, without
    /// contacting any vendor.
    pub fn preflight_stream(&self, model_id: &str) -> Result<&ModelDescriptor, ChatError> {
        let (descriptor, adapter) = self.resolve(model_id)?;
        if !descriptor.supports_streaming || !adapter.supports_streaming(model_id) {
            return Err(ChatError::streaming_unsupported(model_id));
        }
        Ok(descriptor)
    }

    /// Single-shot chat, bounded by the request timeout.
    pub async fn chat(
        &self,
        history: &[ChatMessage],
        model_id: &str,
    ) -> Result<ChatResponse, ChatError> {
        let (descriptor, adapter) = self.resolve(model_id)?;
        debug!(
            model = %model_id,
            provider = %descriptor.provider,
            messages = history.len(),
            "Routing chat request"
        );

        let timeout = self.limits.request_timeout;
        match tokio::time::timeout(timeout, adapter.chat_once(history, model_id)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                warn!(model = %model_id, error = %e, "Chat request failed");
                Err(e)
            }
            Err(_) => {
                warn!(model = %model_id, ?timeout, "Chat request timed out");
                Err(ProviderError::new(
                    descriptor.provider,
                    format!("no response within {}s", timeout.as_secs()),
                )
                .into())
            }
        }
    }

    /// Open a streaming reply.
    ///
    /// Unsupported models fail here, before the adapter is called. The
    /// overall wall-clock cap is the caller's to enforce, since only the
    /// caller knows when it stops pulling.
    pub async fn chat_stream(
        &self,
        history: &[ChatMessage],
        model_id: &str,
    ) -> Result<FragmentStream, ChatError> {
        self.preflight_stream(model_id)?;
        let (descriptor, adapter) = self.resolve(model_id)?;
        debug!(
            model = %model_id,
            provider = %descriptor.provider,
            messages = history.len(),
            "Routing streaming request"
        );
        adapter.chat_stream(history, model_id).await.inspect_err(|e| {
            warn!(model = %model_id, error = %e, "Failed to open stream");
        })
    }
}
