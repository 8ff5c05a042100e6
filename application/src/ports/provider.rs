//! Provider adapter port
//!
//! Defines the interface every upstream vendor adapter implements and the
//! error taxonomy the rest of the system sees.

use async_trait::async_trait;
use chatrelay_domain::{ChatMessage, ChatResponse, ProviderKind};
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// A transport or vendor-side failure, tagged with the vendor it came from.
///
/// `cause` is for server-side logs only; never forward it to end users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{vendor} request failed: {cause}")]
pub struct ProviderError {
    pub vendor: ProviderKind,
    pub cause: String,
}

impl ProviderError {
    pub fn new(vendor: ProviderKind, cause: impl Into<String>) -> Self {
        Self {
            vendor,
            cause: cause.into(),
        }
    }
}

/// Errors surfaced by chat routing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Model not configured: {0}")]
    ModelUnavailable(String),

    #[error("{operation} is not supported for model {model}")]
    UnsupportedOperation {
        model: String,
        operation: &'static str,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ChatError {
    pub fn streaming_unsupported(model: impl Into<String>) -> Self {
        ChatError::UnsupportedOperation {
            model: model.into(),
            operation: "streaming",
        }
    }

    /// Message safe to show to end users. Vendor causes stay server-side.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::UnknownModel(model) => format!("Unknown model: {}", model),
            ChatError::ModelUnavailable(_) => "This model is not configured".to_string(),
            ChatError::UnsupportedOperation { model, operation } => {
                format!("{} is not supported for model {}", operation, model)
            }
            ChatError::Provider(_) => {
                "The AI service failed to respond. Please try again.".to_string()
            }
        }
    }

    /// Whether a caller may reasonably offer "try again".
    ///
    /// The gateway itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChatError::Provider(_))
    }
}

/// Lazy, finite, non-restartable sequence of text fragments.
///
/// Dropping the stream stops pulling from the vendor.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Translation layer between the abstract chat contract and one vendor.
///
/// One instance per vendor is constructed at startup and shared.
/// Implementations live in the infrastructure layer.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// The vendor this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Whether `chat_stream` can serve this model.
    fn supports_streaming(&self, model_id: &str) -> bool;

    /// Send the full history and wait for the complete reply.
    async fn chat_once(
        &self,
        history: &[ChatMessage],
        model_id: &str,
    ) -> Result<ChatResponse, ChatError>;

    /// Open a streaming reply.
    ///
    /// Must fail with [`ChatError::UnsupportedOperation`] before any network
    /// call when the model cannot stream.
    async fn chat_stream(
        &self,
        history: &[ChatMessage],
        model_id: &str,
    ) -> Result<FragmentStream, ChatError>;
}
