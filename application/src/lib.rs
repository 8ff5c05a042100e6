//! Application layer for chatrelay
//!
//! This crate contains the chat router, the single-shot and streaming use
//! cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::GatewayLimits;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_store::{ConversationStore, NewMessage, StoreError, TurnGuard},
    provider::{ChatError, FragmentStream, ProviderAdapter, ProviderError},
};
pub use use_cases::chat_router::ChatRouter;
pub use use_cases::send_message::{
    SendMessageError, SendMessageInput, SendMessageOutput, SendMessageUseCase,
};
pub use use_cases::stream_message::{
    SessionOutcome, StreamMessageInput, StreamMessageUseCase, StreamingSession,
};
