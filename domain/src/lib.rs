//! Domain layer for chatrelay
//!
//! This crate contains the chat entities, the model catalogue and the
//! stream event model. It has no dependencies on infrastructure or
//! presentation concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! - **ModelRegistry**: static catalogue of routable models, each bound to
//!   exactly one [`ProviderKind`]
//! - **ChatMessage**: immutable turn of dialogue; insertion order is
//!   conversation order
//! - **StreamEvent**: what the client sees while a reply is generated,
//!   terminated by exactly one `done` or `error`

pub mod catalog;
pub mod chat;
pub mod core;
pub mod providers;
pub mod util;

// Re-export commonly used types
pub use catalog::{ModelRegistry, builtin_models};
pub use chat::{
    conversation::Conversation,
    message::{ChatMessage, Role, StoredMessage},
    response::{ChatResponse, Usage},
    state::SessionState,
    stream::StreamEvent,
};
pub use core::{
    conversation::{ConversationId, MessageId},
    error::DomainError,
    model::{ModelDescriptor, ProviderKind},
};
pub use providers::{
    EndpointConfig, GenerationParams, ProviderConfig, ProviderCredential, ProviderCredentials,
};
pub use util::{preview, truncate_str};
