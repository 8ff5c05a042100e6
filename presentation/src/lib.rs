//! Presentation layer for chatrelay
//!
//! This crate contains the CLI definition, the axum HTTP surface that
//! relays streamed replies as server-sent events, and the client-side
//! state reducer that consumes those events.

pub mod cli;
pub mod client;
pub mod http;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use client::{
    ConversationStateReducer, FrameError, LocalConversation, LocalMessage, MessageStatus,
    ReducerError, stream_events,
};
pub use http::{ApiError, AppState, build_router, cors_layer};
