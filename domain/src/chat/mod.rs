//! Chat exchange domain.
//!
//! - [`conversation::Conversation`]: a persisted conversation and its messages
//! - [`message::ChatMessage`]: a single immutable turn of dialogue
//! - [`response::ChatResponse`]: normalized single-shot result with [`response::Usage`]
//! - [`stream::StreamEvent`]: events relayed during a streaming exchange
//! - [`state::SessionState`]: lifecycle of a streaming exchange

pub mod conversation;
pub mod message;
pub mod response;
pub mod state;
pub mod stream;
