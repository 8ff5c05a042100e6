//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat_router;
pub mod send_message;
pub mod stream_message;
