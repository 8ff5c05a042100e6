//! Infrastructure layer for chatrelay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: vendor HTTP adapters, the in-memory
//! conversation store, the JSONL transcript, and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use logging::JsonlConversationLogger;
pub use providers::{
    GoogleGenerativeAdapter, OpenAiCompatibleAdapter, build_adapters, http::build_client,
};
pub use storage::InMemoryConversationStore;
