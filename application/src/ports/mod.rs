//! Ports (interfaces) for external adapters
//!
//! These traits are implemented by the infrastructure layer.

pub mod conversation_logger;
pub mod conversation_store;
pub mod provider;
