//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelDescriptor`]: a routable model and its capabilities
//! - [`model::ProviderKind`]: the closed set of upstream vendors
//! - [`conversation::ConversationId`]: opaque persistence key
//! - [`error::DomainError`]: domain-level errors

pub mod conversation;
pub mod error;
pub mod model;
